use clap::Args;
use ortci::publish;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct PublishArgs {}

pub fn run(_args: PublishArgs) -> CmdResult<publish::PublishResult> {
    publish::run()
}

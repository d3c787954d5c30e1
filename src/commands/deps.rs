use clap::Args;
use ortci::deps;

use crate::commands::CmdResult;

#[derive(Args)]
pub struct MakeDepsArgs {}

pub fn run(_args: MakeDepsArgs) -> CmdResult<deps::BundleResult> {
    deps::run()
}

use clap::Args;
use ortci::build::{self, Platform};

use crate::commands::CmdResult;

#[derive(Args)]
pub struct BuildArgs {
    /// Target architecture (x64 or ARM64)
    #[arg(default_value = "x64")]
    pub platform: String,
}

pub fn run(args: BuildArgs) -> CmdResult<build::BuildResult> {
    let platform = Platform::parse(&args.platform)?;
    build::run(platform)
}

use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{build, deps, publish};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "ortci")]
#[command(version = VERSION)]
#[command(about = "CI pipelines for building, bundling, and publishing the ONNX Runtime fork")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the runtime for a target architecture
    Build(build::BuildArgs),
    /// Assemble the GPU dependency bundle and replace the release asset
    MakeDeps(deps::MakeDepsArgs),
    /// Package build outputs and publish a tagged release
    Publish(publish::PublishArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Build(args) => output::print_result(build::run(args)),
        Commands::MakeDeps(args) => output::print_result(deps::run(args)),
        Commands::Publish(args) => output::print_result(publish::run(args)),
    };

    std::process::ExitCode::from(exit_code)
}

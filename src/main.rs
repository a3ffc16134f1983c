use clap::Parser;
use tidemark::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}

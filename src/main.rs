//! smake CLI, a declarative build orchestrator.

use clap::Parser;
use smake::cli::Cli;

fn main() {
    let cli = Cli::parse();
    smake::cli::init_tracing(cli.verbose);
    if let Err(e) = smake::cli::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

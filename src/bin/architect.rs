// src/bin/architect.rs

use anyhow::Result;
use architect::{
    cli::{Cli, handlers},
    system::executor,
};
use clap::Parser;
use colored::*;

/// The main entry point of the `architect` application.
/// It sets up logging and colors, runs the wizard, and performs centralized
/// error handling.
fn main() {
    let cli = Cli::parse();

    if cli.no_ansi {
        colored::control::set_override(false);
    }
    init_logging(cli.debug);

    if let Err(e) = run_cli(&cli) {
        // A failing command chain exits with the chain's own code.
        if let Some(executor::ExecutionError::CommandFailure { code, .. }) =
            e.downcast_ref::<executor::ExecutionError>()
        {
            eprintln!("\n{}: {}", "Error".red().bold(), e);
            std::process::exit(code.unwrap_or(1));
        }

        eprintln!("\n{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over the level picked from `--debug`.
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run_cli(cli: &Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    handlers::new::handle(cli)
}

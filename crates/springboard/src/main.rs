//! Springboard CLI - extension and skin lifecycle for the host application
//!
//! This is the main entry point for the Springboard command-line interface.

mod cli;
mod commands;
mod output;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.global.quiet);

    match cli.command {
        Commands::Install(args) => commands::install::run(args, &cli.global).await,
        Commands::Uninstall(args) => commands::uninstall::run(args, &cli.global).await,
        Commands::Status(args) => commands::status::run(args, &cli.global).await,
        Commands::Manifest => commands::manifest::run(&cli.global),
    }
}

/// Initialize tracing with appropriate verbosity
///
/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

//! `sshbook` CLI - command-line interface for the `sshbook` SSH config
//! repository
//!
//! Provides commands for listing, adding, updating, renaming and deleting
//! hosts in an OpenSSH client config, pinning them, recording their use and
//! reading back stored passwords.

mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;
use cli::Cli;
use sshbook_core::tracing::{TracingConfig, TracingLevel, TracingOutput, init_tracing};

use crate::error::CliError;

fn main() {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    if let Err(e) = run(cli) {
        if !quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = util::load_settings(&cli)?;

    let level = if cli.quiet {
        TracingLevel::Error
    } else {
        settings
            .log_level()?
            .unwrap_or_default()
            .raised_by(cli.verbose)
    };
    let config = TracingConfig::new()
        .with_level(level)
        .with_output(TracingOutput::Stderr);
    if let Err(e) = init_tracing(&config) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    commands::dispatch(cli, &settings)
}

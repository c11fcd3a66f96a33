// convoscan/src/lib.rs
//! # Convoscan CLI Application
//!
//! Terminal front end for `convoscan-core`: reads transcripts from files or
//! stdin, runs the selected engine and prints tables or JSON reports.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;

use std::process::ExitCode;

use anyhow::Result;
use log::LevelFilter;

use crate::cli::{Cli, Commands, RulesCommand};

/// Exit code when `--fail-on-violation` is set and something was flagged.
pub const EXIT_VIOLATION: u8 = 1;
/// Exit code for configuration or input errors, and for scans left incomplete
/// by collaborator failures or the finding limit.
pub const EXIT_ERROR: u8 = 2;

/// Log level implied by the global flags. `--quiet` wins over `--debug`.
pub fn log_level(cli: &Cli) -> Option<LevelFilter> {
    if cli.quiet {
        Some(LevelFilter::Off)
    } else if cli.debug {
        Some(LevelFilter::Debug)
    } else {
        None
    }
}

/// Runs the parsed command and maps the outcome to a process exit code.
pub fn run(cli: Cli) -> Result<ExitCode> {
    match &cli.command {
        Commands::Scan(cmd) => {
            let outcome = commands::scan::run_scan(cmd, cli.quiet)?;
            if cmd.fail_on_violation && outcome.violations {
                Ok(ExitCode::from(EXIT_VIOLATION))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Commands::Rules(RulesCommand::List { config, enable, disable }) => {
            commands::rules::run_list(config.as_deref(), enable, disable)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Rules(RulesCommand::Check { path }) => {
            commands::rules::run_check(path, cli.quiet)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

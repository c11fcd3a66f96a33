// convoscan/src/main.rs
//! Convoscan entry point.

use std::process::ExitCode;

use clap::Parser;

use convoscan::cli::Cli;
use convoscan::commands::error_msg;
use convoscan::{logger, EXIT_ERROR};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init_logger(convoscan::log_level(&cli));

    match convoscan::run(cli) {
        Ok(code) => code,
        Err(e) => {
            error_msg(format!("{:#}", e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}

// convoscan/src/logger.rs
//! Logger setup for the CLI.
//!
//! `RUST_LOG` drives the filter (default `warn`). An explicit level from the
//! command line wins for the convoscan crates; `Off` silences everything.

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

const APP_CRATES: [&str; 2] = ["convoscan", "convoscan_core"];

pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("warn"));
    builder.target(Target::Stderr).format_timestamp(None);

    match level {
        Some(LevelFilter::Off) => {
            builder.filter_level(LevelFilter::Off);
        }
        Some(level) => {
            for krate in APP_CRATES {
                builder.filter_module(krate, level);
            }
        }
        None => {}
    }

    // A logger may already be installed when the CLI is driven from tests.
    let _ = builder.try_init();
}

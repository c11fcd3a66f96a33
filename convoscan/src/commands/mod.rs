// convoscan/src/commands/mod.rs
//! Command implementations and the rule-file discovery they share.

pub mod rules;
pub mod scan;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use is_terminal::IsTerminal;
use log::{debug, info};

use convoscan_core::{merge_rules, DetectionConfig};

use crate::ui::output_format;

pub fn info_msg(msg: impl AsRef<str>) {
    let supports_color = io::stderr().is_terminal();
    let _ = output_format::print_info_message(&mut io::stderr(), msg.as_ref(), supports_color);
}

pub fn warn_msg(msg: impl AsRef<str>) {
    let supports_color = io::stderr().is_terminal();
    let _ = output_format::print_warn_message(&mut io::stderr(), msg.as_ref(), supports_color);
}

pub fn error_msg(msg: impl AsRef<str>) {
    let supports_color = io::stderr().is_terminal();
    let _ = output_format::print_error_message(&mut io::stderr(), msg.as_ref(), supports_color);
}

/// Places a user rules file is picked up from when `--config` is not given.
pub fn rules_candidate_paths() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".convoscan").join("rules.yaml"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("convoscan").join("rules.yaml"));
    }
    candidates
}

/// Loads the built-in rules and merges the user's file over them. An explicit
/// path must exist; otherwise the first discovered candidate is used.
pub fn load_detection_config(explicit: Option<&Path>) -> Result<DetectionConfig> {
    let defaults = DetectionConfig::load_default_rules()?;

    let user_path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => rules_candidate_paths().into_iter().find(|p| p.is_file()),
    };

    let user_config = match user_path {
        Some(path) => {
            info!("Using rules file {}", path.display());
            Some(DetectionConfig::load_from_file(&path)?)
        }
        None => {
            debug!("No user rules file found; using built-in rules only.");
            None
        }
    };

    Ok(merge_rules(defaults, user_config))
}

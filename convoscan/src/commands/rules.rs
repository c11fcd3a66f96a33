// convoscan/src/commands/rules.rs
//! `convoscan rules list` and `convoscan rules check`.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use is_terminal::IsTerminal;

use convoscan_core::{DetectionConfig, PatternRegistry, RuleFamily};

use super::{info_msg, load_detection_config};
use crate::ui::output_format;

/// Prints the rules a `scan` with the same flags would run: opt-in rules only
/// when enabled, and nothing disabled by flag or by `enabled: false`.
pub fn run_list(config_path: Option<&Path>, enable: &[String], disable: &[String]) -> Result<()> {
    let mut config = load_detection_config(config_path)?;
    config.set_active_rules(enable, disable);
    config.rules.retain(|rule| rule.is_enabled());

    let stdout = io::stdout();
    let supports_color = stdout.is_terminal();
    let mut writer = stdout.lock();
    writeln!(writer, "{}", output_format::rules_table(&config.rules, supports_color))?;
    Ok(())
}

/// Loads, validates and compiles `path` on its own, without the defaults.
pub fn run_check(path: &Path, quiet: bool) -> Result<()> {
    let config = DetectionConfig::load_from_file(path)?;
    let registry = PatternRegistry::new(&config)
        .with_context(|| format!("Rules in {} failed to compile", path.display()))?;

    if !quiet {
        let per_family: Vec<String> = RuleFamily::ALL
            .iter()
            .map(|f| format!("{} {}", registry.family(*f).len(), f))
            .collect();
        info_msg(format!(
            "{}: {} rule(s) OK ({})",
            path.display(),
            config.rules.len(),
            per_family.join(", ")
        ));
    }
    Ok(())
}

//! compiler.rs - Compiles detection rules into case-insensitive regexes.
//!
//! Compilation happens once, when a `PatternRegistry` is built. Any malformed
//! rule fails the whole compilation so a broken rule set never reaches a scan.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use regex::{Regex, RegexBuilder};

use crate::config::{DetectionRule, RuleFamily, MAX_PATTERN_LENGTH};
use crate::errors::ConvoscanError;

/// A single compiled detection rule.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// The compiled regular expression used for matching.
    pub regex: Regex,
    /// The unique name of the detection rule.
    pub name: String,
    pub family: RuleFamily,
    /// A flag indicating if matches need additional programmatic validation.
    pub programmatic_validation: bool,
}

/// All compiled rules, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    pub rules: Vec<CompiledRule>,
}

/// Compiles a list of `DetectionRule`s. Explicitly disabled rules are skipped.
pub fn compile_rules(rules_to_compile: Vec<DetectionRule>) -> Result<CompiledRules, ConvoscanError> {
    debug!("Starting compilation of {} rules.", rules_to_compile.len());

    let mut compiled_rules = Vec::new();
    let mut compilation_errors = Vec::new();

    for rule in rules_to_compile {
        if !rule.is_enabled() {
            debug!("Skipping disabled rule '{}'.", rule.name);
            continue;
        }

        let Some(source) = rule.regex_source() else {
            compilation_errors.push(ConvoscanError::Configuration(format!(
                "rule '{}' has neither a `pattern` nor any `terms`",
                rule.name
            )));
            continue;
        };

        debug!("Attempting to compile rule: '{}' with pattern '{:?}'", &rule.name, source);

        if source.len() > MAX_PATTERN_LENGTH {
            compilation_errors.push(ConvoscanError::PatternLengthExceeded(
                rule.name,
                source.len(),
                MAX_PATTERN_LENGTH,
            ));
            continue;
        }

        let regex_result = RegexBuilder::new(&source)
            .case_insensitive(true)
            .size_limit(10 * (1 << 20)) // 10 MB limit for compiled regex
            .build();

        match regex_result {
            Ok(regex) => {
                log::debug!(
                    target: "convoscan_core::registry",
                    "Rule '{}' compiled successfully.",
                    &rule.name
                );
                compiled_rules.push(CompiledRule {
                    regex,
                    name: rule.name,
                    family: rule.family,
                    programmatic_validation: rule.programmatic_validation,
                });
            }
            Err(e) => {
                compilation_errors.push(ConvoscanError::RuleCompilationError(rule.name, e));
            }
        }
    }

    match compilation_errors.len() {
        0 => {
            debug!("Finished compiling rules. Total compiled: {}.", compiled_rules.len());
            Ok(CompiledRules { rules: compiled_rules })
        }
        1 => Err(compilation_errors.remove(0)),
        n => {
            let error_message = compilation_errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<String>>()
                .join("\n");
            Err(ConvoscanError::Fatal(format!(
                "Failed to compile {} rule(s):\n{}",
                n, error_message
            )))
        }
    }
}

//! Configuration management for `convoscan-core`.
//!
//! This module defines the detection rules, their families, and the scan and
//! engine settings that sit next to them. It handles YAML
//! serialization/deserialization and provides utilities for loading, merging,
//! filtering, and validating rule sets.
//!
//! License: MIT OR Apache-2.0

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::transcript::RoleVocabulary;

/// Maximum allowed length for a regex pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// Default timeout for a single classifier request.
pub const DEFAULT_CLASSIFIER_TIMEOUT_MS: u64 = 10_000;

/// Prompt used for conversation-level privacy classification. `{text}` is the
/// formatted transcript.
pub const DEFAULT_PRIVACY_PROMPT: &str = "Analyze for privacy violations:
1. Check if financial details are shared before verification
2. Verify if proper authentication was skipped
Text: \"{text}\"
Label:";

/// The three groups a detection rule can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleFamily {
    Profanity,
    SensitiveInfo,
    VerificationEvidence,
}

impl RuleFamily {
    pub const ALL: [RuleFamily; 3] = [
        RuleFamily::Profanity,
        RuleFamily::SensitiveInfo,
        RuleFamily::VerificationEvidence,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleFamily::Profanity => "profanity",
            RuleFamily::SensitiveInfo => "sensitive_info",
            RuleFamily::VerificationEvidence => "verification_evidence",
        }
    }
}

impl fmt::Display for RuleFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named detection rule.
///
/// `name` and `family` are required in YAML; everything else has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DetectionRule {
    /// Unique identifier for the rule (e.g., "ssn_disclosure").
    pub name: String,
    /// Which family the rule contributes to.
    pub family: RuleFamily,
    /// Human-readable description of what the rule targets.
    #[serde(default)]
    pub description: Option<String>,
    /// A raw regex pattern. Mutually exclusive with `terms`.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Literal alternatives (spelling variants). Escaped before compilation.
    #[serde(default)]
    pub terms: Option<Vec<String>>,
    /// When false the rule matches anywhere, including inside other words.
    #[serde(default = "default_word_boundary")]
    pub word_boundary: bool,
    /// If true, matches are additionally checked by a structural validator.
    #[serde(default)]
    pub programmatic_validation: bool,
    /// Explicit override for enabling/disabling the rule.
    #[serde(default)]
    pub enabled: Option<bool>,
    /// If true, the rule is disabled unless explicitly enabled.
    #[serde(default)]
    pub opt_in: bool,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_author")]
    pub author: String,
}

fn default_word_boundary() -> bool {
    true
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_author() -> String {
    "Convoscan Team".to_string()
}

impl Default for DetectionRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            family: RuleFamily::Profanity,
            description: None,
            pattern: None,
            terms: None,
            word_boundary: default_word_boundary(),
            programmatic_validation: false,
            enabled: None,
            opt_in: false,
            severity: None,
            tags: None,
            version: default_version(),
            author: default_author(),
        }
    }
}

impl DetectionRule {
    /// Builds the regex source for this rule, applying term escaping and
    /// word boundaries. Returns `None` when neither `pattern` nor `terms` is set.
    pub fn regex_source(&self) -> Option<String> {
        match (&self.pattern, &self.terms) {
            (Some(pattern), _) => {
                let body = format!("(?:{})", pattern);
                if self.word_boundary {
                    Some(format!(r"\b{}\b", body))
                } else {
                    Some(body)
                }
            }
            (None, Some(terms)) if !terms.is_empty() => {
                let mut sorted: Vec<&String> = terms.iter().collect();
                // Longest first so leftmost-first alternation prefers "f**king" over "f**".
                sorted.sort_by(|a, b| b.len().cmp(&a.len()));
                let alternation = sorted
                    .iter()
                    .map(|t| self.bounded_term(t))
                    .collect::<Vec<_>>()
                    .join("|");
                Some(format!("(?:{})", alternation))
            }
            _ => None,
        }
    }

    /// Escapes a literal term. With `word_boundary` set, `\b` is only placed on
    /// edges that are word characters.
    fn bounded_term(&self, term: &str) -> String {
        let escaped = regex::escape(term);
        if !self.word_boundary {
            return escaped;
        }
        let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
        let start = if is_word(term.chars().next()) { r"\b" } else { "" };
        let end = if is_word(term.chars().last()) { r"\b" } else { "" };
        format!("{}{}{}", start, escaped, end)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// Scan-time settings. Every field is optional so user files can override
/// only what they care about.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ScanConfig {
    pub agent_keywords: Option<Vec<String>>,
    pub counterparty_keywords: Option<Vec<String>>,
    /// Keywords that, in the same utterance as verification evidence, confirm it.
    pub corroboration_markers: Option<Vec<String>>,
    /// Upper bound on recorded compliance findings. `None` means unlimited.
    pub max_findings: Option<usize>,
    /// Worker threads for the profanity scanner. `None` or `1` runs sequentially.
    pub profanity_workers: Option<usize>,
}

impl ScanConfig {
    pub fn vocabulary(&self) -> RoleVocabulary {
        let defaults = RoleVocabulary::default();
        RoleVocabulary::new(
            self.agent_keywords.clone().unwrap_or(defaults.agent),
            self.counterparty_keywords.clone().unwrap_or(defaults.counterparty),
        )
    }

    pub fn corroboration_markers(&self) -> Vec<String> {
        self.corroboration_markers
            .clone()
            .unwrap_or_else(|| vec!["correct".to_string(), "match".to_string()])
            .into_iter()
            .map(|m| m.to_lowercase())
            .collect()
    }
}

/// Settings for the model-based classifier collaborator.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ClassifierConfig {
    /// HTTP endpoint accepting `{task, text}` and returning `{label, score}`.
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
    pub privacy_prompt: Option<String>,
}

impl ClassifierConfig {
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_CLASSIFIER_TIMEOUT_MS)
    }

    pub fn privacy_prompt(&self) -> &str {
        self.privacy_prompt.as_deref().unwrap_or(DEFAULT_PRIVACY_PROMPT)
    }
}

/// Container for all engine-specific configurations.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
}

/// Top-level configuration: rules plus scan and engine settings.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct DetectionConfig {
    pub rules: Vec<DetectionRule>,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub engines: EngineConfig,
}

impl DetectionConfig {
    /// Loads detection rules from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading custom rules from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml_str(&text)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        info!("Loaded {} rules from file {}.", config.rules.len(), path.display());
        Ok(config)
    }

    /// Parses and validates a YAML rule set.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: DetectionConfig =
            serde_yml::from_str(text).context("Failed to parse rules YAML")?;
        validate_rules(&config.rules)?;
        Ok(config)
    }

    /// Loads the built-in rule set embedded in the library.
    pub fn load_default_rules() -> Result<Self> {
        debug!("Loading default rules from embedded string...");
        let default_yaml = include_str!("../config/default_rules.yaml");
        let config: DetectionConfig =
            serde_yml::from_str(default_yaml).context("Failed to parse default rules")?;

        debug!("Loaded {} default rules.", config.rules.len());
        Ok(config)
    }

    /// Filters active rules based on enable/disable lists.
    pub fn set_active_rules(&mut self, enable_rules: &[String], disable_rules: &[String]) {
        let enable_set: HashSet<&str> = enable_rules.iter().map(String::as_str).collect();
        let disable_set: HashSet<&str> = disable_rules.iter().map(String::as_str).collect();

        debug!("Initial rules count before filtering: {}", self.rules.len());

        let all_rule_names: HashSet<&str> = self.rules.iter().map(|r| r.name.as_str()).collect();

        for rule_name in enable_set.difference(&all_rule_names) {
            warn!("Rule '{}' in `enable_rules` list does not exist.", rule_name);
        }

        for rule_name in disable_set.difference(&all_rule_names) {
            warn!("Rule '{}' in `disable_rules` list does not exist.", rule_name);
        }

        self.rules.retain(|rule| {
            let name = rule.name.as_str();
            !disable_set.contains(name) && (!rule.opt_in || enable_set.contains(name))
        });

        debug!("Final active rules count after filtering: {}", self.rules.len());
    }

    /// Rules of one family, in evaluation order.
    pub fn rules_for(&self, family: RuleFamily) -> impl Iterator<Item = &DetectionRule> {
        self.rules.iter().filter(move |r| r.family == family)
    }
}

/// Merges user-defined rules and settings with defaults.
///
/// Evaluation order is kept stable: overridden rules stay in their default
/// position, new user rules are appended in file order.
pub fn merge_rules(
    default_config: DetectionConfig,
    user_config: Option<DetectionConfig>,
) -> DetectionConfig {
    debug!("merge_rules called. Initial default rules count: {}", default_config.rules.len());

    let mut final_rules = default_config.rules;
    let mut final_scan = default_config.scan;
    let mut final_engines = default_config.engines;

    if let Some(user_cfg) = user_config {
        debug!("User config provided. Merging {} user rules.", user_cfg.rules.len());
        for user_rule in user_cfg.rules {
            match final_rules.iter_mut().find(|r| r.name == user_rule.name) {
                Some(existing) => *existing = user_rule,
                None => final_rules.push(user_rule),
            }
        }

        let scan = user_cfg.scan;
        if scan.agent_keywords.is_some() {
            final_scan.agent_keywords = scan.agent_keywords;
        }
        if scan.counterparty_keywords.is_some() {
            final_scan.counterparty_keywords = scan.counterparty_keywords;
        }
        if scan.corroboration_markers.is_some() {
            final_scan.corroboration_markers = scan.corroboration_markers;
        }
        if let Some(limit) = scan.max_findings {
            debug!("Overriding max_findings with user value: {}", limit);
            final_scan.max_findings = Some(limit);
        }
        if let Some(workers) = scan.profanity_workers {
            debug!("Overriding profanity_workers with user value: {}", workers);
            final_scan.profanity_workers = Some(workers);
        }

        let classifier = user_cfg.engines.classifier;
        if classifier.endpoint.is_some() {
            final_engines.classifier.endpoint = classifier.endpoint;
        }
        if classifier.timeout_ms.is_some() {
            final_engines.classifier.timeout_ms = classifier.timeout_ms;
        }
        if classifier.privacy_prompt.is_some() {
            final_engines.classifier.privacy_prompt = classifier.privacy_prompt;
        }
    }

    debug!("Final total rules after merge: {}", final_rules.len());

    DetectionConfig {
        rules: final_rules,
        scan: final_scan,
        engines: final_engines,
    }
}

/// Validates rule integrity: names, pattern presence, regex compilation.
pub fn validate_rules(rules: &[DetectionRule]) -> Result<()> {
    let mut rule_names = HashSet::new();
    let mut errors = Vec::new();

    for rule in rules {
        if rule.name.is_empty() {
            errors.push("A rule has an empty `name` field.".to_string());
        } else if !rule_names.insert(rule.name.clone()) {
            errors.push(format!("Duplicate rule name found: '{}'.", rule.name));
        }

        match (&rule.pattern, &rule.terms) {
            (Some(_), Some(_)) => {
                errors.push(format!(
                    "Rule '{}' sets both `pattern` and `terms`; use one.",
                    rule.name
                ));
                continue;
            }
            (None, None) => {
                errors.push(format!("Rule '{}' is missing a `pattern` or `terms` field.", rule.name));
                continue;
            }
            (Some(p), None) if p.is_empty() => {
                errors.push(format!("Rule '{}' has an empty `pattern` field.", rule.name));
                continue;
            }
            (None, Some(t)) if t.is_empty() || t.iter().any(|term| term.is_empty()) => {
                errors.push(format!("Rule '{}' has an empty `terms` entry.", rule.name));
                continue;
            }
            _ => {}
        }

        if let Some(source) = rule.regex_source() {
            if source.len() > MAX_PATTERN_LENGTH {
                errors.push(format!(
                    "Rule '{}': pattern length ({}) exceeds maximum allowed ({}).",
                    rule.name,
                    source.len(),
                    MAX_PATTERN_LENGTH
                ));
            } else if let Err(e) = Regex::new(&source) {
                errors.push(format!("Rule '{}' has an invalid regex pattern: {}", rule.name, e));
            }
        }
    }

    if !errors.is_empty() {
        Err(anyhow!("Rule validation failed:\n{}", errors.join("\n")))
    } else {
        Ok(())
    }
}

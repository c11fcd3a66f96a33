//! The pattern registry: compiled detection rules grouped by family.
//!
//! A registry is built once from a `DetectionConfig` and is read-only from
//! then on, so a single instance can be shared (typically behind an `Arc`)
//! by any number of concurrent scans.

pub mod compiler;

use log::debug;

use crate::config::{DetectionConfig, DetectionRule, RuleFamily};
use crate::errors::ConvoscanError;
use crate::finding::MatchedFragment;
use crate::validators;

use compiler::{compile_rules, CompiledRule};

#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    profanity: Vec<CompiledRule>,
    sensitive_info: Vec<CompiledRule>,
    verification_evidence: Vec<CompiledRule>,
}

impl PatternRegistry {
    /// Compiles every enabled rule in the configuration.
    pub fn new(config: &DetectionConfig) -> Result<Self, ConvoscanError> {
        Self::from_rules(config.rules.clone())
    }

    pub fn from_rules(rules: Vec<DetectionRule>) -> Result<Self, ConvoscanError> {
        let compiled = compile_rules(rules)?;
        let mut registry = Self::default();
        for rule in compiled.rules {
            match rule.family {
                RuleFamily::Profanity => registry.profanity.push(rule),
                RuleFamily::SensitiveInfo => registry.sensitive_info.push(rule),
                RuleFamily::VerificationEvidence => registry.verification_evidence.push(rule),
            }
        }
        debug!(
            "PatternRegistry ready: {} profanity, {} sensitive_info, {} verification_evidence rule(s).",
            registry.profanity.len(),
            registry.sensitive_info.len(),
            registry.verification_evidence.len()
        );
        Ok(registry)
    }

    /// Compiled rules of one family, in evaluation order.
    pub fn family(&self, family: RuleFamily) -> &[CompiledRule] {
        match family {
            RuleFamily::Profanity => &self.profanity,
            RuleFamily::SensitiveInfo => &self.sensitive_info,
            RuleFamily::VerificationEvidence => &self.verification_evidence,
        }
    }

    /// All non-overlapping matches of each rule in the family, rule by rule in
    /// evaluation order. An empty result means no match.
    pub fn find(&self, family: RuleFamily, text: &str) -> Vec<MatchedFragment> {
        let mut fragments = Vec::new();
        for rule in self.family(family) {
            for m in rule.regex.find_iter(text) {
                if rule.programmatic_validation && !validators::validate_fragment(&rule.name, m.as_str()) {
                    debug!("Rule '{}' match rejected by programmatic validation.", rule.name);
                    continue;
                }
                fragments.push(MatchedFragment {
                    rule_name: rule.name.clone(),
                    text: m.as_str().to_string(),
                    start: m.start(),
                    end: m.end(),
                });
            }
        }
        fragments
    }

    /// True if any rule in the family matches.
    pub fn is_match(&self, family: RuleFamily, text: &str) -> bool {
        self.family(family).iter().any(|rule| {
            if rule.programmatic_validation {
                rule.regex
                    .find_iter(text)
                    .any(|m| validators::validate_fragment(&rule.name, m.as_str()))
            } else {
                rule.regex.is_match(text)
            }
        })
    }

    pub fn rule_count(&self) -> usize {
        self.profanity.len() + self.sensitive_info.len() + self.verification_evidence.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms_rule(name: &str, family: RuleFamily, terms: &[&str], word_boundary: bool) -> DetectionRule {
        DetectionRule {
            name: name.to_string(),
            family,
            terms: Some(terms.iter().map(|t| t.to_string()).collect()),
            word_boundary,
            ..Default::default()
        }
    }

    fn defaults() -> PatternRegistry {
        let config = DetectionConfig::load_default_rules().unwrap();
        PatternRegistry::new(&config).unwrap()
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PatternRegistry>();
    }

    #[test]
    fn test_word_boundary_prevents_substring_match() {
        let registry = PatternRegistry::from_rules(vec![terms_rule(
            "ass",
            RuleFamily::Profanity,
            &["ass"],
            true,
        )])
        .unwrap();
        assert!(registry.find(RuleFamily::Profanity, "class").is_empty());
        assert!(registry.find(RuleFamily::Profanity, "passing grade").is_empty());
        assert_eq!(registry.find(RuleFamily::Profanity, "what an ASS").len(), 1);
    }

    #[test]
    fn test_bare_substring_rule_matches_inside_words() {
        let registry = PatternRegistry::from_rules(vec![terms_rule(
            "masked",
            RuleFamily::Profanity,
            &["f**", "f**king"],
            false,
        )])
        .unwrap();
        let found = registry.find(RuleFamily::Profanity, "this f**king thing");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "f**king");
        assert_eq!(registry.find(RuleFamily::Profanity, "xf**x").len(), 1);
    }

    #[test]
    fn test_matches_are_case_insensitive_and_exhaustive() {
        let registry = defaults();
        let found = registry.find(RuleFamily::Profanity, "DAMN it, damn it all");
        let texts: Vec<&str> = found.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["DAMN", "damn"]);
        assert_eq!(found[0].start, 0);
        assert_eq!(found[0].end, 4);
    }

    #[test]
    fn test_union_follows_rule_order() {
        let registry = PatternRegistry::from_rules(vec![
            terms_rule("second_word", RuleFamily::SensitiveInfo, &["beta"], true),
            terms_rule("first_word", RuleFamily::SensitiveInfo, &["alpha"], true),
        ])
        .unwrap();
        let found = registry.find(RuleFamily::SensitiveInfo, "alpha beta");
        let names: Vec<&str> = found.iter().map(|f| f.rule_name.as_str()).collect();
        assert_eq!(names, vec!["second_word", "first_word"]);
    }

    #[test]
    fn test_default_profanity_lexicon() {
        let registry = defaults();
        let found = registry.find(RuleFamily::Profanity, "you fucking kidding");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "fucking");
        assert!(registry.find(RuleFamily::Profanity, "hello there, classy shell").is_empty());
    }

    #[test]
    fn test_default_sensitive_and_verification_rules() {
        let registry = defaults();
        assert!(registry.is_match(RuleFamily::SensitiveInfo, "your balance is $300"));
        assert!(registry.is_match(RuleFamily::SensitiveInfo, "Your SSN on file is 123-45-6789"));
        assert!(!registry.is_match(RuleFamily::SensitiveInfo, "What's your account number?"));
        assert!(registry.is_match(RuleFamily::SensitiveInfo, "account number: 99812"));
        assert!(registry.is_match(
            RuleFamily::SensitiveInfo,
            "your credit card number is 4111-1111-1111-1111"
        ));

        assert!(registry.is_match(RuleFamily::VerificationEvidence, "your DOB matches, correct"));
        assert!(registry.is_match(
            RuleFamily::VerificationEvidence,
            "I need to verify your identity first"
        ));
        assert!(registry.is_match(RuleFamily::VerificationEvidence, "date of birth: 01/02/1980"));
        assert!(!registry.is_match(RuleFamily::VerificationEvidence, "Your SSN on file is 123-45-6789"));
    }

    #[test]
    fn test_programmatic_validation_filters_matches() {
        let registry = defaults();
        assert!(!registry.is_match(RuleFamily::SensitiveInfo, "reference 000-12-3456"));
        assert!(registry.is_match(RuleFamily::SensitiveInfo, "reference 123-12-3456"));
    }

    #[test]
    fn test_malformed_rule_fails_at_construction() {
        let rules = vec![DetectionRule {
            name: "bad".to_string(),
            family: RuleFamily::SensitiveInfo,
            pattern: Some("(?P<".to_string()),
            ..Default::default()
        }];
        let err = PatternRegistry::from_rules(rules).unwrap_err();
        assert!(err.is_configuration_error());
    }
}

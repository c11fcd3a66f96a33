// convoscan-core/src/scanners/compliance.rs
//! Pre-verification disclosure detection.
//!
//! A linear state machine over agent utterances, in transcript order:
//!
//! 1. While not verified, a verification-evidence match moves the state to
//!    attempted; if the same utterance also carries a corroboration marker
//!    the state becomes verified. Verified is terminal.
//! 2. The utterance is then matched against the sensitive-information family.
//! 3. Matches while unverified are recorded as one finding with a snapshot of
//!    the state. Matches after verification are compliant.
//!
//! Counterparty and unknown speakers are never inspected. Blank utterances
//! leave the state untouched.

use log::{debug, info, warn};

use crate::config::RuleFamily;
use crate::errors::ConvoscanError;
use crate::finding::{log_finding_debug, Finding, VerificationState};
use crate::registry::PatternRegistry;
use crate::transcript::{RoleVocabulary, SpeakerRole, Transcript, Utterance};

use super::{ComplianceReport, ScanControl};

#[derive(Debug, Clone)]
pub struct ComplianceScanner<'a> {
    registry: &'a PatternRegistry,
    vocabulary: &'a RoleVocabulary,
    corroboration_markers: Vec<String>,
    max_findings: Option<usize>,
}

impl<'a> ComplianceScanner<'a> {
    pub fn new(
        registry: &'a PatternRegistry,
        vocabulary: &'a RoleVocabulary,
        corroboration_markers: Vec<String>,
    ) -> Self {
        Self {
            registry,
            vocabulary,
            corroboration_markers: corroboration_markers
                .into_iter()
                .map(|m| m.to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
            max_findings: None,
        }
    }

    /// Caps the number of recorded findings. The scan still runs to the end
    /// and the report is marked truncated.
    pub fn with_max_findings(mut self, limit: Option<usize>) -> Self {
        self.max_findings = limit;
        self
    }

    pub fn scan(&self, transcript: &Transcript) -> ComplianceReport {
        let mut state = VerificationState::default();
        let mut report = ComplianceReport::default();
        for (index, utterance) in transcript.iter().enumerate() {
            self.step(index, utterance, &mut state, &mut report);
        }
        self.finish(state, report)
    }

    /// Same as `scan`, checking `control` for cancellation between utterances.
    pub fn scan_with(
        &self,
        transcript: &Transcript,
        control: &ScanControl,
    ) -> Result<ComplianceReport, ConvoscanError> {
        let mut state = VerificationState::default();
        let mut report = ComplianceReport::default();
        for (index, utterance) in transcript.iter().enumerate() {
            control.checkpoint(index)?;
            self.step(index, utterance, &mut state, &mut report);
        }
        Ok(self.finish(state, report))
    }

    fn step(
        &self,
        index: usize,
        utterance: &Utterance,
        state: &mut VerificationState,
        report: &mut ComplianceReport,
    ) {
        if utterance.is_blank() || self.vocabulary.classify(&utterance.speaker) != SpeakerRole::Agent {
            return;
        }
        let text = &utterance.text;

        if !state.verified {
            let evidence = self.registry.is_match(RuleFamily::VerificationEvidence, text);
            let corroborated = evidence && self.is_corroborated(text);
            state.observe(evidence, corroborated);
            if evidence {
                debug!(
                    "Utterance {}: verification evidence found, phase now {:?}.",
                    index,
                    state.phase()
                );
            }
        }

        let fragments = self.registry.find(RuleFamily::SensitiveInfo, text);
        if fragments.is_empty() || state.verified {
            return;
        }

        if self.max_findings.map_or(false, |limit| report.findings.len() >= limit) {
            if !report.truncated {
                warn!("Compliance finding limit reached at utterance {}; further findings are not recorded.", index);
            }
            report.truncated = true;
            return;
        }

        let finding = Finding::new(index, utterance, SpeakerRole::Agent, RuleFamily::SensitiveInfo, fragments)
            .with_verification(*state);
        log_finding_debug(module_path!(), &finding);
        report.findings.push(finding);
    }

    fn is_corroborated(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.corroboration_markers.iter().any(|m| lower.contains(m.as_str()))
    }

    fn finish(&self, state: VerificationState, mut report: ComplianceReport) -> ComplianceReport {
        report.final_state = state;
        info!(
            "Compliance scan complete: {} finding(s), final phase {:?}.",
            report.findings.len(),
            state.phase()
        );
        report
    }
}

/// Compliance scan with the default vocabulary and corroboration markers.
pub fn detect_compliance_violations(registry: &PatternRegistry, transcript: &Transcript) -> Vec<Finding> {
    let vocabulary = RoleVocabulary::default();
    ComplianceScanner::new(
        registry,
        &vocabulary,
        vec!["correct".to_string(), "match".to_string()],
    )
    .scan(transcript)
    .findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DetectionConfig, DetectionRule};

    fn registry() -> PatternRegistry {
        PatternRegistry::new(&DetectionConfig::load_default_rules().unwrap()).unwrap()
    }

    fn agent(text: &str) -> Utterance {
        Utterance::new("Agent", text)
    }

    #[test]
    fn test_disclosure_before_verification_is_flagged() {
        let registry = registry();
        let t = Transcript::new(vec![
            agent("What's your account number?"),
            agent("Your SSN on file is 123-45-6789"),
        ]);
        let findings = detect_compliance_violations(&registry, &t);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].utterance_index, 1);
        assert_eq!(
            findings[0].verification,
            Some(VerificationState { verified: false, attempted: false })
        );
        assert_eq!(findings[0].matched_texts(), vec!["123-45-6789"]);
    }

    #[test]
    fn test_order_of_verification_and_disclosure_matters() {
        let registry = registry();
        let before = Transcript::new(vec![agent("your balance is $300"), agent("your DOB matches, correct")]);
        let after = Transcript::new(vec![agent("your DOB matches, correct"), agent("your balance is $300")]);

        assert_eq!(detect_compliance_violations(&registry, &before).len(), 1);
        assert!(detect_compliance_violations(&registry, &after).is_empty());
    }

    #[test]
    fn test_attempt_without_corroboration_stays_unverified() {
        let registry = registry();
        let vocabulary = RoleVocabulary::default();
        let scanner = ComplianceScanner::new(&registry, &vocabulary, vec!["correct".into(), "match".into()]);
        let t = Transcript::new(vec![
            agent("Before we continue I need to verify your identity."),
            agent("Your balance is $1,250.00"),
        ]);
        let report = scanner.scan(&t);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(
            report.findings[0].verification,
            Some(VerificationState { verified: false, attempted: true })
        );
        assert_eq!(report.final_state, VerificationState { verified: false, attempted: true });
    }

    #[test]
    fn test_marker_without_evidence_does_not_verify() {
        let registry = registry();
        let t = Transcript::new(vec![
            agent("That is correct, it is a match."),
            agent("your balance is $300"),
        ]);
        assert_eq!(detect_compliance_violations(&registry, &t).len(), 1);
    }

    #[test]
    fn test_failed_identity_check_does_not_verify() {
        let registry = registry();
        let t = Transcript::new(vec![
            agent("Sorry, the DOB you gave does not match our records."),
            agent("Your balance is $300"),
        ]);
        let findings = detect_compliance_violations(&registry, &t);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].verification,
            Some(VerificationState { verified: false, attempted: false })
        );

        let t = Transcript::new(vec![
            agent("Thanks, the DOB you gave matches our records."),
            agent("Your balance is $300"),
        ]);
        assert!(detect_compliance_violations(&registry, &t).is_empty());
    }

    #[test]
    fn test_verification_is_terminal() {
        let registry = registry();
        let t = Transcript::new(vec![
            agent("date of birth 01/02/1980 is correct"),
            agent("your balance is $300"),
            agent("I need to verify your identity again"),
            agent("account number 12345678"),
        ]);
        let vocabulary = RoleVocabulary::default();
        let report = ComplianceScanner::new(&registry, &vocabulary, vec!["correct".into()]).scan(&t);
        assert!(report.findings.is_empty());
        assert!(report.final_state.verified);
    }

    #[test]
    fn test_non_agent_speakers_are_ignored() {
        let registry = registry();
        let t = Transcript::new(vec![
            Utterance::new("Borrower", "my SSN is 123-45-6789"),
            Utterance::new("system", "balance: $50"),
            Utterance::new("Borrower", "your DOB matches, correct"),
            agent("balance: $50"),
        ]);
        let findings = detect_compliance_violations(&registry, &t);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].utterance_index, 3);
        assert_eq!(
            findings[0].verification,
            Some(VerificationState { verified: false, attempted: false })
        );
    }

    #[test]
    fn test_blank_agent_text_is_skipped() {
        let registry = registry();
        let t = Transcript::new(vec![agent(""), agent("   \t"), agent("nothing sensitive")]);
        let vocabulary = RoleVocabulary::default();
        let report = ComplianceScanner::new(&registry, &vocabulary, vec![]).scan(&t);
        assert!(report.findings.is_empty());
        assert_eq!(report.final_state, VerificationState::default());
    }

    #[test]
    fn test_all_sensitive_fragments_in_one_finding() {
        let registry = registry();
        let t = Transcript::new(vec![agent(
            "account number 4455 and your balance is $20, SSN: 123-45-6789",
        )]);
        let findings = detect_compliance_violations(&registry, &t);
        assert_eq!(findings.len(), 1);
        let rules: Vec<&str> = findings[0].fragments.iter().map(|f| f.rule_name.as_str()).collect();
        assert_eq!(rules, vec!["account_number", "balance_disclosure", "ssn_disclosure", "ssn_number"]);
    }

    #[test]
    fn test_max_findings_marks_report_truncated() {
        let registry = registry();
        let vocabulary = RoleVocabulary::default();
        let t = Transcript::new(vec![
            agent("balance: $1"),
            agent("balance: $2"),
            agent("balance: $3"),
        ]);
        let report = ComplianceScanner::new(&registry, &vocabulary, vec![])
            .with_max_findings(Some(2))
            .scan(&t);
        assert_eq!(report.findings.len(), 2);
        assert!(report.truncated);

        let full = ComplianceScanner::new(&registry, &vocabulary, vec![]).scan(&t);
        assert_eq!(full.findings.len(), 3);
        assert!(!full.truncated);
    }

    #[test]
    fn test_custom_rule_set_is_isolated() {
        let rules = vec![
            DetectionRule {
                name: "pin".to_string(),
                family: RuleFamily::SensitiveInfo,
                pattern: Some(r"pin\s+\d{4}".to_string()),
                ..Default::default()
            },
            DetectionRule {
                name: "passphrase".to_string(),
                family: RuleFamily::VerificationEvidence,
                terms: Some(vec!["passphrase".to_string()]),
                ..Default::default()
            },
        ];
        let registry = PatternRegistry::from_rules(rules).unwrap();
        let vocabulary = RoleVocabulary::default();
        let scanner = ComplianceScanner::new(&registry, &vocabulary, vec!["accepted".into()]);

        let t = Transcript::new(vec![
            agent("your pin 1234"),
            agent("passphrase accepted"),
            agent("your pin 1234"),
        ]);
        let report = scanner.scan(&t);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].utterance_index, 0);
    }
}

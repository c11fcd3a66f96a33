// convoscan-core/src/engines/classifier_engine.rs
//! A `DetectionEngine` that hands judgement to a `TextClassifier`.
//!
//! Profanity is classified one utterance at a time. Privacy is classified
//! once over the whole formatted conversation, rendered into the configured
//! prompt; a violation verdict is attributed to the last non-blank utterance.
//! Classifier errors never abort the scan: they are recorded as
//! `CollaboratorFailure`s and the affected record produces no finding.
//!
//! License: MIT OR APACHE 2.0

use std::sync::Arc;

use log::{debug, info, warn};

use crate::classifier::{render_privacy_prompt, ClassificationTask, HttpClassifier, TextClassifier};
use crate::config::{DetectionConfig, RuleFamily};
use crate::engine::DetectionEngine;
use crate::errors::ConvoscanError;
use crate::finding::{log_finding_debug, Finding, MatchedFragment, VerificationState};
use crate::scanners::{group_by_role, CollaboratorFailure, ComplianceReport, ProfanityReport, ScanControl};
use crate::transcript::{RoleVocabulary, SpeakerRole, Transcript};

pub struct ClassifierEngine {
    classifier: Arc<dyn TextClassifier>,
    config: DetectionConfig,
    vocabulary: RoleVocabulary,
    privacy_prompt: String,
}

impl ClassifierEngine {
    pub fn new(config: DetectionConfig, classifier: Arc<dyn TextClassifier>) -> Result<Self, ConvoscanError> {
        let privacy_prompt = config.engines.classifier.privacy_prompt().to_string();
        // Fail at construction rather than on the first transcript.
        render_privacy_prompt(&privacy_prompt, "")?;
        Ok(Self {
            classifier,
            vocabulary: config.scan.vocabulary(),
            config,
            privacy_prompt,
        })
    }

    /// Builds the engine around an `HttpClassifier` for the configured endpoint.
    pub fn from_config(config: DetectionConfig) -> Result<Self, ConvoscanError> {
        let classifier = HttpClassifier::from_config(&config.engines.classifier)?;
        Self::new(config, Arc::new(classifier))
    }

    fn whole_text_fragment(&self, text: &str) -> MatchedFragment {
        MatchedFragment {
            rule_name: format!("classifier:{}", self.classifier.name()),
            text: text.to_string(),
            start: 0,
            end: text.len(),
        }
    }
}

impl DetectionEngine for ClassifierEngine {
    fn name(&self) -> &'static str {
        "classifier"
    }

    fn detect_profanity_with(
        &self,
        transcript: &Transcript,
        control: &ScanControl,
    ) -> Result<ProfanityReport, ConvoscanError> {
        let mut findings = Vec::new();
        let mut failures = Vec::new();

        for (index, utterance) in transcript.iter().enumerate() {
            control.checkpoint(index)?;
            if utterance.is_blank() {
                continue;
            }
            let role = self.vocabulary.classify(&utterance.speaker);
            if role == SpeakerRole::Unknown {
                continue;
            }

            match self.classifier.classify(&utterance.text, ClassificationTask::Profanity) {
                Ok(result) if result.is_violation() => {
                    let finding = Finding::new(
                        index,
                        utterance,
                        role,
                        RuleFamily::Profanity,
                        vec![self.whole_text_fragment(&utterance.text)],
                    )
                    .with_confidence(result.score);
                    log_finding_debug(module_path!(), &finding);
                    findings.push(finding);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Classifier failed on utterance {}: {:#}", index, e);
                    failures.push(collaborator_failure(Some(index), RuleFamily::Profanity, &e));
                }
            }
        }

        info!(
            "Classifier profanity scan finished: {} finding(s), {} failure(s).",
            findings.len(),
            failures.len()
        );
        Ok(ProfanityReport {
            findings: group_by_role(findings),
            failures,
        })
    }

    fn detect_compliance_violations_with(
        &self,
        transcript: &Transcript,
        control: &ScanControl,
    ) -> Result<ComplianceReport, ConvoscanError> {
        control.checkpoint(0)?;
        let mut report = ComplianceReport::default();

        let Some((index, last)) = transcript
            .iter()
            .enumerate()
            .filter(|(_, u)| !u.is_blank())
            .last()
        else {
            debug!("Transcript has no non-blank utterances; skipping privacy classification.");
            return Ok(report);
        };

        let prompt = render_privacy_prompt(&self.privacy_prompt, &transcript.format_conversation())?;
        match self.classifier.classify(&prompt, ClassificationTask::Privacy) {
            Ok(result) if result.is_violation() => {
                let finding = Finding::new(
                    index,
                    last,
                    self.vocabulary.classify(&last.speaker),
                    RuleFamily::SensitiveInfo,
                    vec![self.whole_text_fragment(&last.text)],
                )
                .with_verification(VerificationState::default())
                .with_confidence(result.score);
                log_finding_debug(module_path!(), &finding);
                report.findings.push(finding);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Classifier failed on privacy check: {:#}", e);
                report
                    .failures
                    .push(collaborator_failure(None, RuleFamily::SensitiveInfo, &e));
            }
        }

        info!("Classifier privacy scan finished: {} finding(s).", report.findings.len());
        Ok(report)
    }

    fn get_config(&self) -> &DetectionConfig {
        &self.config
    }
}

fn collaborator_failure(
    utterance_index: Option<usize>,
    family: RuleFamily,
    error: &anyhow::Error,
) -> CollaboratorFailure {
    CollaboratorFailure {
        utterance_index,
        family,
        message: ConvoscanError::Collaborator(format!("{:#}", error)).to_string(),
    }
}

// convoscan-core/src/scanners/profanity.rs
//! Per-utterance profanity detection.
//!
//! Each non-blank utterance whose speaker classifies as agent or counterparty
//! is matched against the profanity family; all fragments found in one
//! utterance go into a single finding. Utterances have no dependency on each
//! other, so the work can be spread over a rayon pool. Results are re-sorted
//! by utterance index before grouping.

use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, info};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::config::RuleFamily;
use crate::errors::ConvoscanError;
use crate::finding::{log_finding_debug, Finding};
use crate::registry::PatternRegistry;
use crate::transcript::{RoleVocabulary, SpeakerRole, Transcript, Utterance};

use super::{group_by_role, ProfanityFindings, ScanControl};

/// Rule-based profanity scanner over a shared registry.
#[derive(Debug, Clone, Copy)]
pub struct ProfanityScanner<'a> {
    registry: &'a PatternRegistry,
    vocabulary: &'a RoleVocabulary,
}

impl<'a> ProfanityScanner<'a> {
    pub fn new(registry: &'a PatternRegistry, vocabulary: &'a RoleVocabulary) -> Self {
        Self { registry, vocabulary }
    }

    /// Scans the whole transcript sequentially.
    pub fn scan(&self, transcript: &Transcript) -> ProfanityFindings {
        let findings: Vec<Finding> = transcript
            .iter()
            .enumerate()
            .filter_map(|(index, utterance)| self.scan_utterance(index, utterance))
            .collect();
        self.finish(findings)
    }

    /// Scans with cancellation checks, optionally in parallel on `pool`.
    pub fn scan_with(
        &self,
        transcript: &Transcript,
        control: &ScanControl,
        pool: Option<&ThreadPool>,
    ) -> Result<ProfanityFindings, ConvoscanError> {
        let findings = match pool {
            Some(pool) => {
                debug!("Scanning {} utterance(s) for profanity on {} worker(s).", transcript.len(), pool.current_num_threads());
                let processed = AtomicUsize::new(0);
                let results: Result<Vec<Option<Finding>>, ConvoscanError> = pool.install(|| {
                    transcript
                        .utterances()
                        .par_iter()
                        .enumerate()
                        .map(|(index, utterance)| {
                            control.checkpoint(processed.load(Ordering::Relaxed))?;
                            let finding = self.scan_utterance(index, utterance);
                            processed.fetch_add(1, Ordering::Relaxed);
                            Ok(finding)
                        })
                        .collect()
                });
                results?.into_iter().flatten().collect()
            }
            None => {
                let mut findings = Vec::new();
                for (index, utterance) in transcript.iter().enumerate() {
                    control.checkpoint(index)?;
                    if let Some(finding) = self.scan_utterance(index, utterance) {
                        findings.push(finding);
                    }
                }
                findings
            }
        };
        Ok(self.finish(findings))
    }

    fn scan_utterance(&self, index: usize, utterance: &Utterance) -> Option<Finding> {
        if utterance.is_blank() {
            return None;
        }
        let role = self.vocabulary.classify(&utterance.speaker);
        if role == SpeakerRole::Unknown {
            return None;
        }

        let fragments = self.registry.find(RuleFamily::Profanity, &utterance.text);
        if fragments.is_empty() {
            return None;
        }

        let finding = Finding::new(index, utterance, role, RuleFamily::Profanity, fragments);
        log_finding_debug(module_path!(), &finding);
        Some(finding)
    }

    fn finish(&self, findings: Vec<Finding>) -> ProfanityFindings {
        info!("Profanity scan complete: {} finding(s).", findings.len());
        group_by_role(findings)
    }
}

/// Profanity scan with the default role vocabulary.
pub fn detect_profanity(registry: &PatternRegistry, transcript: &Transcript) -> ProfanityFindings {
    let vocabulary = RoleVocabulary::default();
    ProfanityScanner::new(registry, &vocabulary).scan(transcript)
}

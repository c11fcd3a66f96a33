// convoscan-core/src/finding.rs
//! Findings produced by the scanners, the verification snapshot they carry,
//! and helpers for keeping matched sensitive text out of debug logs.

use lazy_static::lazy_static;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::RuleFamily;
use crate::transcript::{SpeakerRole, Utterance};

lazy_static! {
    /// Whether matched text may appear unredacted in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("CONVOSCAN_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// Per-conversation verification state.
///
/// `verified` implies `attempted`, and once `verified` is set it stays set
/// for the rest of the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerificationState {
    pub verified: bool,
    pub attempted: bool,
}

/// The three phases of the verification state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationPhase {
    UnverifiedNoAttempt,
    UnverifiedAttempted,
    Verified,
}

impl VerificationState {
    pub fn phase(&self) -> VerificationPhase {
        match (self.verified, self.attempted) {
            (true, _) => VerificationPhase::Verified,
            (false, true) => VerificationPhase::UnverifiedAttempted,
            (false, false) => VerificationPhase::UnverifiedNoAttempt,
        }
    }

    /// Applies one utterance's verification signals. No-op once verified.
    pub fn observe(&mut self, evidence: bool, corroborated: bool) {
        if self.verified || !evidence {
            return;
        }
        self.attempted = true;
        if corroborated {
            self.verified = true;
        }
    }
}

/// A single matched span inside an utterance's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedFragment {
    pub rule_name: String,
    pub text: String,
    /// Byte offsets into the utterance text.
    pub start: usize,
    pub end: usize,
}

/// A recorded match tied to one utterance and one rule family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub utterance_index: usize,
    pub utterance: Utterance,
    pub role: SpeakerRole,
    pub family: RuleFamily,
    pub fragments: Vec<MatchedFragment>,
    /// State snapshot at the time of the match. Compliance findings only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationState>,
    /// Classifier score, when the finding came from a model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub fingerprint: String,
}

impl Finding {
    pub fn new(
        utterance_index: usize,
        utterance: &Utterance,
        role: SpeakerRole,
        family: RuleFamily,
        fragments: Vec<MatchedFragment>,
    ) -> Self {
        let fingerprint = canonical_fingerprint(family, utterance_index, &fragments);
        Self {
            utterance_index,
            utterance: utterance.clone(),
            role,
            family,
            fragments,
            verification: None,
            confidence: None,
            fingerprint,
        }
    }

    pub fn with_verification(mut self, state: VerificationState) -> Self {
        self.verification = Some(state);
        self
    }

    pub fn with_confidence(mut self, score: f64) -> Self {
        self.confidence = Some(score);
        self
    }

    pub fn matched_texts(&self) -> Vec<&str> {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }
}

pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    if s.len() <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", s.len())
    }
}

fn get_loggable_content(sensitive_content: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        sensitive_content.to_string()
    } else {
        redact_sensitive(sensitive_content)
    }
}

pub fn log_finding_debug(module_path: &str, finding: &Finding) {
    let texts: Vec<String> = finding
        .fragments
        .iter()
        .map(|f| format!("{}='{}'", f.rule_name, get_loggable_content(&f.text)))
        .collect();
    debug!(
        "{} Finding: family={}, utterance={}, role={}, fragments=[{}]",
        module_path,
        finding.family,
        finding.utterance_index,
        finding.role.as_str(),
        texts.join(", ")
    );
}

/// Stable audit fingerprint of a finding: family, utterance index and the
/// whitespace/case-normalised fragments.
pub fn canonical_fingerprint(
    family: RuleFamily,
    utterance_index: usize,
    fragments: &[MatchedFragment],
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(family.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(utterance_index.to_string().as_bytes());
    for fragment in fragments {
        let normalized = fragment
            .text
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        hasher.update(b":");
        hasher.update(fragment.rule_name.as_bytes());
        hasher.update(b"=");
        hasher.update(normalized.as_bytes());
    }
    hex::encode(hasher.finalize())
}

//! Scanners that walk a transcript and produce findings.
//!
//! * `profanity`: stateless, per utterance, attributes matches to a role.
//! * `compliance`: stateful over the whole transcript, tracks verification
//!   and records sensitive disclosures made before it succeeded.
//!
//! Both share a `PatternRegistry` and nothing else. The report types here
//! are what the engines return and what the aggregator reduces.

pub mod compliance;
pub mod profanity;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::RuleFamily;
use crate::errors::ConvoscanError;
use crate::finding::{Finding, VerificationState};
use crate::transcript::SpeakerRole;

pub use compliance::{detect_compliance_violations, ComplianceScanner};
pub use profanity::{detect_profanity, ProfanityScanner};

/// Profanity findings keyed by role, each list in conversation order.
/// Only `Agent` and `Counterparty` ever appear as keys.
pub type ProfanityFindings = BTreeMap<SpeakerRole, Vec<Finding>>;

/// A shared flag a caller can flip to stop a long scan between utterances.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-scan controls supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct ScanControl {
    pub cancel: Option<CancellationFlag>,
}

impl ScanControl {
    pub fn with_cancellation(flag: CancellationFlag) -> Self {
        Self { cancel: Some(flag) }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, CancellationFlag::is_cancelled)
    }

    /// Called between utterances. `processed` is the number already handled.
    pub fn checkpoint(&self, processed: usize) -> Result<(), ConvoscanError> {
        if self.is_cancelled() {
            Err(ConvoscanError::Cancelled { processed })
        } else {
            Ok(())
        }
    }
}

/// A classifier call that failed. The scan carries on without a finding for
/// the affected record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorFailure {
    /// `None` for conversation-level calls.
    pub utterance_index: Option<usize>,
    pub family: RuleFamily,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfanityReport {
    pub findings: ProfanityFindings,
    #[serde(default)]
    pub failures: Vec<CollaboratorFailure>,
}

impl ProfanityReport {
    pub fn for_role(&self, role: SpeakerRole) -> &[Finding] {
        self.findings.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub findings: Vec<Finding>,
    /// Verification state after the last utterance.
    pub final_state: VerificationState,
    #[serde(default)]
    pub failures: Vec<CollaboratorFailure>,
    /// Set when `max_findings` stopped further findings from being recorded.
    #[serde(default)]
    pub truncated: bool,
}

/// Groups findings by role, keeping them sorted by utterance index.
pub(crate) fn group_by_role(mut findings: Vec<Finding>) -> ProfanityFindings {
    findings.sort_by_key(|f| f.utterance_index);
    let mut grouped = ProfanityFindings::new();
    for finding in findings {
        grouped.entry(finding.role).or_default().push(finding);
    }
    grouped
}

// convoscan-core/src/aggregate.rs
//! Reduces scanner reports into the fixed-shape summary a reporting layer
//! consumes.
//!
//! `aggregate` is a pure function of its inputs: flags are presence checks
//! and finding lists are copied through unchanged, so calling it twice on the
//! same reports yields equal summaries. Run metadata (ids, timestamps) lives
//! on `ScanReport`, outside the reduction.

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::finding::{Finding, VerificationState};
use crate::scanners::{CollaboratorFailure, ComplianceReport, ProfanityFindings, ProfanityReport};
use crate::transcript::SpeakerRole;

/// The analyses a caller can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Profanity,
    Privacy,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 2] = [AnalysisKind::Profanity, AnalysisKind::Privacy];
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisKind::Profanity => write!(f, "profanity"),
            AnalysisKind::Privacy => write!(f, "privacy"),
        }
    }
}

/// Summary of one transcript scan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    pub agent_profanity: bool,
    pub counterparty_profanity: bool,
    pub privacy_violation: bool,
    /// Profanity findings per role, in conversation order.
    pub profanity: ProfanityFindings,
    /// Sensitive disclosures made before verification, in conversation order.
    pub compliance: Vec<Finding>,
    /// Verification state at the end of the compliance scan, if one ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationState>,
    #[serde(default)]
    pub failures: Vec<CollaboratorFailure>,
    #[serde(default)]
    pub truncated: bool,
}

impl ScanSummary {
    pub fn any_violation(&self) -> bool {
        self.agent_profanity || self.counterparty_profanity || self.privacy_violation
    }

    /// False when a collaborator failed or findings were capped.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && !self.truncated
    }

    pub fn finding_count(&self) -> usize {
        self.profanity.values().map(Vec::len).sum::<usize>() + self.compliance.len()
    }
}

/// Folds the reports of the analyses that ran into a `ScanSummary`.
/// A `None` report contributes no findings and `false` flags.
pub fn aggregate(profanity: Option<&ProfanityReport>, compliance: Option<&ComplianceReport>) -> ScanSummary {
    let mut summary = ScanSummary::default();

    if let Some(report) = profanity {
        summary.agent_profanity = !report.for_role(SpeakerRole::Agent).is_empty();
        summary.counterparty_profanity = !report.for_role(SpeakerRole::Counterparty).is_empty();
        summary.profanity = report.findings.clone();
        summary.failures.extend(report.failures.iter().cloned());
    }

    if let Some(report) = compliance {
        summary.privacy_violation = !report.findings.is_empty();
        summary.compliance = report.findings.clone();
        summary.verification = Some(report.final_state);
        summary.failures.extend(report.failures.iter().cloned());
        summary.truncated = report.truncated;
    }

    summary
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub run_id: Uuid,
    pub source_id: String,
    /// RFC 3339, UTC.
    pub analysis_time: String,
    pub engine: String,
    pub analyses: Vec<AnalysisKind>,
    pub utterance_count: usize,
}

impl ScanMetadata {
    pub fn new(source_id: &str, engine: &str, analyses: &[AnalysisKind], utterance_count: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            source_id: source_id.to_string(),
            analysis_time: Utc::now().to_rfc3339(),
            engine: engine.to_string(),
            analyses: analyses.to_vec(),
            utterance_count,
        }
    }
}

/// A summary plus the metadata of the run that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub metadata: ScanMetadata,
    pub summary: ScanSummary,
}

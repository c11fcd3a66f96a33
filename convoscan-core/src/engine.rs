// convoscan-core/src/engine.rs
//! Defines the `DetectionEngine` trait.
//!
//! An engine provides the two scanner operations over a transcript. The
//! rule-based `PatternEngine` and the model-backed `ClassifierEngine` are
//! interchangeable behind this trait: both return the same report and finding
//! shapes, so aggregation never needs to know which one ran.
//!
//! License: MIT OR APACHE 2.0

use crate::config::DetectionConfig;
use crate::errors::ConvoscanError;
use crate::scanners::{ComplianceReport, ProfanityReport, ScanControl};
use crate::transcript::Transcript;

pub trait DetectionEngine: Send + Sync {
    /// Short identifier used in reports and logs.
    fn name(&self) -> &'static str;

    /// Profanity findings per role, checking `control` between utterances.
    fn detect_profanity_with(
        &self,
        transcript: &Transcript,
        control: &ScanControl,
    ) -> Result<ProfanityReport, ConvoscanError>;

    /// Disclosures made before verification, checking `control` between utterances.
    fn detect_compliance_violations_with(
        &self,
        transcript: &Transcript,
        control: &ScanControl,
    ) -> Result<ComplianceReport, ConvoscanError>;

    /// Returns a reference to the engine's configuration.
    fn get_config(&self) -> &DetectionConfig;

    fn detect_profanity(&self, transcript: &Transcript) -> Result<ProfanityReport, ConvoscanError> {
        self.detect_profanity_with(transcript, &ScanControl::default())
    }

    fn detect_compliance_violations(
        &self,
        transcript: &Transcript,
    ) -> Result<ComplianceReport, ConvoscanError> {
        self.detect_compliance_violations_with(transcript, &ScanControl::default())
    }
}

// convoscan-core/src/lib.rs
//! # Convoscan Core Library
//!
//! `convoscan-core` provides the platform-independent logic for scanning
//! conversation transcripts: a registry of compiled detection rules, a
//! profanity scanner, a compliance scanner that flags sensitive disclosures
//! made before the counterparty's identity was verified, and an aggregator
//! that reduces both into a fixed-shape summary.
//!
//! The library performs no I/O of its own beyond the optional HTTP
//! classifier. Transcripts come in as JSON strings or values; summaries go
//! out as serializable structs.
//!
//! ## Modules
//!
//! * `config`: `DetectionRule`s and `DetectionConfig`, loading, merging and filtering.
//! * `registry`: Compiles rules into the read-only `PatternRegistry`.
//! * `validators`: Programmatic validation for matched SSNs and card numbers.
//! * `transcript`: `Transcript`/`Utterance` types and the JSON ingestion boundary.
//! * `finding`: `Finding`, `VerificationState` and debug-log redaction.
//! * `scanners`: The rule-based profanity and compliance scanners.
//! * `classifier`: The `TextClassifier` collaborator and its HTTP implementation.
//! * `engine`: The `DetectionEngine` trait.
//! * `engines`: `PatternEngine` and `ClassifierEngine`.
//! * `aggregate`: `aggregate`, `ScanSummary` and `ScanReport`.
//! * `headless`: One-shot and batch helpers for non-interactive use.
//!
//! ## Usage Example
//!
//! ```rust
//! use convoscan_core::{headless_scan_transcript, AnalysisKind, DetectionConfig, HeadlessEngineType};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let config = DetectionConfig::load_default_rules()?;
//!     let input = r#"[
//!         {"speaker": "Agent", "text": "What's your account number?"},
//!         {"speaker": "Agent", "text": "Your SSN on file is 123-45-6789"}
//!     ]"#;
//!
//!     let report = headless_scan_transcript(
//!         config,
//!         input,
//!         "call-0001.json",
//!         HeadlessEngineType::Pattern,
//!         &AnalysisKind::ALL,
//!     )?;
//!
//!     assert!(report.summary.privacy_violation);
//!     assert_eq!(report.summary.compliance[0].utterance_index, 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library operations return `ConvoscanError`. Only configuration and format
//! errors stop a scan; classifier failures are reported on the result.
//! File loading and the headless helpers use `anyhow::Error` with context.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod aggregate;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod finding;
pub mod headless;
pub mod registry;
pub mod scanners;
pub mod transcript;
pub mod validators;

/// Re-exports the public configuration types and functions for managing detection rules.
pub use config::{
    merge_rules,
    validate_rules,
    ClassifierConfig,
    DetectionConfig,
    DetectionRule,
    EngineConfig,
    RuleFamily,
    ScanConfig,
    MAX_PATTERN_LENGTH,
};

pub use errors::ConvoscanError;

pub use registry::compiler::{compile_rules, CompiledRule, CompiledRules};
pub use registry::PatternRegistry;

pub use transcript::{RoleVocabulary, SpeakerRole, Transcript, Utterance};

pub use finding::{redact_sensitive, Finding, MatchedFragment, VerificationPhase, VerificationState};

pub use scanners::{
    detect_compliance_violations,
    detect_profanity,
    CancellationFlag,
    CollaboratorFailure,
    ComplianceReport,
    ComplianceScanner,
    ProfanityFindings,
    ProfanityReport,
    ProfanityScanner,
    ScanControl,
};

pub use classifier::{Classification, ClassificationLabel, ClassificationTask, HttpClassifier, TextClassifier};

pub use engine::DetectionEngine;
pub use engines::classifier_engine::ClassifierEngine;
pub use engines::pattern_engine::PatternEngine;

pub use aggregate::{aggregate, AnalysisKind, ScanMetadata, ScanReport, ScanSummary};

pub use headless::{
    build_engine,
    headless_scan_transcript,
    scan_transcript,
    scan_transcripts_parallel,
    HeadlessEngineType,
};

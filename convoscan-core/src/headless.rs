// convoscan-core/src/headless.rs

//! `headless.rs`
//! Convenience wrappers for using core engines in headless mode (non-UI).
//! Provides one-shot helpers that take a transcript from JSON to a finished
//! `ScanReport`, and a batch helper that scans independent transcripts on the
//! rayon pool.

use anyhow::{Context, Result};
use log::info;
use rayon::prelude::*;

use crate::aggregate::{aggregate, AnalysisKind, ScanMetadata, ScanReport, ScanSummary};
use crate::config::DetectionConfig;
use crate::engine::DetectionEngine;
use crate::engines::classifier_engine::ClassifierEngine;
use crate::engines::pattern_engine::PatternEngine;
use crate::errors::ConvoscanError;
use crate::scanners::ScanControl;
use crate::transcript::Transcript;

/// Enum to select which detection engine to use in headless mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessEngineType {
    Pattern,
    Classifier,
}

/// Instantiates the selected engine behind the `DetectionEngine` trait.
pub fn build_engine(
    config: DetectionConfig,
    engine_type: HeadlessEngineType,
) -> Result<Box<dyn DetectionEngine>, ConvoscanError> {
    let engine: Box<dyn DetectionEngine> = match engine_type {
        HeadlessEngineType::Pattern => Box::new(PatternEngine::new(config)?),
        HeadlessEngineType::Classifier => Box::new(ClassifierEngine::from_config(config)?),
    };
    Ok(engine)
}

/// Runs the selected analyses over one transcript and aggregates the result.
pub fn scan_transcript(
    engine: &dyn DetectionEngine,
    transcript: &Transcript,
    analyses: &[AnalysisKind],
    control: &ScanControl,
) -> Result<ScanSummary, ConvoscanError> {
    let profanity = if analyses.contains(&AnalysisKind::Profanity) {
        Some(engine.detect_profanity_with(transcript, control)?)
    } else {
        None
    };
    let compliance = if analyses.contains(&AnalysisKind::Privacy) {
        Some(engine.detect_compliance_violations_with(transcript, control)?)
    } else {
        None
    };
    Ok(aggregate(profanity.as_ref(), compliance.as_ref()))
}

/// Scans a JSON transcript end to end. This function is the primary entry
/// point for non-interactive (headless) use.
///
/// # Arguments
///
/// * `config` - The merged DetectionConfig (defaults + optional user overrides).
/// * `input` - A JSON array of `{speaker, text, ...}` records.
/// * `source_id` - A stable identifier for the input (file path or pseudo id).
/// * `engine_type` - Which engine to use (`Pattern` or `Classifier`).
/// * `analyses` - Which analyses to run.
pub fn headless_scan_transcript(
    config: DetectionConfig,
    input: &str,
    source_id: &str,
    engine_type: HeadlessEngineType,
    analyses: &[AnalysisKind],
) -> Result<ScanReport> {
    let engine = build_engine(config, engine_type).context("Failed to build detection engine")?;
    let transcript = Transcript::from_json_str(input)
        .with_context(|| format!("Failed to read transcript from {}", source_id))?;

    let summary = scan_transcript(engine.as_ref(), &transcript, analyses, &ScanControl::default())
        .with_context(|| format!("Scan of {} did not complete", source_id))?;
    info!(
        "Scanned {} ({} utterance(s)): {} finding(s).",
        source_id,
        transcript.len(),
        summary.finding_count()
    );

    Ok(ScanReport {
        metadata: ScanMetadata::new(source_id, engine.name(), analyses, transcript.len()),
        summary,
    })
}

/// Scans independent transcripts concurrently on the global rayon pool.
/// Results come back in input order; each transcript gets its own
/// verification state.
pub fn scan_transcripts_parallel(
    engine: &dyn DetectionEngine,
    transcripts: &[Transcript],
    analyses: &[AnalysisKind],
) -> Vec<Result<ScanSummary, ConvoscanError>> {
    transcripts
        .par_iter()
        .map(|transcript| scan_transcript(engine, transcript, analyses, &ScanControl::default()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{SpeakerRole, Utterance};
    use anyhow::Result;

    #[test]
    fn test_headless_scan_transcript_pattern() -> Result<()> {
        let input = r#"[
            {"speaker": "Agent", "text": "What's your account number?"},
            {"speaker": "Agent", "text": "Your SSN on file is 123-45-6789"},
            {"speaker": "Borrower", "text": "What the hell"}
        ]"#;
        let config = DetectionConfig::load_default_rules()?;

        let report = headless_scan_transcript(
            config,
            input,
            "test_input",
            HeadlessEngineType::Pattern,
            &AnalysisKind::ALL,
        )?;

        assert_eq!(report.metadata.source_id, "test_input");
        assert_eq!(report.metadata.engine, "pattern");
        assert_eq!(report.metadata.utterance_count, 3);
        assert!(report.summary.privacy_violation);
        assert!(report.summary.counterparty_profanity);
        assert!(!report.summary.agent_profanity);
        assert_eq!(report.summary.compliance[0].utterance_index, 1);
        Ok(())
    }

    #[test]
    fn test_unselected_analysis_is_skipped() -> Result<()> {
        let input = r#"[{"speaker": "Agent", "text": "damn, your balance is $10"}]"#;
        let report = headless_scan_transcript(
            DetectionConfig::load_default_rules()?,
            input,
            "only_profanity",
            HeadlessEngineType::Pattern,
            &[AnalysisKind::Profanity],
        )?;
        assert!(report.summary.agent_profanity);
        assert!(!report.summary.privacy_violation);
        assert!(report.summary.verification.is_none());
        Ok(())
    }

    #[test]
    fn test_format_error_is_surfaced() {
        let result = headless_scan_transcript(
            DetectionConfig::default(),
            r#"{"speaker": "Agent"}"#,
            "bad",
            HeadlessEngineType::Pattern,
            &AnalysisKind::ALL,
        );
        let err = result.unwrap_err();
        assert!(matches!(
            err.root_cause().downcast_ref::<ConvoscanError>(),
            Some(ConvoscanError::Format(_))
        ));
    }

    #[test]
    fn test_classifier_without_endpoint_fails_fast() {
        let result = build_engine(DetectionConfig::default(), HeadlessEngineType::Classifier);
        assert!(matches!(result, Err(ConvoscanError::Configuration(_))));
    }

    #[test]
    fn test_scan_transcripts_parallel_keeps_input_order() -> Result<()> {
        let engine = PatternEngine::new(DetectionConfig::load_default_rules()?)?;
        let transcripts: Vec<Transcript> = (0..16)
            .map(|i| {
                let text = if i % 2 == 0 { "balance: $5" } else { "hello" };
                Transcript::new(vec![Utterance::new("Agent", text)])
            })
            .collect();

        let results = scan_transcripts_parallel(&engine, &transcripts, &AnalysisKind::ALL);
        assert_eq!(results.len(), 16);
        for (i, result) in results.into_iter().enumerate() {
            let summary = result?;
            assert_eq!(summary.privacy_violation, i % 2 == 0, "transcript {}", i);
            assert!(summary.profanity.get(&SpeakerRole::Agent).is_none());
        }
        Ok(())
    }
}

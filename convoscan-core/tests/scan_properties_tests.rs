// convoscan-core/tests/scan_properties_tests.rs
//! End-to-end behaviour of the pattern engine over the built-in rule set.

use anyhow::Result;
use serde_json::json;

use convoscan_core::{
    aggregate, AnalysisKind, DetectionConfig, DetectionEngine, PatternEngine, PatternRegistry, SpeakerRole,
    Transcript, Utterance,
};

fn engine() -> PatternEngine {
    PatternEngine::new(DetectionConfig::load_default_rules().unwrap()).unwrap()
}

fn agent_lines(lines: &[&str]) -> Transcript {
    Transcript::new(lines.iter().map(|l| Utterance::new("Agent", *l)).collect())
}

#[test_log::test]
fn test_ssn_disclosed_without_verification() -> Result<()> {
    let transcript = Transcript::from_value(json!([
        {"speaker": "Agent", "text": "What's your account number?"},
        {"speaker": "Agent", "text": "Your SSN on file is 123-45-6789"}
    ]))?;

    let report = engine().detect_compliance_violations(&transcript)?;
    assert_eq!(report.findings.len(), 1);
    let finding = &report.findings[0];
    assert_eq!(finding.utterance_index, 1);
    let snapshot = finding.verification.unwrap();
    assert!(!snapshot.verified);
    assert!(!snapshot.attempted);
    Ok(())
}

#[test_log::test]
fn test_order_of_verification_and_disclosure_matters() -> Result<()> {
    let engine = engine();
    let before = agent_lines(&["your balance is $300", "your DOB matches, correct"]);
    let after = agent_lines(&["your DOB matches, correct", "your balance is $300"]);

    assert_eq!(engine.detect_compliance_violations(&before)?.findings.len(), 1);
    assert_eq!(engine.detect_compliance_violations(&after)?.findings.len(), 0);
    Ok(())
}

#[test]
fn test_nothing_flagged_after_verification() -> Result<()> {
    let transcript = agent_lines(&[
        "Your balance is $40.",
        "I need to verify your identity first.",
        "Your date of birth 04/12/1985 is correct.",
        "Your balance is $40 and account number 99887766.",
        "SSN: 123-45-6789",
    ]);
    let report = engine().detect_compliance_violations(&transcript)?;

    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].utterance_index, 0);
    assert!(report.final_state.verified);
    for finding in &report.findings {
        assert!(!finding.verification.unwrap().verified);
    }
    Ok(())
}

#[test]
fn test_system_speaker_never_appears() -> Result<()> {
    let transcript = Transcript::new(vec![
        Utterance::new("system", "damn, your balance is $300"),
        Utterance::new("Agent", "hello"),
    ]);
    let engine = engine();
    let profanity = engine.detect_profanity(&transcript)?;
    let compliance = engine.detect_compliance_violations(&transcript)?;

    assert!(profanity.findings.values().flatten().all(|f| f.utterance_index != 0));
    assert!(compliance.findings.is_empty());
    Ok(())
}

#[test]
fn test_blank_text_is_silent() -> Result<()> {
    let transcript = Transcript::from_value(json!([
        {"speaker": "Agent", "text": ""},
        {"speaker": "Borrower", "text": "   \t"},
        {"speaker": "Agent"},
        "not a record"
    ]))?;
    let engine = engine();
    let summary = aggregate(
        Some(&engine.detect_profanity(&transcript)?),
        Some(&engine.detect_compliance_violations(&transcript)?),
    );
    assert!(!summary.any_violation());
    assert_eq!(summary.finding_count(), 0);
    Ok(())
}

#[test]
fn test_word_boundaries_on_profanity() -> Result<()> {
    let registry = PatternRegistry::from_rules(
        DetectionConfig::from_yaml_str(
            r#"
rules:
  - name: lexicon
    family: profanity
    terms: [ass, fucking]
"#,
        )?
        .rules,
    )?;
    assert!(registry
        .find(convoscan_core::RuleFamily::Profanity, "a class act")
        .is_empty());

    let transcript = Transcript::new(vec![Utterance::new("Borrower", "you fucking kidding")]);
    let findings = convoscan_core::detect_profanity(&registry, &transcript);
    let counterparty = &findings[&SpeakerRole::Counterparty];
    assert_eq!(counterparty.len(), 1);
    assert_eq!(counterparty[0].matched_texts(), vec!["fucking"]);
    Ok(())
}

#[test]
fn test_summary_shape_and_idempotence() -> Result<()> {
    let transcript = Transcript::new(vec![
        Utterance::new("Agent", "Sorry for the damn wait."),
        Utterance::new("Customer", "This is shit."),
        Utterance::new("Agent", "Your balance is $1,200.50"),
    ]);
    let engine = engine();
    let profanity = engine.detect_profanity(&transcript)?;
    let compliance = engine.detect_compliance_violations(&transcript)?;

    let first = aggregate(Some(&profanity), Some(&compliance));
    let second = aggregate(Some(&profanity), Some(&compliance));
    assert_eq!(first, second);
    assert!(first.agent_profanity);
    assert!(first.counterparty_profanity);
    assert!(first.privacy_violation);

    let json = serde_json::to_value(&first)?;
    assert_eq!(json["agent_profanity"], true);
    assert_eq!(json["profanity"]["agent"][0]["utterance_index"], 0);
    assert_eq!(json["compliance"][0]["verification"]["attempted"], false);
    Ok(())
}

#[test]
fn test_independent_transcripts_scan_in_parallel() -> Result<()> {
    let engine = engine();
    let transcripts = vec![
        agent_lines(&["your DOB matches, correct", "balance: $5"]),
        agent_lines(&["balance: $5", "your DOB matches, correct"]),
    ];
    let results = convoscan_core::scan_transcripts_parallel(&engine, &transcripts, &AnalysisKind::ALL);
    assert!(!results[0].as_ref().unwrap().privacy_violation);
    assert!(results[1].as_ref().unwrap().privacy_violation);
    Ok(())
}

// convoscan/src/ui/output_format.rs
//! Human-readable output: status messages on stderr and comfy-table
//! renderings of scan reports and rule sets. Colour is applied only when the
//! caller says the target supports it.

use std::io::{self, Write};

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use owo_colors::OwoColorize;

use convoscan_core::{DetectionRule, Finding, ScanReport};

fn styled_table(supports_color: bool) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    if supports_color {
        table.enforce_styling();
    } else {
        table.force_no_tty();
    }
    table
}

pub fn print_info_message<W: Write>(writer: &mut W, msg: &str, supports_color: bool) -> io::Result<()> {
    if supports_color {
        writeln!(writer, "{}", msg.cyan())
    } else {
        writeln!(writer, "{}", msg)
    }
}

pub fn print_warn_message<W: Write>(writer: &mut W, msg: &str, supports_color: bool) -> io::Result<()> {
    if supports_color {
        writeln!(writer, "{} {}", "warning:".yellow().bold(), msg)
    } else {
        writeln!(writer, "warning: {}", msg)
    }
}

pub fn print_error_message<W: Write>(writer: &mut W, msg: &str, supports_color: bool) -> io::Result<()> {
    if supports_color {
        writeln!(writer, "{} {}", "error:".red().bold(), msg)
    } else {
        writeln!(writer, "error: {}", msg)
    }
}

fn flag_cell(raised: bool) -> Cell {
    if raised {
        Cell::new("YES").fg(Color::Red)
    } else {
        Cell::new("no").fg(Color::Green)
    }
}

/// Flags table for one transcript.
pub fn summary_table(report: &ScanReport, supports_color: bool) -> Table {
    let summary = &report.summary;
    let mut table = styled_table(supports_color);
    table.set_header(vec!["Check", "Flagged", "Findings"]);
    table.add_row(vec![
        Cell::new("Agent profanity"),
        flag_cell(summary.agent_profanity),
        Cell::new(summary.profanity.get(&convoscan_core::SpeakerRole::Agent).map_or(0, Vec::len)),
    ]);
    table.add_row(vec![
        Cell::new("Counterparty profanity"),
        flag_cell(summary.counterparty_profanity),
        Cell::new(
            summary
                .profanity
                .get(&convoscan_core::SpeakerRole::Counterparty)
                .map_or(0, Vec::len),
        ),
    ]);
    table.add_row(vec![
        Cell::new("Privacy violation"),
        flag_cell(summary.privacy_violation),
        Cell::new(summary.compliance.len()),
    ]);
    table
}

fn finding_row(finding: &Finding) -> Vec<Cell> {
    let state = finding
        .verification
        .map(|v| format!("{:?}", v.phase()))
        .unwrap_or_else(|| "-".to_string());
    vec![
        Cell::new(finding.utterance_index),
        Cell::new(&finding.utterance.speaker),
        Cell::new(finding.family.as_str()),
        Cell::new(finding.matched_texts().join(", ")),
        Cell::new(state),
    ]
}

/// Every finding of one transcript in conversation order, or `None` if there are none.
pub fn findings_table(report: &ScanReport, supports_color: bool) -> Option<Table> {
    let summary = &report.summary;
    let mut findings: Vec<&Finding> = summary.profanity.values().flatten().chain(summary.compliance.iter()).collect();
    if findings.is_empty() {
        return None;
    }
    findings.sort_by_key(|f| f.utterance_index);

    let mut table = styled_table(supports_color);
    table.set_header(vec!["#", "Speaker", "Family", "Matched", "Verification"]);
    for finding in findings {
        table.add_row(finding_row(finding));
    }
    Some(table)
}

/// Writes the full human-readable report for one transcript.
pub fn print_report<W: Write>(writer: &mut W, report: &ScanReport, supports_color: bool) -> io::Result<()> {
    let title = format!(
        "{} ({} utterances, engine: {})",
        report.metadata.source_id, report.metadata.utterance_count, report.metadata.engine
    );
    if supports_color {
        writeln!(writer, "{}", title.bold())?;
    } else {
        writeln!(writer, "{}", title)?;
    }
    writeln!(writer, "{}", summary_table(report, supports_color))?;
    if let Some(table) = findings_table(report, supports_color) {
        writeln!(writer, "{}", table)?;
    }
    for failure in &report.summary.failures {
        let location = failure
            .utterance_index
            .map_or_else(|| "conversation".to_string(), |i| format!("utterance {}", i));
        print_warn_message(writer, &format!("{} ({}): {}", location, failure.family, failure.message), supports_color)?;
    }
    if report.summary.truncated {
        print_warn_message(writer, "finding limit reached; later disclosures were not recorded", supports_color)?;
    }
    Ok(())
}

/// Table of rules with their matching mode.
pub fn rules_table(rules: &[DetectionRule], supports_color: bool) -> Table {
    let mut table = styled_table(supports_color);
    table.set_header(vec!["Name", "Family", "Matching", "Severity", "Opt-in"]);
    for rule in rules {
        let matching = if rule.word_boundary { "word-bounded" } else { "substring" };
        table.add_row(vec![
            Cell::new(&rule.name),
            Cell::new(rule.family.as_str()),
            Cell::new(matching),
            Cell::new(rule.severity.as_deref().unwrap_or("-")),
            Cell::new(if rule.opt_in { "yes" } else { "no" }),
        ]);
    }
    table
}

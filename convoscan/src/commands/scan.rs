// convoscan/src/commands/scan.rs
//! `convoscan scan`: reads transcripts, runs the selected engine over them
//! and renders or exports the reports.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info};

use convoscan_core::{
    build_engine, scan_transcripts_parallel, HeadlessEngineType, ScanMetadata, ScanReport,
    Transcript,
};

use super::{info_msg, load_detection_config, warn_msg};
use crate::cli::ScanCommand;
use crate::ui::output_format;

/// What the scan found, for the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOutcome {
    pub violations: bool,
}

struct Input {
    source_id: String,
    content: String,
}

fn read_inputs(files: &[PathBuf]) -> Result<Vec<Input>> {
    if files.is_empty() {
        debug!("No input files given; reading one transcript from stdin.");
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("Failed to read transcript from stdin")?;
        return Ok(vec![Input {
            source_id: "stdin".to_string(),
            content,
        }]);
    }

    files
        .iter()
        .map(|path| {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file {}", path.display()))?;
            Ok(Input {
                source_id: path.display().to_string(),
                content,
            })
        })
        .collect()
}

pub fn run_scan(cmd: &ScanCommand, quiet: bool) -> Result<ScanOutcome> {
    let mut config = load_detection_config(cmd.config.as_deref())?;
    config.set_active_rules(&cmd.enable, &cmd.disable);
    if let Some(url) = &cmd.classifier_url {
        config.engines.classifier.endpoint = Some(url.clone());
    }
    if let Some(workers) = cmd.workers {
        config.scan.profanity_workers = Some(workers);
    }

    let analyses = cmd.analysis.kinds();
    let engine_type = HeadlessEngineType::from(cmd.engine);
    let engine = build_engine(config, engine_type).context("Failed to build detection engine")?;
    debug!(
        "Engine '{}' ready with {} active rule(s).",
        engine.name(),
        engine.get_config().rules.len()
    );

    // Inputs that are not transcripts are reported and skipped; the rest still get scanned.
    let mut parsed = Vec::new();
    let mut failed = 0usize;
    for input in read_inputs(&cmd.files)? {
        match Transcript::from_json_str(&input.content) {
            Ok(transcript) => parsed.push((input.source_id, transcript)),
            Err(e) => {
                warn_msg(format!("{}: {}", input.source_id, e));
                failed += 1;
            }
        }
    }

    let (sources, transcripts): (Vec<String>, Vec<Transcript>) = parsed.into_iter().unzip();
    info!("Scanning {} transcript(s) with the {} engine.", transcripts.len(), engine.name());
    let results = scan_transcripts_parallel(engine.as_ref(), &transcripts, &analyses);

    let mut reports = Vec::with_capacity(results.len());
    for ((source_id, transcript), result) in sources.iter().zip(&transcripts).zip(results) {
        let summary = result.with_context(|| format!("Scan of {} did not complete", source_id))?;
        reports.push(ScanReport {
            metadata: ScanMetadata::new(source_id, engine.name(), &analyses, transcript.len()),
            summary,
        });
    }

    emit_reports(cmd, &reports, quiet)?;

    if failed > 0 {
        return Err(anyhow!("{} input(s) could not be scanned", failed));
    }
    let incomplete = reports.iter().filter(|r| !r.summary.is_complete()).count();
    if incomplete > 0 {
        return Err(anyhow!(
            "{} transcript(s) were not fully scanned (classifier failures or finding limit reached)",
            incomplete
        ));
    }
    Ok(ScanOutcome {
        violations: reports.iter().any(|r| r.summary.any_violation()),
    })
}

fn emit_reports(cmd: &ScanCommand, reports: &[ScanReport], quiet: bool) -> Result<()> {
    if cmd.json_stdout {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        serde_json::to_writer_pretty(&mut writer, reports).context("Failed to write JSON reports")?;
        writeln!(writer)?;
        return Ok(());
    }

    if let Some(path) = &cmd.json_file {
        let json = serde_json::to_string_pretty(reports).context("Failed to serialize scan reports")?;
        fs::write(path, json).with_context(|| format!("Failed to write JSON file {}", path.display()))?;
        if !quiet {
            info_msg(format!("Scan reports written to {}", path.display()));
        }
        return Ok(());
    }

    let stdout = io::stdout();
    let supports_color = stdout.is_terminal();
    let mut writer = stdout.lock();
    for report in reports {
        output_format::print_report(&mut writer, report, supports_color)?;
    }
    Ok(())
}

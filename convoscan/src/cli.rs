// convoscan/src/cli.rs
//! This file defines the command-line interface (CLI) for the convoscan application,
//! including all available commands and their arguments.
//! License: MIT OR Apache-2.0

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use convoscan_core::{AnalysisKind, HeadlessEngineType};

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "convoscan",
    author = "Convoscan Team",
    version = env!("CARGO_PKG_VERSION"),
    about = "Scan conversation transcripts for profanity and pre-verification disclosures",
    long_about = "Convoscan reads call or chat transcripts (JSON arrays of {speaker, text} records) and reports profanity per speaker role, plus any sensitive information an agent disclosed before the counterparty's identity was verified.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG for the convoscan crates to DEBUG)
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `convoscan` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scans one or more transcripts and reports violations.
    #[command(about = "Scans transcript files (or stdin) for profanity and pre-verification disclosures.")]
    Scan(ScanCommand),

    /// Inspects the detection rule set.
    #[command(subcommand, about = "Lists or validates detection rules.")]
    Rules(RulesCommand),
}

/// Arguments for the `scan` command.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Transcript files to scan (reads one transcript from stdin if none are given).
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Path to a custom rules configuration file (YAML), merged over the defaults.
    #[arg(long = "config", value_name = "FILE", env = "CONVOSCAN_CONFIG", help = "Path to a custom rules configuration file (YAML).")]
    pub config: Option<PathBuf>,

    /// Explicitly enable these rule names, including opt-in rules (comma-separated).
    #[arg(long = "enable", short = 'e', value_delimiter = ',', help = "Explicitly enable these rule names (comma-separated).")]
    pub enable: Vec<String>,

    /// Explicitly disable these rule names (comma-separated).
    #[arg(long = "disable", short = 'x', value_delimiter = ',', help = "Explicitly disable these rule names (comma-separated).")]
    pub disable: Vec<String>,

    /// Which analyses to run.
    #[arg(long = "analysis", value_enum, default_value = "all", help = "Which analyses to run.")]
    pub analysis: AnalysisChoice,

    /// Select which detection engine to use.
    #[arg(long = "engine", value_enum, default_value = "pattern", help = "Select a detection engine ('pattern' or 'classifier').")]
    pub engine: EngineChoice,

    /// Endpoint of the classification service (classifier engine only).
    #[arg(long = "classifier-url", value_name = "URL", env = "CONVOSCAN_CLASSIFIER_URL", help = "Endpoint of the classification service.")]
    pub classifier_url: Option<String>,

    /// Worker threads for the profanity scan.
    #[arg(long = "workers", value_name = "N", help = "Worker threads for the profanity scan.")]
    pub workers: Option<usize>,

    /// Print scan reports as JSON to stdout (conflicts with --json-file).
    #[arg(long = "json-stdout", conflicts_with = "json_file", help = "Print the scan reports to stdout as JSON.")]
    pub json_stdout: bool,

    /// Export scan reports to a JSON file.
    #[arg(long = "json-file", value_name = "FILE", help = "Export the scan reports to a JSON file.")]
    pub json_file: Option<PathBuf>,

    /// Exit with code 1 when any transcript raises a flag.
    #[arg(long = "fail-on-violation", help = "Exit with a non-zero code if any violation is found.")]
    pub fail_on_violation: bool,
}

/// Subcommands for the `rules` command.
#[derive(Subcommand, Debug)]
pub enum RulesCommand {
    #[command(about = "Lists the active detection rules.")]
    List {
        /// Custom rules file merged over the defaults.
        #[arg(long = "config", value_name = "FILE", help = "Path to a custom rules configuration file (YAML).")]
        config: Option<PathBuf>,

        /// Opt-in rules to list as enabled (comma-separated).
        #[arg(long = "enable", short = 'e', value_delimiter = ',', help = "Explicitly enable these rule names (comma-separated).")]
        enable: Vec<String>,

        /// Rules to leave out of the listing (comma-separated).
        #[arg(long = "disable", short = 'x', value_delimiter = ',', help = "Explicitly disable these rule names (comma-separated).")]
        disable: Vec<String>,
    },
    #[command(about = "Validates a rules file and reports every problem found.")]
    Check {
        /// The rules file to validate.
        #[arg(value_name = "FILE", help = "The rules file to validate.")]
        path: PathBuf,
    },
}

/// Enum for selecting the detection engine.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum EngineChoice {
    /// The rule-based engine over the compiled pattern registry.
    Pattern,
    /// Delegates to an external classification service.
    Classifier,
}

impl From<EngineChoice> for HeadlessEngineType {
    fn from(choice: EngineChoice) -> Self {
        match choice {
            EngineChoice::Pattern => HeadlessEngineType::Pattern,
            EngineChoice::Classifier => HeadlessEngineType::Classifier,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum AnalysisChoice {
    Profanity,
    Privacy,
    All,
}

impl AnalysisChoice {
    pub fn kinds(self) -> Vec<AnalysisKind> {
        match self {
            AnalysisChoice::Profanity => vec![AnalysisKind::Profanity],
            AnalysisChoice::Privacy => vec![AnalysisKind::Privacy],
            AnalysisChoice::All => AnalysisKind::ALL.to_vec(),
        }
    }
}

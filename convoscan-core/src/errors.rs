//! errors.rs - Custom error types for the convoscan-core library.
//!
//! Only configuration and format problems stop a scan. Everything else that
//! can go wrong with a single record degrades to "no finding" and is reported
//! alongside the results instead of being raised.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// All error types surfaced by `convoscan-core`.
///
/// Marked `#[non_exhaustive]` so new variants can be added without breaking
/// downstream matches.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConvoscanError {
    #[error("Failed to compile detection rule '{0}': {1}")]
    RuleCompilationError(String, regex::Error),

    #[error("Rule '{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid transcript format: {0}")]
    Format(String),

    #[error("Classifier collaborator failed: {0}")]
    Collaborator(String),

    #[error("Scan cancelled after {processed} utterance(s)")]
    Cancelled { processed: usize },

    #[error("An unexpected I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("A fatal error occurred: {0}")]
    Fatal(String),
}

impl ConvoscanError {
    /// True for the error classes that mean the rule set itself is unusable.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ConvoscanError::RuleCompilationError(..)
                | ConvoscanError::PatternLengthExceeded(..)
                | ConvoscanError::Configuration(_)
                | ConvoscanError::Fatal(_)
        )
    }
}

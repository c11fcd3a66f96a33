// convoscan-core/src/engines/pattern_engine.rs
//! A `DetectionEngine` implementation backed by the compiled rule registry.
//! License: MIT OR APACHE 2.0

use std::sync::Arc;

use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::DetectionConfig;
use crate::engine::DetectionEngine;
use crate::errors::ConvoscanError;
use crate::registry::PatternRegistry;
use crate::scanners::{ComplianceReport, ComplianceScanner, ProfanityReport, ProfanityScanner, ScanControl};
use crate::transcript::{RoleVocabulary, Transcript};

#[derive(Debug)]
pub struct PatternEngine {
    registry: Arc<PatternRegistry>,
    config: DetectionConfig,
    vocabulary: RoleVocabulary,
    corroboration_markers: Vec<String>,
    pool: Option<ThreadPool>,
}

impl PatternEngine {
    /// Compiles the rules in `config` and builds the engine.
    pub fn new(config: DetectionConfig) -> Result<Self, ConvoscanError> {
        let registry = Arc::new(PatternRegistry::new(&config)?);
        Self::with_registry(config, registry)
    }

    /// Builds an engine over an already compiled registry, so one registry
    /// can back several engines.
    pub fn with_registry(
        config: DetectionConfig,
        registry: Arc<PatternRegistry>,
    ) -> Result<Self, ConvoscanError> {
        let pool = match config.scan.profanity_workers {
            Some(0) => {
                return Err(ConvoscanError::Configuration(
                    "`scan.profanity_workers` must be at least 1".to_string(),
                ))
            }
            Some(workers) if workers > 1 => {
                debug!("Building profanity worker pool with {} thread(s).", workers);
                let pool = ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("convoscan-profanity-{}", i))
                    .build()
                    .map_err(|e| ConvoscanError::Configuration(format!("failed to build worker pool: {}", e)))?;
                Some(pool)
            }
            _ => None,
        };

        Ok(Self {
            registry,
            vocabulary: config.scan.vocabulary(),
            corroboration_markers: config.scan.corroboration_markers(),
            config,
            pool,
        })
    }

    pub fn registry(&self) -> &Arc<PatternRegistry> {
        &self.registry
    }

    pub fn vocabulary(&self) -> &RoleVocabulary {
        &self.vocabulary
    }
}

impl DetectionEngine for PatternEngine {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn detect_profanity_with(
        &self,
        transcript: &Transcript,
        control: &ScanControl,
    ) -> Result<ProfanityReport, ConvoscanError> {
        let findings = ProfanityScanner::new(&self.registry, &self.vocabulary)
            .scan_with(transcript, control, self.pool.as_ref())?;
        Ok(ProfanityReport {
            findings,
            failures: Vec::new(),
        })
    }

    fn detect_compliance_violations_with(
        &self,
        transcript: &Transcript,
        control: &ScanControl,
    ) -> Result<ComplianceReport, ConvoscanError> {
        ComplianceScanner::new(&self.registry, &self.vocabulary, self.corroboration_markers.clone())
            .with_max_findings(self.config.scan.max_findings)
            .scan_with(transcript, control)
    }

    fn get_config(&self) -> &DetectionConfig {
        &self.config
    }
}

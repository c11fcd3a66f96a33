// convoscan-core/src/engines/mod.rs
//! Concrete `DetectionEngine` implementations.
//!
//! * `pattern_engine`: rule-based scanning over a compiled `PatternRegistry`.
//! * `classifier_engine`: delegates judgement to a `TextClassifier`.

pub mod classifier_engine;
pub mod pattern_engine;

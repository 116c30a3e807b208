//! Analysis trait abstractions
//!
//! These traits define the interface for swappable analysis backends.
//! The prediction pipeline only talks to a `KeyDetector` and a
//! `SequenceModel`, so detectors and language models can be replaced (or
//! stubbed in tests) without touching the pipeline.

use crate::types::{Key, ParsedChord};

/// A detected key together with the detector's raw score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEstimate {
    pub key: Key,
    /// Unnormalized fit score; larger is better
    pub score: f64,
}

/// Key detection backend
pub trait KeyDetector: Send + Sync {
    /// Estimate the key of a parsed chord progression
    fn detect(&self, chords: &[ParsedChord]) -> KeyEstimate;

    /// Get the name of this detector (for logging)
    fn name(&self) -> &'static str;
}

/// Next-token language model backend
pub trait SequenceModel: Send + Sync {
    /// Every vocabulary token except the start symbol with its probability of
    /// following `history`, in descending probability order
    fn predict_ranking(&self, history: &[String]) -> Vec<(String, f64)>;

    /// Get the name of this model (for logging)
    fn name(&self) -> &'static str;
}

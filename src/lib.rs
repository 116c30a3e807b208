//! chordsuggest - Next-chord suggestion from harmonic-function statistics
//!
//! Parses chord progressions, places them in a key, encodes them as roman
//! numerals and ranks the possible next chords with an interpolated
//! Kneser-Ney n-gram model, optionally filtered to a harmonic vocabulary.
//!
//! # Architecture
//!
//! The library is organized into several key modules:
//!
//! - `config`: CLI argument parsing and runtime settings
//! - `discovery`: Training corpus scanning
//! - `analysis`: Chord parsing, key detection, roman numerals, reranking
//! - `model`: The n-gram model, its JSON file format and the model provider
//! - `pipeline`: Prediction requests and corpus training
//!
//! # Example
//!
//! ```no_run
//! use chordsuggest::analysis::DiatonicKeyDetector;
//! use chordsuggest::model::ModelProvider;
//! use chordsuggest::pipeline::{PredictRequest, Predictor};
//! use std::path::Path;
//!
//! let provider = ModelProvider::from_path(Path::new("model.json")).expect("model");
//! let detector = DiatonicKeyDetector::new();
//! let predictor = Predictor::new(provider.model(), &detector);
//!
//! let response = predictor.predict(&PredictRequest::new("Dm7 G7"));
//! for item in &response.predictions {
//!     println!("{} ({}) {:.3}", item.american, item.roman, item.prob);
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod types;

// Re-export key types at crate root
pub use error::{ChordSuggestError, Result};
pub use types::{Key, Mode, ParsedChord, PitchClass, ReducedQuality};

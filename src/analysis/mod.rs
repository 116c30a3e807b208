//! Harmonic analysis modules
//!
//! Chord parsing, key detection, roman-numeral transcoding and candidate
//! reranking. Key detection and sequence modelling sit behind the traits in
//! [`traits`] so the prediction pipeline can swap backends.

pub mod chord;
pub mod key;
pub mod rerank;
pub mod roman;
pub mod traits;

pub use chord::{parse_chord, parse_sequence, split_sequence};
pub use key::{detect_key, DiatonicKeyDetector};
pub use rerank::{rerank, FilterMode, RerankParams};
pub use traits::{KeyDetector, KeyEstimate, SequenceModel};

//! Training corpus discovery

pub mod scanner;

pub use scanner::{is_corpus_file, scan, DiscoveredFile};

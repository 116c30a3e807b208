//! Sequence model, persistence and the process-wide model provider

pub mod ngram;
pub mod provider;
pub mod store;
pub mod vocab;

pub use ngram::{NGramConfig, NGramModel};
pub use provider::ModelProvider;
pub use store::{load_model, save_model};
pub use vocab::{Vocabulary, BOS, EOS, UNK};

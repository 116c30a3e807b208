//! JSON persistence for fitted models
//!
//! Only the configuration, vocabulary and raw n-gram counts are written.
//! Context totals and continuation counts are re-derived when loading.

use super::ngram::{NGramConfig, NGramModel};
use crate::error::{ChordSuggestError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{debug, info};

/// Model file schema version
const SCHEMA_VERSION: &str = "1.0";

/// Top-level model file structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelFile {
    /// Schema version for forward compatibility
    pub version: String,
    pub metadata: ModelMetadata,
    pub config: NGramConfig,
    /// Sorted vocabulary, special tokens included
    pub vocabulary: Vec<String>,
    pub ngrams: Vec<NGramEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// chordsuggest version that generated this file
    pub generator_version: String,
    /// Timestamp of the fit (RFC 3339)
    pub fitted_at: String,
    /// Number of training sequences
    pub sequence_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NGramEntry {
    pub tokens: Vec<String>,
    pub count: u64,
}

impl ModelFile {
    pub fn from_model(model: &NGramModel) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            metadata: ModelMetadata {
                generator_version: env!("CARGO_PKG_VERSION").to_string(),
                fitted_at: chrono::Utc::now().to_rfc3339(),
                sequence_count: model.sequence_count(),
            },
            config: *model.config(),
            vocabulary: model.vocabulary().tokens().to_vec(),
            ngrams: model
                .ngrams()
                .into_iter()
                .map(|(tokens, count)| NGramEntry { tokens, count })
                .collect(),
        }
    }

    pub fn into_model(self) -> Result<NGramModel> {
        if self.version != SCHEMA_VERSION {
            return Err(ChordSuggestError::InvalidModel(format!(
                "unsupported model schema version '{}' (expected '{}')",
                self.version, SCHEMA_VERSION
            )));
        }

        NGramModel::from_counts(
            self.config,
            self.vocabulary,
            self.ngrams.into_iter().map(|e| (e.tokens, e.count)),
            self.metadata.sequence_count,
        )
    }
}

/// Write a fitted model to a JSON file
///
/// Uses atomic write pattern: writes to a temp file first, then renames.
pub fn save_model(model: &NGramModel, output_path: &Path) -> Result<()> {
    // Same directory as the target so the rename stays on one filesystem
    let temp_path = output_path.with_extension("json.tmp");

    let file =
        File::create(&temp_path).map_err(|e| ChordSuggestError::output_error(output_path, e))?;
    let writer = BufWriter::new(file);

    let output = ModelFile::from_model(model);

    serde_json::to_writer_pretty(writer, &output).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        ChordSuggestError::OutputError {
            path: output_path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    std::fs::rename(&temp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        ChordSuggestError::OutputError {
            path: output_path.to_path_buf(),
            reason: format!("Failed to finalize file: {}", e),
        }
    })?;

    info!(
        "Wrote model ({} n-grams, {} tokens) to {}",
        output.ngrams.len(),
        output.vocabulary.len(),
        output_path.display()
    );

    Ok(())
}

/// Load a fitted model from a JSON file
pub fn load_model(path: &Path) -> Result<NGramModel> {
    if !path.exists() {
        return Err(ChordSuggestError::FileNotFound(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|e| ChordSuggestError::model_load(path, e.to_string()))?;
    let reader = BufReader::new(file);

    let model_file: ModelFile = serde_json::from_reader(reader)
        .map_err(|e| ChordSuggestError::model_load(path, e.to_string()))?;

    debug!(
        "Parsed model file {} (schema {}, fitted {})",
        path.display(),
        model_file.version,
        model_file.metadata.fitted_at
    );

    let model = model_file.into_model()?;

    info!(
        "Loaded {}-gram model from {} ({} sequences, {} tokens)",
        model.config().order,
        path.display(),
        model.sequence_count(),
        model.vocabulary().len()
    );

    Ok(model)
}

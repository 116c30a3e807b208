//! Unified error types for chordsuggest
//!
//! Error strategy:
//! - Harmonic analysis and prediction never fail: unparseable chords are
//!   dropped, unknown tokens become `<unk>`, unknown degrees decode to the tonic
//! - Per-file corpus errors: Recoverable, skip the file and keep training
//! - Model and output errors: Fatal, abort the command
//!
//! All errors include actionable suggestions where possible.

use std::path::PathBuf;
use thiserror::Error;

/// Corpus file extensions accepted by the trainer
pub const SUPPORTED_CORPUS_FORMATS: &str = "txt";

/// Top-level error type for chordsuggest operations
#[derive(Debug, Error)]
pub enum ChordSuggestError {
    // =========================================================================
    // Recoverable errors - skip corpus file, continue training
    // =========================================================================
    #[error("Failed to read corpus file '{path}': {reason}")]
    CorpusError { path: PathBuf, reason: String },

    #[error("Unsupported corpus file '{path}': {format}\n  Supported formats: {SUPPORTED_CORPUS_FORMATS}")]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error("File not found: '{0}'\n  Tip: Check the path exists and is accessible")]
    FileNotFound(PathBuf),

    // =========================================================================
    // Fatal errors - abort command
    // =========================================================================
    #[error("Failed to load model from '{path}': {reason}\n  Tip: Train a model with `chordsuggest train --corpus <PATH> --output <FILE>`")]
    ModelLoad { path: PathBuf, reason: String },

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    OutputError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for chordsuggest operations
pub type Result<T> = std::result::Result<T, ChordSuggestError>;

impl ChordSuggestError {
    /// Returns true if this error is recoverable (skip corpus file, continue)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ChordSuggestError::CorpusError { .. }
                | ChordSuggestError::UnsupportedFormat { .. }
                | ChordSuggestError::FileNotFound(_)
        )
    }

    /// Create a model load error
    pub fn model_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ChordSuggestError::ModelLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => {
                format!("Directory does not exist: {}", path.parent().map(|p| p.display().to_string()).unwrap_or_default())
            }
            _ => err.to_string(),
        };
        ChordSuggestError::OutputError { path, reason }
    }
}

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error about which corpus file was being read
    fn with_file_context(self, path: &std::path::Path) -> Result<T>;
}

impl<T, E: std::fmt::Display> ErrorContext<T> for std::result::Result<T, E> {
    fn with_file_context(self, path: &std::path::Path) -> Result<T> {
        self.map_err(|e| ChordSuggestError::CorpusError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_recoverable_classification() {
        let corpus = ChordSuggestError::CorpusError {
            path: PathBuf::from("a.txt"),
            reason: "bad utf-8".into(),
        };
        assert!(corpus.is_recoverable());
        assert!(!ChordSuggestError::ConfigError("order".into()).is_recoverable());
        assert!(!ChordSuggestError::model_load("m.json", "truncated").is_recoverable());
    }

    #[test]
    fn test_with_file_context() {
        let res: std::result::Result<(), String> = Err("boom".to_string());
        let err = res.with_file_context(Path::new("corpus/a.txt")).unwrap_err();
        match err {
            ChordSuggestError::CorpusError { path, reason } => {
                assert_eq!(path, PathBuf::from("corpus/a.txt"));
                assert_eq!(reason, "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_output_error_permission_message() {
        let err = ChordSuggestError::output_error(
            "/root/model.json",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(err.to_string().contains("Permission denied"));
    }
}

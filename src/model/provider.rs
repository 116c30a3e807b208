//! Model provider
//!
//! Owns the fitted model for the lifetime of the process. It is built once at
//! startup and handed to request handlers by reference; handlers that outlive
//! a borrow can take a shared `Arc` instead.

use super::ngram::NGramModel;
use super::store;
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ModelProvider {
    model: Arc<NGramModel>,
    source: Option<PathBuf>,
}

impl ModelProvider {
    /// Load the model file at `path`
    pub fn from_path(path: &Path) -> Result<Self> {
        let model = store::load_model(path)?;
        info!("Model provider ready ({})", path.display());
        Ok(Self {
            model: Arc::new(model),
            source: Some(path.to_path_buf()),
        })
    }

    /// Wrap an already fitted model
    pub fn from_model(model: NGramModel) -> Self {
        Self {
            model: Arc::new(model),
            source: None,
        }
    }

    pub fn model(&self) -> &NGramModel {
        &self.model
    }

    pub fn shared(&self) -> Arc<NGramModel> {
        Arc::clone(&self.model)
    }

    /// File the model was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NGramConfig;
    use tempfile::TempDir;

    fn model() -> NGramModel {
        NGramModel::fit(NGramConfig::default(), &[vec!["I", "V7", "I"]]).unwrap()
    }

    #[test]
    fn test_shared_handles_point_at_one_model() {
        let provider = ModelProvider::from_model(model());
        let a = provider.shared();
        let b = provider.clone().shared();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(std::ptr::eq(provider.model(), a.as_ref()));
        assert!(provider.source().is_none());
    }

    #[test]
    fn test_from_path_loads_saved_model() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kn.json");
        store::save_model(&model(), &path).unwrap();

        let provider = ModelProvider::from_path(&path).unwrap();
        assert_eq!(provider.source(), Some(path.as_path()));
        assert_eq!(provider.model().sequence_count(), 1);
    }

    #[test]
    fn test_from_path_propagates_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(ModelProvider::from_path(&dir.path().join("none.json")).is_err());
    }
}

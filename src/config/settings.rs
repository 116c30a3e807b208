//! Runtime configuration settings

use super::cli::{PredictArgs, TrainArgs};
use crate::analysis::rerank::{FilterMode, RerankParams};
use crate::error::{ChordSuggestError, Result};
use crate::model::NGramConfig;
use crate::pipeline::PredictRequest;
use crate::types::{Mode, PitchClass};
use std::path::PathBuf;

/// Runtime settings for `predict`
#[derive(Debug, Clone)]
pub struct PredictSettings {
    /// Fitted model file
    pub model_path: PathBuf,
    pub request: PredictRequest,
    /// Pretty-print the JSON response
    pub pretty: bool,
}

impl PredictSettings {
    /// Create settings from CLI arguments
    pub fn from_args(args: &PredictArgs) -> Result<Self> {
        let tonic = args
            .tonic
            .as_deref()
            .map(str::parse::<PitchClass>)
            .transpose()?;
        let mode = args.mode.as_deref().map(str::parse::<Mode>).transpose()?;

        let rerank = RerankParams {
            filter_mode: args.filter_mode.parse::<FilterMode>()?,
            alpha_repeat: args.alpha_repeat,
            rep_window: args.rep_window,
            beta_filter: args.beta_filter,
            hard_filter: !args.soft_filter,
        };
        validate_rerank(&rerank)?;

        Ok(Self {
            model_path: args.model.clone(),
            request: PredictRequest {
                sequence: args.sequence.clone(),
                k: args.k,
                tonic,
                mode,
                rerank,
            },
            pretty: args.pretty,
        })
    }
}

impl Default for PredictSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.json"),
            request: PredictRequest::default(),
            pretty: false,
        }
    }
}

fn validate_rerank(params: &RerankParams) -> Result<()> {
    if !(0.0..=1.0).contains(&params.alpha_repeat) {
        return Err(ChordSuggestError::ConfigError(format!(
            "alpha-repeat must be in [0, 1], got {}",
            params.alpha_repeat
        )));
    }
    if !(0.0..=1.0).contains(&params.beta_filter) {
        return Err(ChordSuggestError::ConfigError(format!(
            "beta-filter must be in [0, 1], got {}",
            params.beta_filter
        )));
    }
    Ok(())
}

/// Runtime settings for `train`
#[derive(Debug, Clone)]
pub struct TrainSettings {
    /// Corpus path (file or directory)
    pub corpus: PathBuf,
    /// Output model file
    pub output: PathBuf,
    /// Scan recursively
    pub recursive: bool,
    /// Corpus lines are roman tokens
    pub roman: bool,
    pub model: NGramConfig,
}

impl TrainSettings {
    /// Create settings from CLI arguments
    pub fn from_args(args: &TrainArgs) -> Result<Self> {
        let model = NGramConfig {
            order: args.order,
            discount: args.discount,
            unk_threshold: args.unk_threshold,
        };
        model.validate()?;

        Ok(Self {
            corpus: args.corpus.clone(),
            output: args.output.clone(),
            recursive: args.recursive,
            roman: args.roman,
            model,
        })
    }
}

impl Default for TrainSettings {
    fn default() -> Self {
        Self {
            corpus: PathBuf::from("."),
            output: PathBuf::from("model.json"),
            recursive: false,
            roman: false,
            model: NGramConfig::default(),
        }
    }
}

//! Request and training pipelines

pub mod predictor;
pub mod trainer;

pub use predictor::{
    top_k_next, DetectedKey, PredictRequest, PredictResponse, PredictionItem, Predictor,
};
pub use trainer::{parse_line, read_corpus, run as train, TrainSummary};

//! Next-chord prediction
//!
//! Runs one request end to end:
//! parse -> key (manual or detected) -> roman encode -> model ranking over
//! the trailing context -> rerank -> top k decoded back to chord symbols.

use crate::analysis::chord::parse_sequence;
use crate::analysis::rerank::{rerank, RerankParams};
use crate::analysis::roman::{decode_chord, encode};
use crate::analysis::traits::{KeyDetector, SequenceModel};
use crate::model::vocab::is_special;
use crate::types::{Key, Mode, PitchClass};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Number of trailing roman tokens fed to the model
pub const CONTEXT_WINDOW: usize = 3;

/// Minimum number of model candidates handed to the reranker, so filtering
/// does not starve the final top-k
pub const MIN_CANDIDATE_POOL: usize = 50;

/// One prediction request
///
/// Every field except `sequence` may be omitted from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Chord symbols, e.g. "Bm7b5 E7 Am Dm7 G7 C"
    pub sequence: String,
    /// Number of suggestions to return
    #[serde(default = "default_k")]
    pub k: usize,
    /// Manual key; only used when both tonic and mode are given
    pub tonic: Option<PitchClass>,
    pub mode: Option<Mode>,
    #[serde(flatten)]
    pub rerank: RerankParams,
}

impl PredictRequest {
    pub fn new(sequence: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            ..Self::default()
        }
    }

    fn manual_key(&self) -> Option<Key> {
        Some(Key::new(self.tonic?, self.mode?))
    }
}

fn default_k() -> usize {
    5
}

impl Default for PredictRequest {
    fn default() -> Self {
        Self {
            sequence: String::new(),
            k: default_k(),
            tonic: None,
            mode: None,
            rerank: RerankParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedKey {
    /// Flat spelling of the tonic
    pub tonic: String,
    pub mode: Mode,
    /// Detector score rounded to 3 decimals; `None` for a manual key
    pub confidence: Option<f64>,
    pub is_manual: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionItem {
    pub roman: String,
    /// Chord symbol in the request's key
    pub american: String,
    pub prob: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub input_sequence: String,
    pub parsed_chords: Vec<String>,
    pub detected_key: DetectedKey,
    pub roman_sequence: Vec<String>,
    pub context_used: Vec<String>,
    pub predictions: Vec<PredictionItem>,
}

/// Best `k` candidates after `context`, special tokens excluded
pub fn top_k_next(model: &dyn SequenceModel, context: &[String], k: usize) -> Vec<(String, f64)> {
    model
        .predict_ranking(context)
        .into_iter()
        .filter(|(token, _)| !is_special(token))
        .take(k)
        .collect()
}

/// Prediction front end over a sequence model and a key detector
pub struct Predictor<'a> {
    model: &'a dyn SequenceModel,
    detector: &'a dyn KeyDetector,
    context_window: usize,
}

impl<'a> Predictor<'a> {
    pub fn new(model: &'a dyn SequenceModel, detector: &'a dyn KeyDetector) -> Self {
        Self {
            model,
            detector,
            context_window: CONTEXT_WINDOW,
        }
    }

    pub fn with_context_window(mut self, context_window: usize) -> Self {
        self.context_window = context_window;
        self
    }

    /// Answer one request
    ///
    /// Never fails: unparseable chords are dropped, unknown tokens fall back to
    /// `<unk>`, and candidates zeroed by a hard filter are left out, so the
    /// result may hold fewer than `k` predictions.
    pub fn predict(&self, request: &PredictRequest) -> PredictResponse {
        let parsed = parse_sequence(&request.sequence);

        let (key, confidence) = match request.manual_key() {
            Some(key) => (key, None),
            None => {
                let estimate = self.detector.detect(&parsed);
                debug!(
                    "Key {} inferred by {} (score {:.3})",
                    estimate.key,
                    self.detector.name(),
                    estimate.score
                );
                (estimate.key, Some(round3(estimate.score)))
            }
        };

        let romans = encode(&parsed, key);
        let context = romans[romans.len().saturating_sub(self.context_window)..].to_vec();

        let pool = MIN_CANDIDATE_POOL.max(request.k);
        let candidates = top_k_next(self.model, &context, pool);
        let reranked = rerank(&candidates, &context, key.mode, &request.rerank);

        let predictions: Vec<PredictionItem> = reranked
            .into_iter()
            .filter(|(_, prob)| *prob > 0.0)
            .take(request.k)
            .map(|(roman, prob)| PredictionItem {
                american: decode_chord(&roman, key),
                roman,
                prob,
            })
            .collect();

        info!(
            "Predicted {} candidates for {} chords in {} ({} model)",
            predictions.len(),
            parsed.len(),
            key,
            self.model.name()
        );

        PredictResponse {
            input_sequence: request.sequence.clone(),
            parsed_chords: parsed.iter().map(ToString::to_string).collect(),
            detected_key: DetectedKey {
                tonic: key.tonic.flat_name().to_string(),
                mode: key.mode,
                confidence,
                is_manual: confidence.is_none(),
            },
            roman_sequence: romans,
            context_used: context,
            predictions,
        }
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::key::DiatonicKeyDetector;
    use crate::analysis::rerank::FilterMode;
    use crate::model::{NGramConfig, NGramModel};
    use std::sync::Mutex;

    /// Fixed ranking that records the history it was asked about
    struct StubModel {
        ranking: Vec<(String, f64)>,
        seen: Mutex<Vec<Vec<String>>>,
    }

    impl StubModel {
        fn new(ranking: &[(&str, f64)]) -> Self {
            Self {
                ranking: ranking.iter().map(|(t, p)| (t.to_string(), *p)).collect(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl SequenceModel for StubModel {
        fn predict_ranking(&self, history: &[String]) -> Vec<(String, f64)> {
            self.seen.lock().unwrap().push(history.to_vec());
            self.ranking.clone()
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    fn stub() -> StubModel {
        StubModel::new(&[
            ("V7", 0.4),
            ("<unk>", 0.2),
            ("bII", 0.2),
            ("IV", 0.1),
            ("</s>", 0.1),
        ])
    }

    #[test]
    fn test_ii_v_i_response() {
        let model = stub();
        let detector = DiatonicKeyDetector::new();
        let predictor = Predictor::new(&model, &detector);

        let response = predictor.predict(&PredictRequest::new("Dm7 G7 Cmaj7"));

        assert_eq!(response.parsed_chords, vec!["Dm7", "G7", "Cmaj7"]);
        assert_eq!(response.roman_sequence, vec!["ii", "V7", "I"]);
        assert_eq!(response.context_used, response.roman_sequence);
        assert_eq!(response.detected_key.tonic, "C");
        assert_eq!(response.detected_key.mode, Mode::Major);
        assert_eq!(response.detected_key.confidence, Some(7.5));
        assert!(!response.detected_key.is_manual);

        // V7 is in the repetition window: 0.4 * 0.75 = 0.3 of a 0.6 total
        let items: Vec<(&str, &str)> = response
            .predictions
            .iter()
            .map(|p| (p.roman.as_str(), p.american.as_str()))
            .collect();
        assert_eq!(items, vec![("V7", "G7"), ("bII", "Db"), ("IV", "F")]);
        assert!((response.predictions[0].prob - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_manual_key_and_context_window() {
        let model = stub();
        let detector = DiatonicKeyDetector::new();
        let predictor = Predictor::new(&model, &detector);

        let request = PredictRequest {
            tonic: Some(PitchClass::A),
            mode: Some(Mode::Minor),
            ..PredictRequest::new("Am F Dm E7 Am")
        };
        let response = predictor.predict(&request);

        assert!(response.detected_key.is_manual);
        assert_eq!(response.detected_key.confidence, None);
        assert_eq!(response.roman_sequence, vec!["i", "VI", "iv", "V7", "i"]);
        assert_eq!(response.context_used, vec!["iv", "V7", "i"]);
        assert_eq!(model.seen.lock().unwrap()[0], vec!["iv", "V7", "i"]);
    }

    #[test]
    fn test_tonic_without_mode_falls_back_to_detection() {
        let model = stub();
        let detector = DiatonicKeyDetector::new();
        let predictor = Predictor::new(&model, &detector);

        let request = PredictRequest {
            tonic: Some(PitchClass::A),
            ..PredictRequest::new("Dm7 G7 Cmaj7")
        };
        let response = predictor.predict(&request);
        assert!(!response.detected_key.is_manual);
        assert_eq!(response.detected_key.tonic, "C");
    }

    #[test]
    fn test_hard_filter_shortens_the_list() {
        let model = stub();
        let detector = DiatonicKeyDetector::new();
        let predictor = Predictor::new(&model, &detector);

        let mut request = PredictRequest::new("Dm7 G7 Cmaj7");
        request.rerank.filter_mode = FilterMode::Diatonic;
        let response = predictor.predict(&request);

        let romans: Vec<&str> = response.predictions.iter().map(|p| p.roman.as_str()).collect();
        assert_eq!(romans, vec!["V7", "IV"]);
        let total: f64 = response.predictions.iter().map(|p| p.prob).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_k_limits_predictions() {
        let model = stub();
        let detector = DiatonicKeyDetector::new();
        let predictor = Predictor::new(&model, &detector);

        let request = PredictRequest {
            k: 1,
            ..PredictRequest::new("Dm7 G7 Cmaj7")
        };
        assert_eq!(predictor.predict(&request).predictions.len(), 1);
    }

    #[test]
    fn test_unparseable_input_still_answers() {
        let model = stub();
        let detector = DiatonicKeyDetector::new();
        let predictor = Predictor::new(&model, &detector);

        let response = predictor.predict(&PredictRequest::new("xyz ???"));
        assert!(response.parsed_chords.is_empty());
        assert!(response.context_used.is_empty());
        assert_eq!(response.detected_key.tonic, "C");
        assert!(!response.predictions.is_empty());
    }

    #[test]
    fn test_with_fitted_model() {
        let corpus: Vec<Vec<&str>> = vec![vec!["ii", "V7", "I"]; 3];
        let model = NGramModel::fit(NGramConfig::default(), &corpus).unwrap();
        let detector = DiatonicKeyDetector::new();
        let predictor = Predictor::new(&model, &detector);

        let mut request = PredictRequest::new("Em7 A7");
        request.tonic = Some(PitchClass::D);
        request.mode = Some(Mode::Major);
        let response = predictor.predict(&request);

        assert_eq!(response.roman_sequence, vec!["ii", "V7"]);
        assert_eq!(response.predictions[0].roman, "I");
        assert_eq!(response.predictions[0].american, "D");
    }

    #[test]
    fn test_request_json_shape() {
        let request: PredictRequest = serde_json::from_str(
            r#"{"sequence": "C G", "k": 3, "tonic": null, "mode": "minor",
                "filter_mode": "functional_plus", "alpha_repeat": 0.1,
                "rep_window": 1, "beta_filter": 0.2, "hard_filter": false}"#,
        )
        .unwrap();
        assert_eq!(request.k, 3);
        assert_eq!(request.mode, Some(Mode::Minor));
        assert_eq!(request.rerank.filter_mode, FilterMode::FunctionalPlus);
        assert!(!request.rerank.hard_filter);
    }

    #[test]
    fn test_request_json_defaults_and_numeric_tonic() {
        let request: PredictRequest =
            serde_json::from_str(r#"{"sequence": "Am F", "tonic": 9, "mode": "minor"}"#)
                .unwrap();
        assert_eq!(request.tonic, Some(PitchClass::A));
        assert_eq!(request.mode, Some(Mode::Minor));
        assert_eq!(request.k, 5);
        assert_eq!(request.rerank, RerankParams::default());

        let request: PredictRequest =
            serde_json::from_str(r#"{"sequence": "Dm7 G7", "tonic": "C#", "alpha_repeat": 0.5}"#)
                .unwrap();
        assert_eq!(request.tonic, Some(PitchClass::Cs));
        assert_eq!(request.rerank.alpha_repeat, 0.5);
        assert_eq!(request.rerank.rep_window, 2);
        assert!(request.rerank.hard_filter);

        let request: PredictRequest = serde_json::from_str(r#"{"sequence": "Dm7 G7"}"#).unwrap();
        assert_eq!(request, PredictRequest::new("Dm7 G7"));

        assert!(serde_json::from_str::<PredictRequest>(r#"{"k": 3}"#).is_err());
    }
}

//! Integration tests for chordsuggest
//!
//! These tests train a model from a corpus on disk, reload it through the
//! model provider and check the prediction responses end to end.

use chordsuggest::analysis::roman::{decode, encode};
use chordsuggest::analysis::rerank::is_diatonic;
use chordsuggest::analysis::{parse_sequence, DiatonicKeyDetector, FilterMode};
use chordsuggest::config::TrainSettings;
use chordsuggest::model::{ModelProvider, NGramConfig};
use chordsuggest::pipeline::{self, PredictRequest, Predictor};
use chordsuggest::{Key, Mode, PitchClass};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write a small mixed-key corpus: pop loops, jazz cadences, minor turnarounds
fn write_corpus(dir: &Path) {
    fs::create_dir_all(dir.join("jazz")).expect("Failed to create corpus dirs");

    fs::write(
        dir.join("pop.txt"),
        "# axis progression\n\
         C major: C G Am F\n\
         G major: G D Em C\n\
         D major: D A Bm G\n\
         C major: C F G C\n\
         F major: F Bb C F\n",
    )
    .expect("Failed to write pop corpus");

    fs::write(
        dir.join("jazz").join("cadences.txt"),
        "Dm7 G7 Cmaj7\n\
         Em7 A7 Dmaj7\n\
         Gm7 C7 Fmaj7\n\
         Am7 D7 Gmaj7\n\
         Cmaj7 A7 Dm7 G7 Cmaj7\n\
         A minor: Bm7b5 E7 Am7\n\
         D minor: Em7b5 A7 Dm7\n",
    )
    .expect("Failed to write jazz corpus");
}

fn train(dir: &TempDir) -> std::path::PathBuf {
    let corpus = dir.path().join("corpus");
    write_corpus(&corpus);

    let settings = TrainSettings {
        corpus,
        output: dir.path().join("model.json"),
        recursive: true,
        roman: false,
        model: NGramConfig::default(),
    };
    let summary = pipeline::train(&settings).expect("Training should succeed");

    assert_eq!(summary.files_found, 2);
    assert_eq!(summary.sequences, 12);
    summary.output
}

#[test]
fn test_train_writes_valid_model_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train(&dir);

    let content = fs::read_to_string(&model_path).expect("Failed to read model");
    let json: serde_json::Value = serde_json::from_str(&content).expect("Model should be JSON");

    assert_eq!(json["version"], "1.0");
    assert_eq!(json["config"]["order"], 3);
    assert_eq!(json["metadata"]["sequence_count"], 12);

    let vocabulary: Vec<&str> = json["vocabulary"]
        .as_array()
        .expect("vocabulary array")
        .iter()
        .filter_map(|t| t.as_str())
        .collect();
    for token in ["<s>", "</s>", "<unk>", "I", "IV", "V7", "ii"] {
        assert!(vocabulary.contains(&token), "missing {}", token);
    }
}

#[test]
fn test_predict_after_reload() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train(&dir);

    let provider = ModelProvider::from_path(&model_path).expect("Model should load");
    let detector = DiatonicKeyDetector::new();
    let predictor = Predictor::new(provider.model(), &detector);

    let response = predictor.predict(&PredictRequest::new("Dm7 G7"));

    assert_eq!(response.parsed_chords, vec!["Dm7", "G7"]);
    assert_eq!(response.detected_key.tonic, "C");
    assert_eq!(response.roman_sequence, vec!["ii", "V7"]);
    assert_eq!(response.context_used, vec!["ii", "V7"]);

    assert!(!response.predictions.is_empty());
    assert!(response.predictions.len() <= 5);
    assert_eq!(response.predictions[0].roman, "I");
    assert_eq!(response.predictions[0].american, "C");
    assert!(response
        .predictions
        .windows(2)
        .all(|w| w[0].prob >= w[1].prob));
}

#[test]
fn test_manual_key_transposes_suggestions() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let provider = ModelProvider::from_path(&train(&dir)).expect("Model should load");
    let detector = DiatonicKeyDetector::new();
    let predictor = Predictor::new(provider.model(), &detector);

    let request = PredictRequest {
        tonic: Some(PitchClass::Ds),
        mode: Some(Mode::Major),
        ..PredictRequest::new("Fm7 Bb7")
    };
    let response = predictor.predict(&request);

    assert!(response.detected_key.is_manual);
    assert_eq!(response.detected_key.tonic, "Eb");
    assert_eq!(response.roman_sequence, vec!["ii", "V7"]);
    assert_eq!(response.predictions[0].american, "Eb");
}

#[test]
fn test_diatonic_hard_filter_end_to_end() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let provider = ModelProvider::from_path(&train(&dir)).expect("Model should load");
    let detector = DiatonicKeyDetector::new();
    let predictor = Predictor::new(provider.model(), &detector);

    let mut request = PredictRequest::new("Cmaj7 A7");
    request.k = 50;
    request.rerank.filter_mode = FilterMode::Diatonic;
    let response = predictor.predict(&request);

    let mode = response.detected_key.mode;
    assert!(!response.predictions.is_empty());
    for item in &response.predictions {
        assert!(
            is_diatonic(&item.roman, mode),
            "{} should have been filtered",
            item.roman
        );
    }
    let total: f64 = response.predictions.iter().map(|p| p.prob).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_response_serializes_to_expected_json() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let provider = ModelProvider::from_path(&train(&dir)).expect("Model should load");
    let detector = DiatonicKeyDetector::new();
    let predictor = Predictor::new(provider.model(), &detector);

    let response = predictor.predict(&PredictRequest::new("Am7 D7"));
    let json = serde_json::to_value(&response).expect("Response should serialize");

    assert_eq!(json["input_sequence"], "Am7 D7");
    assert_eq!(json["detected_key"]["mode"], "major");
    assert!(json["detected_key"]["confidence"].is_number());
    assert_eq!(json["detected_key"]["is_manual"], false);
    assert_eq!(json["detected_key"]["tonic"], "G");
    let first = &json["predictions"][0];
    assert!(first["roman"].is_string());
    assert!(first["american"].is_string());
    assert!(first["prob"].is_number());
}

#[test]
fn test_roman_round_trip_in_every_key() {
    let chords = parse_sequence("Cmaj7 Am7 Dm7 G7 Em7 Fmaj7 Bm7b5");

    for tonic in PitchClass::ALL {
        for mode in Mode::ALL {
            let key = Key::new(tonic, mode);
            let shift = tonic.to_index() as i32;
            let transposed: Vec<_> = chords
                .iter()
                .map(|c| chordsuggest::ParsedChord::new(c.root.transpose(shift), c.quality))
                .collect();

            let romans = encode(&transposed, key);
            let decoded = decode(&romans, key);
            let reparsed = parse_sequence(&decoded.join(" "));
            assert_eq!(reparsed, transposed, "round trip failed in {}", key);
        }
    }
}

#[test]
fn test_missing_model_is_reported() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let err = ModelProvider::from_path(&dir.path().join("nope.json")).unwrap_err();
    assert!(err.to_string().contains("nope.json"));
}

//! Corpus training
//!
//! Coordinates corpus discovery, line parsing, model fitting and export.
//!
//! Corpus files hold one progression per line. Blank lines and lines
//! starting with `#` are ignored. By default a line is a chord progression,
//! optionally prefixed with its key:
//!
//! ```text
//! A minor: Am7 Dm7 E7 Am7
//! Dm7 G7 Cmaj7
//! ```
//!
//! Lines without a key prefix have their key detected. With `roman` set,
//! lines are read as roman-numeral tokens and used verbatim.

use crate::analysis::chord::{parse_sequence, split_sequence};
use crate::analysis::key::detect_key;
use crate::analysis::roman::encode;
use crate::config::TrainSettings;
use crate::discovery::{self, DiscoveredFile};
use crate::error::{ChordSuggestError, ErrorContext, Result};
use crate::model::{save_model, NGramModel};
use crate::types::{Key, Mode, PitchClass};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Training result summary
#[derive(Debug, Clone, PartialEq)]
pub struct TrainSummary {
    pub files_found: usize,
    pub files_skipped: usize,
    pub sequences: usize,
    /// Non-comment lines that produced no tokens
    pub lines_skipped: usize,
    pub vocabulary_size: usize,
    pub output: PathBuf,
}

/// Sequences read from a set of corpus files
#[derive(Debug, Default)]
pub struct Corpus {
    pub sequences: Vec<Vec<String>>,
    pub files_skipped: usize,
    pub lines_skipped: usize,
}

/// Parse a `"<tonic> <mode>"` key prefix such as "Eb major" or "F# minor"
pub fn parse_key_prefix(prefix: &str) -> Option<Key> {
    let mut words = prefix.split_whitespace();
    let tonic: PitchClass = words.next()?.parse().ok()?;
    let mode: Mode = words.next()?.parse().ok()?;
    if words.next().is_some() {
        return None;
    }
    Some(Key::new(tonic, mode))
}

/// Trimmed line content, or `None` for blank lines and `#` comments
fn line_content(line: &str) -> Option<&str> {
    let line = line.trim();
    (!line.is_empty() && !line.starts_with('#')).then_some(line)
}

/// Turn one corpus line into roman tokens
///
/// Returns `None` for blank lines, comments and lines with no usable tokens.
pub fn parse_line(line: &str, roman: bool) -> Option<Vec<String>> {
    line_content(line).and_then(|content| parse_progression(content, roman))
}

fn parse_progression(line: &str, roman: bool) -> Option<Vec<String>> {
    let tokens: Vec<String> = if roman {
        split_sequence(line).into_iter().map(String::from).collect()
    } else {
        let (key, chords) = match line.split_once(':') {
            Some((prefix, rest)) => match parse_key_prefix(prefix) {
                Some(key) => (Some(key), rest),
                None => (None, line),
            },
            None => (None, line),
        };

        let parsed = parse_sequence(chords);
        if parsed.is_empty() {
            return None;
        }
        let key = key.unwrap_or_else(|| detect_key(&parsed).key);
        encode(&parsed, key)
    };

    (!tokens.is_empty()).then_some(tokens)
}

/// Read every corpus file, skipping files that cannot be read
pub fn read_corpus(files: &[DiscoveredFile], roman: bool) -> Corpus {
    let mut corpus = Corpus::default();

    for file in files {
        let text = match std::fs::read_to_string(&file.path).with_file_context(&file.path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping corpus file: {}", e);
                corpus.files_skipped += 1;
                continue;
            }
        };

        let before = corpus.sequences.len();
        for line in text.lines().filter_map(line_content) {
            match parse_progression(line, roman) {
                Some(tokens) => corpus.sequences.push(tokens),
                None => corpus.lines_skipped += 1,
            }
        }

        debug!(
            "Read {} progressions from {} ({} bytes)",
            corpus.sequences.len() - before,
            file.path.display(),
            file.size_bytes
        );
    }

    corpus
}

/// Run the full training pipeline: scan, read, fit, save
pub fn run(settings: &TrainSettings) -> Result<TrainSummary> {
    let start = Instant::now();

    info!("Scanning for corpus files...");
    let files = discovery::scan(&settings.corpus, settings.recursive)?;

    let corpus = read_corpus(&files, settings.roman);
    if corpus.sequences.is_empty() {
        return Err(ChordSuggestError::CorpusError {
            path: settings.corpus.clone(),
            reason: "no progressions found".to_string(),
        });
    }
    info!(
        "Read {} progressions from {} files ({} skipped)",
        corpus.sequences.len(),
        files.len() - corpus.files_skipped,
        corpus.files_skipped
    );

    let model = NGramModel::fit(settings.model, &corpus.sequences)?;
    save_model(&model, &settings.output)?;

    info!("Training completed in {:.2}s", start.elapsed().as_secs_f64());

    Ok(TrainSummary {
        files_found: files.len(),
        files_skipped: corpus.files_skipped,
        sequences: corpus.sequences.len(),
        lines_skipped: corpus.lines_skipped,
        vocabulary_size: model.vocabulary().len(),
        output: settings.output.clone(),
    })
}

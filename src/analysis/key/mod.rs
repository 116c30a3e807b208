//! Key detection module
//!
//! Brute-force template scoring: every one of the 24 (tonic, mode) candidates
//! is scored against the progression and the best is kept. Chords that sit on
//! a scale degree earn points according to how well their quality matches the
//! seventh chord expected on that degree; a closing V-I cadence earns a bonus.

use crate::analysis::traits::{KeyDetector, KeyEstimate};
use crate::types::{Key, Mode, ParsedChord, PitchClass, ReducedQuality};
use tracing::debug;

/// Quality matches the degree's expected seventh chord exactly
const EXACT_MATCH_SCORE: f64 = 2.0;
/// Quality is in the compatibility table for the expected chord
const COMPATIBLE_SCORE: f64 = 1.0;
/// Root is diatonic but the quality disagrees
const DIATONIC_MISMATCH_SCORE: f64 = 0.4;
/// Non-diatonic dominant seventh (likely a secondary dominant)
const CHROMATIC_DOMINANT_SCORE: f64 = 0.3;
/// Progression ends on a fifth-to-tonic root motion
const CADENCE_BONUS: f64 = 1.5;

/// Score how well a single chord fits a candidate key
pub fn chord_score(chord: &ParsedChord, key: Key) -> f64 {
    match key.degree_of(chord.root) {
        Some(degree) => {
            let expected = key.mode.expected_quality(degree);
            if chord.quality == expected {
                EXACT_MATCH_SCORE
            } else if chord.quality.is_compatible_with(expected) {
                COMPATIBLE_SCORE
            } else {
                DIATONIC_MISMATCH_SCORE
            }
        }
        None if chord.quality == ReducedQuality::Dom7 => CHROMATIC_DOMINANT_SCORE,
        None => 0.0,
    }
}

/// Total score of a progression against one candidate key
pub fn key_score(chords: &[ParsedChord], key: Key) -> f64 {
    let mut total: f64 = chords.iter().map(|chord| chord_score(chord, key)).sum();

    if let [.., penultimate, last] = chords {
        let ends_on_tonic = key.degree_of(last.root) == Some(0);
        if ends_on_tonic && penultimate.root.interval_from(key.tonic) == 7 {
            total += CADENCE_BONUS;
        }
    }

    total
}

/// Detect the most likely key of a progression
///
/// Candidates are visited tonic C..B, major before minor; only a strictly
/// greater score replaces the current best, so ties resolve to the first
/// candidate in that order. An empty progression yields C major with score 0.
pub fn detect_key(chords: &[ParsedChord]) -> KeyEstimate {
    let mut best = KeyEstimate {
        key: Key::new(PitchClass::C, Mode::Major),
        score: f64::NEG_INFINITY,
    };

    for tonic in PitchClass::ALL {
        for mode in Mode::ALL {
            let key = Key::new(tonic, mode);
            let score = key_score(chords, key);
            if score > best.score {
                best = KeyEstimate { key, score };
            }
        }
    }

    debug!(
        "Detected key {} (score {:.2}) from {} chords",
        best.key,
        best.score,
        chords.len()
    );

    best
}

/// Template-scoring key detector over parsed chord progressions
pub struct DiatonicKeyDetector;

impl DiatonicKeyDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DiatonicKeyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyDetector for DiatonicKeyDetector {
    fn detect(&self, chords: &[ParsedChord]) -> KeyEstimate {
        detect_key(chords)
    }

    fn name(&self) -> &'static str {
        "diatonic-template"
    }
}

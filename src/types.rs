//! Core data types for chordsuggest
//!
//! These types represent the harmonic domain model and flow through the
//! prediction pipeline: parsed chords, keys, and the reduced quality classes
//! the roman-numeral vocabulary is built from.

use crate::error::ChordSuggestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Musical primitives
// =============================================================================

/// Sharp spellings indexed by pitch class
pub const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Flat spellings indexed by pitch class (used for all output)
pub const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// Root spellings that fall outside both spelling tables
const ENHARMONIC_ROOTS: [(&str, &str); 4] = [("Cb", "B"), ("B#", "C"), ("Fb", "E"), ("E#", "F")];

/// Semitone offsets of the major scale degrees
pub const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Semitone offsets of the harmonic minor scale degrees
pub const HARMONIC_MINOR_SCALE: [u8; 7] = [0, 2, 3, 5, 7, 8, 11];

/// Upper-case roman numerals for scale degrees 0-6
pub const ROMAN_NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// The 12 pitch classes in Western music
///
/// Serialized as the flat spelling; deserialized from a note name or a
/// pitch-class number 0-11.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PitchClassRepr", into = "String")]
pub enum PitchClass {
    C,
    Cs, // C#/Db
    D,
    Ds, // D#/Eb
    E,
    F,
    Fs, // F#/Gb
    G,
    Gs, // G#/Ab
    A,
    As, // A#/Bb
    B,
}

impl PitchClass {
    /// All pitch classes in ascending order from C
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Convert from numeric index, wrapping modulo 12 (0 = C, 1 = C#, ..., 11 = B)
    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index % 12) as usize]
    }

    /// Convert to numeric index (0 = C, 1 = C#, ..., 11 = B)
    pub fn to_index(self) -> u8 {
        self as u8
    }

    /// Look up a root spelling such as "C", "F#", "Bb" or "Cb"
    ///
    /// Enharmonic spellings outside the sharp/flat tables are normalized first.
    /// Returns `None` for anything that is not a known spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = ENHARMONIC_ROOTS
            .iter()
            .find(|(spelling, _)| *spelling == name)
            .map(|(_, canonical)| *canonical)
            .unwrap_or(name);

        SHARP_NAMES
            .iter()
            .position(|n| *n == name)
            .or_else(|| FLAT_NAMES.iter().position(|n| *n == name))
            .map(|idx| Self::ALL[idx])
    }

    /// Flat spelling (e.g., "Db", "Bb"), used for chord symbols we emit
    pub fn flat_name(self) -> &'static str {
        FLAT_NAMES[self as usize]
    }

    /// Sharp spelling (e.g., "C#", "A#")
    pub fn sharp_name(self) -> &'static str {
        SHARP_NAMES[self as usize]
    }

    /// Move by a signed number of semitones
    pub fn transpose(self, semitones: i32) -> Self {
        let idx = (self.to_index() as i32 + semitones).rem_euclid(12);
        Self::from_index(idx as u8)
    }

    /// Ascending interval in semitones from `tonic` up to this pitch class
    pub fn interval_from(self, tonic: PitchClass) -> u8 {
        (self.to_index() + 12 - tonic.to_index()) % 12
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flat_name())
    }
}

impl FromStr for PitchClass {
    type Err = ChordSuggestError;

    /// Accepts a note name (`"Eb"`, `"f#"`) or a pitch-class number (`"0"`..`"11"`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(index) = s.parse::<u8>() {
            if index < 12 {
                return Ok(Self::from_index(index));
            }
            return Err(ChordSuggestError::InvalidKey(format!(
                "pitch class {} is out of range 0-11",
                index
            )));
        }

        let mut chars = s.chars();
        let normalized = match chars.next() {
            Some(letter) => {
                let accidental: String = chars
                    .map(|c| match c {
                        '♭' => 'b',
                        '♯' => '#',
                        other => other,
                    })
                    .collect();
                format!("{}{}", letter.to_ascii_uppercase(), accidental)
            }
            None => String::new(),
        };

        Self::from_name(&normalized)
            .ok_or_else(|| ChordSuggestError::InvalidKey(format!("unknown tonic '{}'", s)))
    }
}

/// Wire form of a pitch class
#[derive(Deserialize)]
#[serde(untagged)]
enum PitchClassRepr {
    Index(u8),
    Name(String),
}

impl TryFrom<PitchClassRepr> for PitchClass {
    type Error = ChordSuggestError;

    fn try_from(repr: PitchClassRepr) -> Result<Self, Self::Error> {
        match repr {
            PitchClassRepr::Index(index) => index.to_string().parse(),
            PitchClassRepr::Name(name) => name.parse(),
        }
    }
}

impl From<PitchClass> for String {
    fn from(pitch: PitchClass) -> Self {
        pitch.flat_name().to_string()
    }
}

/// Major or Minor key mode
///
/// Minor keys are analysed against the harmonic minor scale, so the leading
/// tone (and therefore a major-quality V) is diatonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    /// Both modes, major first (the key detector's iteration order)
    pub const ALL: [Mode; 2] = [Mode::Major, Mode::Minor];

    /// Semitone offsets of the seven scale degrees
    pub fn scale(self) -> &'static [u8; 7] {
        match self {
            Mode::Major => &MAJOR_SCALE,
            Mode::Minor => &HARMONIC_MINOR_SCALE,
        }
    }

    /// Scale degree (0-6) of an interval above the tonic, if diatonic
    pub fn degree_of(self, interval: u8) -> Option<usize> {
        self.scale().iter().position(|&iv| iv == interval % 12)
    }

    /// Seventh-chord quality built on a scale degree
    pub fn expected_quality(self, degree: usize) -> ReducedQuality {
        use ReducedQuality::*;
        const MAJOR: [ReducedQuality; 7] = [Maj7, Min7, Min7, Maj7, Dom7, Min7, HalfDim7];
        const MINOR: [ReducedQuality; 7] = [Min7, HalfDim7, Maj7, Min7, Dom7, Maj7, Dim7];
        match self {
            Mode::Major => MAJOR[degree % 7],
            Mode::Minor => MINOR[degree % 7],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Major => "major",
            Mode::Minor => "minor",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ChordSuggestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "major" | "maj" => Ok(Mode::Major),
            "minor" | "min" => Ok(Mode::Minor),
            other => Err(ChordSuggestError::InvalidKey(format!(
                "unknown mode '{}' (expected 'major' or 'minor')",
                other
            ))),
        }
    }
}

/// A tonal center: tonic pitch class plus mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    pub tonic: PitchClass,
    pub mode: Mode,
}

impl Key {
    pub fn new(tonic: PitchClass, mode: Mode) -> Self {
        Self { tonic, mode }
    }

    /// Scale degree (0-6) of a pitch class in this key, if diatonic
    pub fn degree_of(&self, pitch: PitchClass) -> Option<usize> {
        self.mode.degree_of(pitch.interval_from(self.tonic))
    }

    /// Pitch class of a scale degree (0-6)
    pub fn degree_pitch(&self, degree: usize) -> PitchClass {
        self.tonic
            .transpose(self.mode.scale()[degree % 7] as i32)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tonic, self.mode)
    }
}

// =============================================================================
// Chords
// =============================================================================

/// The five seventh-chord classes every input quality is reduced to
///
/// The reduction is lossy: sixths, extensions, suspensions and added tones
/// all collapse into one of these buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReducedQuality {
    #[serde(rename = "maj7")]
    Maj7,
    #[serde(rename = "m7")]
    Min7,
    #[serde(rename = "7")]
    Dom7,
    #[serde(rename = "m7b5")]
    HalfDim7,
    #[serde(rename = "dim7")]
    Dim7,
}

impl ReducedQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            ReducedQuality::Maj7 => "maj7",
            ReducedQuality::Min7 => "m7",
            ReducedQuality::Dom7 => "7",
            ReducedQuality::HalfDim7 => "m7b5",
            ReducedQuality::Dim7 => "dim7",
        }
    }

    /// Qualities written with a lower-case roman numeral
    pub fn is_minor_family(self) -> bool {
        matches!(
            self,
            ReducedQuality::Min7 | ReducedQuality::HalfDim7 | ReducedQuality::Dim7
        )
    }

    /// Whether this quality is an acceptable stand-in for `expected`
    ///
    /// Compatibility table: maj7~maj7, m7~{m7, m7b5}, 7~7,
    /// m7b5~{m7b5, dim7}, dim7~{dim7, m7b5}.
    pub fn is_compatible_with(self, expected: ReducedQuality) -> bool {
        use ReducedQuality::*;
        match self {
            Maj7 => expected == Maj7,
            Min7 => matches!(expected, Min7 | HalfDim7),
            Dom7 => expected == Dom7,
            HalfDim7 | Dim7 => matches!(expected, HalfDim7 | Dim7),
        }
    }
}

impl fmt::Display for ReducedQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chord reduced to its root and quality class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedChord {
    pub root: PitchClass,
    pub quality: ReducedQuality,
}

impl ParsedChord {
    pub fn new(root: PitchClass, quality: ReducedQuality) -> Self {
        Self { root, quality }
    }
}

impl fmt::Display for ParsedChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.root.flat_name(), self.quality)
    }
}

//! Roman-numeral functional notation
//!
//! Encodes parsed chords as key-relative roman numerals ("ii", "V7", "bVII",
//! "V/V", "Vsub/ii") and decodes numerals back to chord symbols.
//!
//! Encoding rules:
//! - A dominant seventh that resolves to a diatonic non-tonic degree `t` is
//!   tagged `V/<t>` when its root is a fifth above `t`, or `Vsub/<t>` when it
//!   sits a semitone above `t` (tritone substitute).
//! - Diatonic roots use the degree numeral; minor-family qualities are lower
//!   case (`ø` for m7b5, `o` for dim7), dominant sevenths append `7`.
//! - Chromatic roots use bII, bIII, #IV, bVI, bVII, plus natIII/natVI in
//!   minor keys, with the same case/suffix rule.
//! - Anything else falls back to a parenthesized semitone offset, e.g. "(4)".
//!
//! Decoding resolves unprefixed numerals against the key's own scale and
//! prefixed numerals (b, #, nat) against the major scale, which makes
//! `decode(encode(x))` exact up to the reduced quality classes.

use crate::types::{Key, Mode, ParsedChord, PitchClass, ReducedQuality, MAJOR_SCALE, ROMAN_NUMERALS};
use tracing::warn;

/// Non-diatonic intervals with a conventional numeral (either mode)
const CHROMATIC_NUMERALS: [(u8, &str); 5] = [
    (1, "bII"),
    (3, "bIII"),
    (6, "#IV"),
    (8, "bVI"),
    (10, "bVII"),
];

/// Major-mode degrees borrowed into minor keys
const MINOR_BORROWED_NUMERALS: [(u8, &str); 2] = [(4, "natIII"), (9, "natVI")];

/// Quality decorations ignored when reading a numeral's degree
const DECORATION_WORDS: [&str; 5] = ["sus", "add", "aug", "11", "13"];
const DECORATION_CHARS: [char; 8] = ['ø', '⌀', '°', 'o', '+', '7', '6', '9'];

// =============================================================================
// Encoding
// =============================================================================

/// Apply the case/suffix rule for a quality to a base numeral
fn decorate(numeral: &str, quality: ReducedQuality) -> String {
    match quality {
        ReducedQuality::Min7 => numeral.to_lowercase(),
        ReducedQuality::HalfDim7 => format!("{}ø", numeral.to_lowercase()),
        ReducedQuality::Dim7 => format!("{}o", numeral.to_lowercase()),
        ReducedQuality::Dom7 => format!("{}7", numeral),
        ReducedQuality::Maj7 => numeral.to_string(),
    }
}

fn chromatic_numeral(interval: u8, mode: Mode) -> Option<&'static str> {
    let borrowed: &[(u8, &str)] = match mode {
        Mode::Major => &[],
        Mode::Minor => &MINOR_BORROWED_NUMERALS,
    };

    CHROMATIC_NUMERALS
        .iter()
        .chain(borrowed)
        .find(|(iv, _)| *iv == interval)
        .map(|(_, numeral)| *numeral)
}

/// Tag a dominant seventh as `V/<t>` or `Vsub/<t>` when it resolves to the
/// next chord's diatonic degree `t` (never the tonic)
fn secondary_function(chord: &ParsedChord, next: &ParsedChord, key: Key) -> Option<String> {
    if chord.quality != ReducedQuality::Dom7 {
        return None;
    }

    let target = key.degree_of(next.root).filter(|&t| t != 0)?;
    let target_interval = key.mode.scale()[target];
    let interval = chord.root.interval_from(key.tonic);

    if interval == (target_interval + 7) % 12 {
        Some(format!("V/{}", ROMAN_NUMERALS[target]))
    } else if interval == (target_interval + 1) % 12 {
        Some(format!("Vsub/{}", ROMAN_NUMERALS[target]))
    } else {
        None
    }
}

/// Encode one chord without looking at its neighbours
pub fn encode_chord(chord: &ParsedChord, key: Key) -> String {
    let interval = chord.root.interval_from(key.tonic);

    if let Some(degree) = key.mode.degree_of(interval) {
        return decorate(ROMAN_NUMERALS[degree], chord.quality);
    }

    match chromatic_numeral(interval, key.mode) {
        Some(numeral) => decorate(numeral, chord.quality),
        None => format!("({})", interval),
    }
}

/// Encode a progression as roman-numeral tokens relative to `key`
pub fn encode(chords: &[ParsedChord], key: Key) -> Vec<String> {
    chords
        .iter()
        .enumerate()
        .map(|(i, chord)| {
            chords
                .get(i + 1)
                .and_then(|next| secondary_function(chord, next, key))
                .unwrap_or_else(|| encode_chord(chord, key))
        })
        .collect()
}

// =============================================================================
// Decoding
// =============================================================================

/// Where a numeral's degree is measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DegreeRef {
    /// Plain numeral: a degree of the key's own scale
    Scale(usize),
    /// Prefixed numeral (b, #, nat): a major-scale degree plus a semitone shift
    Altered { degree: usize, shift: i8 },
    /// "(n)" escape: raw semitones above the tonic
    Offset(u8),
}

impl DegreeRef {
    fn interval(self, mode: Mode) -> u8 {
        match self {
            DegreeRef::Scale(degree) => mode.scale()[degree],
            DegreeRef::Altered { degree, shift } => {
                (MAJOR_SCALE[degree] as i8 + shift).rem_euclid(12) as u8
            }
            DegreeRef::Offset(semitones) => semitones % 12,
        }
    }
}

fn parse_offset(token: &str) -> Option<u8> {
    token
        .strip_prefix('(')?
        .strip_suffix(')')?
        .trim()
        .parse()
        .ok()
}

fn strip_decorations(token: &str) -> String {
    let mut clean = token.to_string();
    for word in DECORATION_WORDS {
        clean = clean.replace(word, "");
    }
    clean.retain(|c| !DECORATION_CHARS.contains(&c));
    clean
}

/// Read the degree of a numeral such as "bVII7", "iiø", "natIII" or "(4)"
fn parse_degree(token: &str) -> Option<DegreeRef> {
    let token = token.trim();
    if let Some(offset) = parse_offset(token) {
        return Some(DegreeRef::Offset(offset));
    }

    let clean = strip_decorations(token);
    let (shift, numeral) = if let Some(rest) = clean.strip_prefix("nat") {
        (Some(0), rest)
    } else if let Some(rest) = clean.strip_prefix(&['b', '♭'][..]) {
        (Some(-1), rest)
    } else if let Some(rest) = clean.strip_prefix(&['#', '♯'][..]) {
        (Some(1), rest)
    } else {
        (None, clean.as_str())
    };

    let upper = numeral.to_uppercase();
    let degree = ROMAN_NUMERALS.iter().position(|n| *n == upper)?;

    Some(match shift {
        Some(shift) => DegreeRef::Altered { degree, shift },
        None => DegreeRef::Scale(degree),
    })
}

/// Semitones above the tonic for a key-relative numeral; unrecognized
/// numerals resolve to the tonic
fn resolve_interval(token: &str, key: Key) -> u8 {
    match parse_degree(token) {
        Some(degree) => degree.interval(key.mode),
        None => {
            warn!("Unrecognized roman numeral '{}', defaulting to the tonic", token);
            0
        }
    }
}

/// Literal interval of a secondary chord's primary numeral above its target
fn primary_interval(primary: &str) -> u8 {
    match parse_degree(primary) {
        Some(degree) => degree.interval(Mode::Major),
        None => {
            warn!("Unrecognized secondary numeral '{}', defaulting to unison", primary);
            0
        }
    }
}

fn is_tritone_substitute(primary: &str) -> bool {
    primary.to_lowercase().contains("sub")
}

/// Cased text with no upper-case letters
fn is_lowercase_numeral(text: &str) -> bool {
    text.chars().any(char::is_lowercase) && !text.chars().any(char::is_uppercase)
}

/// Chord-symbol suffix implied by a numeral's case and decorations
fn chord_suffix(numeral: &str, secondary: bool) -> &'static str {
    let minor_marked = is_lowercase_numeral(numeral) || numeral.to_lowercase().contains('m');

    if numeral.contains('ø') || numeral.contains('⌀') {
        "m7b5"
    } else if numeral.contains("o7") || numeral.contains("°7") {
        "o7"
    } else if numeral.contains('o') || numeral.contains('°') {
        "o"
    } else if secondary
        && (numeral.to_uppercase().contains('V') || is_tritone_substitute(numeral))
    {
        // secondary dominants always carry the seventh
        if minor_marked {
            "m7"
        } else {
            "7"
        }
    } else if numeral.contains('7') {
        if minor_marked {
            "m7"
        } else {
            "7"
        }
    } else if numeral.contains('+') || numeral.to_lowercase().contains("aug") {
        "+"
    } else if is_lowercase_numeral(numeral) {
        "m"
    } else {
        ""
    }
}

/// Root of a secondary chord `primary/secondary`
fn secondary_root(primary: &str, secondary: &str, key: Key) -> PitchClass {
    let target = key.tonic.transpose(resolve_interval(secondary, key) as i32);

    if is_tritone_substitute(primary) {
        // rebuild through the same degree + semitone path the encoder used
        match key.degree_of(target) {
            Some(t) => key.tonic.transpose(key.mode.scale()[t] as i32 + 1),
            None => target.transpose(1),
        }
    } else {
        target.transpose(primary_interval(primary) as i32)
    }
}

/// Decode one roman-numeral token to a chord symbol (e.g. "V7" in C -> "G7")
pub fn decode_chord(token: &str, key: Key) -> String {
    let token = token.trim();

    let (root, suffix) = match token.split_once('/') {
        Some((primary, secondary)) => (
            secondary_root(primary, secondary, key),
            chord_suffix(primary, true),
        ),
        None => (
            key.tonic.transpose(resolve_interval(token, key) as i32),
            chord_suffix(token, false),
        ),
    };

    format!("{}{}", root.flat_name(), suffix)
}

/// Decode a roman-numeral progression to chord symbols relative to `key`
pub fn decode<S: AsRef<str>>(tokens: &[S], key: Key) -> Vec<String> {
    tokens
        .iter()
        .map(|token| decode_chord(token.as_ref(), key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::chord::{parse_chord, parse_sequence};

    fn c_major() -> Key {
        Key::new(PitchClass::C, Mode::Major)
    }

    fn a_minor() -> Key {
        Key::new(PitchClass::A, Mode::Minor)
    }

    const QUALITIES: [ReducedQuality; 5] = [
        ReducedQuality::Maj7,
        ReducedQuality::Min7,
        ReducedQuality::Dom7,
        ReducedQuality::HalfDim7,
        ReducedQuality::Dim7,
    ];

    #[test]
    fn test_encode_ii_v_i() {
        let chords = parse_sequence("Dm7 G7 Cmaj7");
        assert_eq!(encode(&chords, c_major()), vec!["ii", "V7", "I"]);
    }

    #[test]
    fn test_encode_quality_markers() {
        let chords = parse_sequence("Bm7b5 Bdim7 Fmaj7 Em7");
        assert_eq!(encode(&chords, c_major()), vec!["viiø", "viio", "IV", "iii"]);

        let chords = parse_sequence("Am Bm7b5 C E7 G#dim7");
        assert_eq!(encode(&chords, a_minor()), vec!["i", "iiø", "III", "V7", "viio"]);
    }

    #[test]
    fn test_encode_chromatic_numerals() {
        let chords = parse_sequence("Db Eb7 F#m7 Ab Bb7");
        assert_eq!(
            encode(&chords, c_major()),
            vec!["bII", "bIII7", "#iv", "bVI", "bVII7"]
        );

        // borrowed major-mode degrees in minor
        let chords = parse_sequence("C#m F# G");
        assert_eq!(encode(&chords, a_minor()), vec!["natiii", "natVI", "bVII"]);
    }

    #[test]
    fn test_encode_secondary_dominants() {
        // A7 -> Dm7: V of ii
        let chords = parse_sequence("A7 Dm7 G7 C");
        assert_eq!(encode(&chords, c_major()), vec!["V/II", "ii", "V7", "I"]);

        // Eb7 -> Dm7: tritone substitute of A7
        let chords = parse_sequence("Eb7 Dm7");
        assert_eq!(encode(&chords, c_major()), vec!["Vsub/II", "ii"]);

        // D7 -> G7: V of V (the target itself is a dominant)
        let chords = parse_sequence("D7 G7 C");
        assert_eq!(encode(&chords, c_major()), vec!["V/V", "V7", "I"]);
    }

    #[test]
    fn test_no_secondary_tag_into_tonic_or_without_lookahead() {
        // G7 -> C is the primary dominant, not V/I
        let chords = parse_sequence("G7 C");
        assert_eq!(encode(&chords, c_major()), vec!["V7", "I"]);

        // Db7 -> C would be Vsub/I, which is never tagged
        let chords = parse_sequence("Db7 C");
        assert_eq!(encode(&chords, c_major()), vec!["bII7", "I"]);

        // last chord has no lookahead
        let chords = parse_sequence("C A7");
        assert_eq!(encode(&chords, c_major()), vec!["I", "VI7"]);
    }

    #[test]
    fn test_decode_basic_tokens() {
        let decoded = decode(&["ii", "V7", "I", "viiø", "viio", "bVII7", "#iv"], c_major());
        assert_eq!(decoded, vec!["Dm", "G7", "C", "Bm7b5", "Bo", "Bb7", "Gbm"]);
    }

    #[test]
    fn test_decode_suffix_precedence() {
        let key = c_major();
        assert_eq!(decode_chord("viio7", key), "Bo7");
        assert_eq!(decode_chord("vii°", key), "Bo");
        assert_eq!(decode_chord("ii7", key), "Dm7");
        assert_eq!(decode_chord("III+", key), "E+");
        assert_eq!(decode_chord("Vsus", key), "G");
    }

    #[test]
    fn test_decode_minor_key_uses_minor_scale() {
        let decoded = decode(&["i", "III", "VI", "V7", "bVII", "natVI"], a_minor());
        assert_eq!(decoded, vec!["Am", "C", "F", "E7", "G", "Gb"]);
    }

    #[test]
    fn test_decode_secondaries() {
        let key = c_major();
        assert_eq!(decode_chord("V/II", key), "A7");
        assert_eq!(decode_chord("V/V", key), "D7");
        assert_eq!(decode_chord("Vsub/II", key), "Eb7");
        assert_eq!(decode_chord("Vsub/V", key), "Ab7");
        // non-dominant primary relative to its target
        assert_eq!(decode_chord("ii/V", key), "Am");
    }

    #[test]
    fn test_decode_offset_escape_and_unknown_degree() {
        assert_eq!(decode_chord("(4)", c_major()), "E");
        // unknown numerals fall back to the tonic
        assert_eq!(decode_chord("XIV", c_major()), "C");
        assert_eq!(decode_chord("", a_minor()), "A");
    }

    #[test]
    fn test_round_trip_every_chord_in_every_key() {
        for tonic in PitchClass::ALL {
            for mode in Mode::ALL {
                let key = Key::new(tonic, mode);
                for root in PitchClass::ALL {
                    for quality in QUALITIES {
                        let chord = ParsedChord::new(root, quality);
                        let token = encode_chord(&chord, key);
                        let symbol = decode_chord(&token, key);
                        let back = parse_chord(&symbol)
                            .unwrap_or_else(|| panic!("'{}' should parse", symbol));
                        assert_eq!(back, chord, "{} in {} -> {} -> {}", chord, key, token, symbol);
                    }
                }
            }
        }
    }

    #[test]
    fn test_round_trip_diatonic_sequence() {
        let key = c_major();
        let chords = parse_sequence("Cmaj7 Am7 Dm7 G7 Em7 Fmaj7 Bm7b5 Cmaj7");
        let tokens = encode(&chords, key);
        let decoded: Vec<_> = decode(&tokens, key)
            .iter()
            .filter_map(|s| parse_chord(s))
            .collect();
        assert_eq!(decoded, chords);
    }

    #[test]
    fn test_secondary_round_trip_every_key() {
        for tonic in PitchClass::ALL {
            for mode in Mode::ALL {
                let key = Key::new(tonic, mode);
                for target in 1..7 {
                    let target_root = key.degree_pitch(target);
                    let resolution = ParsedChord::new(target_root, key.mode.expected_quality(target));

                    for (offset, tag) in [(7, "V/"), (1, "Vsub/")] {
                        let dominant = ParsedChord::new(target_root.transpose(offset), ReducedQuality::Dom7);
                        let tokens = encode(&[dominant, resolution], key);
                        assert!(tokens[0].starts_with(tag), "{} in {}: {:?}", dominant, key, tokens);

                        let back = parse_chord(&decode_chord(&tokens[0], key));
                        assert_eq!(back, Some(dominant), "{} in {}", tokens[0], key);
                    }
                }
            }
        }
    }
}

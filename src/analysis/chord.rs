//! Chord symbol parsing
//!
//! Turns free-text chord symbols ("Dm7", "Bb13", "F#ø", "Csus4") into a root
//! pitch class plus one of the five reduced quality classes. A token is
//! decomposed as `root letter`, optional `accidental`, optional `quality
//! alias`, and an arbitrary remainder that is only consulted when no alias
//! matched.
//!
//! Quality aliases go through two fixed tables: alias -> canonical quality,
//! then canonical quality -> reduced class.

use crate::types::{ParsedChord, PitchClass, ReducedQuality};
use tracing::debug;

/// Intermediate quality vocabulary between raw aliases and reduced classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CanonicalQuality {
    Maj7,
    Maj,
    Min,
    Min7,
    MinMaj7,
    Dim,
    Dim7,
    Aug,
    Dom7,
    HalfDim7,
    Sus,
}

impl CanonicalQuality {
    fn reduce(self) -> ReducedQuality {
        match self {
            CanonicalQuality::Maj7 | CanonicalQuality::Maj => ReducedQuality::Maj7,
            CanonicalQuality::Min | CanonicalQuality::Min7 | CanonicalQuality::MinMaj7 => {
                ReducedQuality::Min7
            }
            CanonicalQuality::Dom7 | CanonicalQuality::Aug | CanonicalQuality::Sus => {
                ReducedQuality::Dom7
            }
            CanonicalQuality::HalfDim7 => ReducedQuality::HalfDim7,
            CanonicalQuality::Dim | CanonicalQuality::Dim7 => ReducedQuality::Dim7,
        }
    }
}

/// Quality aliases in match priority order: the first alias that prefixes the
/// text after the root wins, so "m" shadows "min" and "6" shadows "69".
const QUALITY_ALIASES: &[(&str, CanonicalQuality)] = &[
    ("maj7", CanonicalQuality::Maj7),
    ("maj", CanonicalQuality::Maj),
    ("M7", CanonicalQuality::Maj7),
    ("M", CanonicalQuality::Maj),
    ("Δ", CanonicalQuality::Maj7),
    ("dim7", CanonicalQuality::Dim7),
    ("dim", CanonicalQuality::Dim),
    ("m7b5", CanonicalQuality::HalfDim7),
    ("ø", CanonicalQuality::HalfDim7),
    ("o7", CanonicalQuality::Dim7),
    ("o", CanonicalQuality::Dim),
    ("mMaj7", CanonicalQuality::MinMaj7),
    ("mM7", CanonicalQuality::MinMaj7),
    ("m7", CanonicalQuality::Min7),
    ("m", CanonicalQuality::Min),
    ("min", CanonicalQuality::Min),
    ("aug", CanonicalQuality::Aug),
    ("+", CanonicalQuality::Aug),
    ("7", CanonicalQuality::Dom7),
    ("9", CanonicalQuality::Dom7),
    ("11", CanonicalQuality::Dom7),
    ("13", CanonicalQuality::Dom7),
    ("6", CanonicalQuality::Maj),
    ("69", CanonicalQuality::Maj),
    ("sus2", CanonicalQuality::Sus),
    ("sus4", CanonicalQuality::Sus),
    ("sus", CanonicalQuality::Sus),
    ("add9", CanonicalQuality::Maj),
];

/// Structural decomposition of a chord token
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChordParts<'a> {
    root: char,
    accidental: Option<char>,
    alias: Option<CanonicalQuality>,
    remainder: &'a str,
}

/// Split a token into root, accidental, quality alias and remainder
fn tokenize(token: &str) -> Option<ChordParts<'_>> {
    let mut chars = token.chars();
    let root = chars.next().filter(|c| matches!(*c, 'A'..='G' | 'a'..='g'))?;
    let mut rest = chars.as_str();

    let accidental = match rest.chars().next() {
        Some(c @ ('#' | 'b' | '♭' | '♯')) => {
            rest = &rest[c.len_utf8()..];
            Some(if c == '♭' { 'b' } else if c == '♯' { '#' } else { c })
        }
        _ => None,
    };

    rest = rest.trim_start();

    let alias = QUALITY_ALIASES
        .iter()
        .find(|(alias, _)| rest.starts_with(alias))
        .map(|(alias, quality)| {
            rest = &rest[alias.len()..];
            *quality
        });

    Some(ChordParts {
        root: root.to_ascii_uppercase(),
        accidental,
        alias,
        remainder: rest.trim_end(),
    })
}

/// Parse a single chord symbol
///
/// Returns `None` for empty tokens, tokens that don't start with a note
/// letter, and unknown root spellings. When no quality alias is present the
/// triad quality is inferred from the remainder: an "m" without "maj" means
/// minor, anything else major.
pub fn parse_chord(token: &str) -> Option<ParsedChord> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let parts = tokenize(token)?;

    let mut root_name = String::with_capacity(2);
    root_name.push(parts.root);
    if let Some(acc) = parts.accidental {
        root_name.push(acc);
    }
    let root = PitchClass::from_name(&root_name)?;

    let quality = parts.alias.unwrap_or_else(|| {
        let remainder = parts.remainder.to_lowercase();
        if remainder.contains('m') && !remainder.contains("maj") {
            CanonicalQuality::Min
        } else {
            CanonicalQuality::Maj
        }
    });

    Some(ParsedChord::new(root, quality.reduce()))
}

/// Split raw text into chord tokens on runs of whitespace, commas,
/// semicolons and pipes
pub fn split_sequence(raw: &str) -> Vec<&str> {
    raw.split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '|'))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Parse a whole progression, silently dropping tokens that don't parse
///
/// The result may be shorter than the number of input tokens.
pub fn parse_sequence(raw: &str) -> Vec<ParsedChord> {
    split_sequence(raw)
        .into_iter()
        .filter_map(|token| {
            let parsed = parse_chord(token);
            if parsed.is_none() {
                debug!("Dropping unparseable chord token '{}'", token);
            }
            parsed
        })
        .collect()
}

//! Candidate reranking
//!
//! Post-processes the language model's ranked candidates: tokens that were
//! just played are damped, tokens outside the requested harmonic vocabulary
//! are removed (hard filter) or attenuated (soft filter), and the surviving
//! scores are renormalized into a distribution.

use crate::error::ChordSuggestError;
use crate::types::Mode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Diatonic roman tokens of a major key
const DEGREES_MAJOR: [&str; 9] = ["I", "ii", "iii", "IV", "V", "V7", "vi", "viio", "viiø"];

/// Diatonic roman tokens of a minor key
const DEGREES_MINOR: [&str; 10] = ["i", "iiø", "III", "iv", "v", "V", "V7", "VI", "vii", "viio"];

/// Natural-minor subtonic, admitted as diatonic in minor keys
const BVII_MINOR: [&str; 2] = ["bVII", "bVII7"];

/// Which candidates the reranker admits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Everything is admissible
    #[default]
    Free,
    /// Only the key's diatonic degrees
    Diatonic,
    /// Diatonic degrees plus secondary dominants and tritone substitutes
    FunctionalPlus,
}

impl FilterMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterMode::Free => "free",
            FilterMode::Diatonic => "diatonic",
            FilterMode::FunctionalPlus => "functional_plus",
        }
    }

    /// Whether `token` passes this filter in `mode`
    pub fn admits(self, token: &str, mode: Mode) -> bool {
        match self {
            FilterMode::Free => true,
            FilterMode::Diatonic => is_diatonic(token, mode),
            FilterMode::FunctionalPlus => allow_in_functional_plus(token, mode),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = ChordSuggestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "free" => Ok(FilterMode::Free),
            "diatonic" => Ok(FilterMode::Diatonic),
            "functional_plus" => Ok(FilterMode::FunctionalPlus),
            other => Err(ChordSuggestError::ConfigError(format!(
                "unknown filter mode '{}' (expected free, diatonic or functional_plus)",
                other
            ))),
        }
    }
}

/// Reranking knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankParams {
    pub filter_mode: FilterMode,
    /// Damping factor for recently played tokens, in [0, 1]
    pub alpha_repeat: f64,
    /// How many trailing context tokens count as "recent"
    pub rep_window: usize,
    /// Multiplier for inadmissible tokens when the filter is soft
    pub beta_filter: f64,
    /// Zero out inadmissible tokens instead of attenuating them
    pub hard_filter: bool,
}

impl Default for RerankParams {
    fn default() -> Self {
        Self {
            filter_mode: FilterMode::Free,
            alpha_repeat: 0.25,
            rep_window: 2,
            beta_filter: 0.15,
            hard_filter: true,
        }
    }
}

fn has_accidental(token: &str) -> bool {
    token.starts_with('b') || token.starts_with('#')
}

/// `V/x` and `Vsub/x` tokens
fn is_secondary(token: &str) -> bool {
    let token = token.trim();
    token.starts_with("V/") || token.starts_with("Vsub/")
}

/// Whether a roman token belongs to the diatonic vocabulary of `mode`
///
/// Tokens with a chromatic prefix or a secondary slash are never diatonic,
/// except bVII/bVII7 in minor keys.
pub fn is_diatonic(token: &str, mode: Mode) -> bool {
    if mode == Mode::Minor && BVII_MINOR.contains(&token) {
        return true;
    }

    if has_accidental(token) || token.contains('/') {
        return false;
    }

    match mode {
        Mode::Major => DEGREES_MAJOR.contains(&token),
        Mode::Minor => DEGREES_MINOR.contains(&token),
    }
}

/// Diatonic tokens plus secondary dominants and tritone substitutes
pub fn allow_in_functional_plus(token: &str, mode: Mode) -> bool {
    is_diatonic(token, mode) || is_secondary(token)
}

/// Damp, filter and renormalize a ranked candidate list
///
/// The output has the same tokens as the input, sorted by descending score
/// (stable, so equal scores keep their incoming order). Scores sum to 1 unless
/// every candidate was zeroed, in which case the zeros are returned as-is.
pub fn rerank(
    candidates: &[(String, f64)],
    recent_context: &[String],
    mode: Mode,
    params: &RerankParams,
) -> Vec<(String, f64)> {
    let window_start = recent_context.len().saturating_sub(params.rep_window);
    let recent = &recent_context[window_start..];

    let mut scored: Vec<(String, f64)> = candidates
        .iter()
        .map(|(token, prob)| {
            let mut score = *prob;

            if params.alpha_repeat > 0.0 && recent.iter().any(|t| t == token) {
                score *= 1.0 - params.alpha_repeat;
            }

            if !params.filter_mode.admits(token, mode) {
                score = if params.hard_filter {
                    0.0
                } else {
                    score * params.beta_filter
                };
            }

            (token.clone(), score.max(0.0))
        })
        .collect();

    let total: f64 = scored.iter().map(|(_, s)| s).sum();
    if total > 0.0 {
        for (_, score) in scored.iter_mut() {
            *score /= total;
        }
    }

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored
}

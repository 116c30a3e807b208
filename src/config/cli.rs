//! CLI argument parsing and configuration

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// chordsuggest - next-chord suggestions from a harmonic language model
///
/// Encodes a chord progression as key-relative roman numerals, ranks the
/// possible continuations with a Kneser-Ney n-gram model, and decodes the
/// best ones back to chord symbols.
#[derive(Parser, Debug)]
#[command(name = "chordsuggest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, default_value = "false", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Suggest the next chord of a progression
    Predict(PredictArgs),
    /// Fit a model on a corpus of progressions
    Train(TrainArgs),
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Chord progression, e.g. "Bm7b5 E7 Am Dm7 G7 C"
    #[arg(value_name = "SEQUENCE")]
    pub sequence: String,

    /// Fitted model file
    #[arg(short, long, value_name = "FILE", env = "CHORDSUGGEST_MODEL_PATH")]
    pub model: PathBuf,

    /// Number of suggestions to return
    #[arg(short, value_name = "N", default_value_t = 5)]
    pub k: usize,

    /// Tonic as a note name (C, Eb, F#) or pitch class 0-11; needs --mode
    #[arg(long, value_name = "NOTE")]
    pub tonic: Option<String>,

    /// Key mode; needs --tonic
    #[arg(long, value_parser = ["major", "minor"])]
    pub mode: Option<String>,

    /// Which suggestions are admissible
    #[arg(long, default_value = "free")]
    #[arg(value_parser = ["free", "diatonic", "functional_plus"])]
    pub filter_mode: String,

    /// Damping for chords just played, 0-1
    #[arg(long, value_name = "F", default_value_t = 0.25)]
    pub alpha_repeat: f64,

    /// How many trailing chords count as just played
    #[arg(long, value_name = "N", default_value_t = 2)]
    pub rep_window: usize,

    /// Weight kept by inadmissible chords with --soft-filter, 0-1
    #[arg(long, value_name = "F", default_value_t = 0.15)]
    pub beta_filter: f64,

    /// Attenuate inadmissible chords instead of removing them
    #[arg(long, default_value = "false")]
    pub soft_filter: bool,

    /// Pretty-print the JSON response
    #[arg(long, default_value = "false")]
    pub pretty: bool,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Corpus path (.txt file or directory)
    #[arg(short, long, value_name = "PATH")]
    pub corpus: PathBuf,

    /// Output model file
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// N-gram order
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub order: usize,

    /// Kneser-Ney absolute discount, strictly between 0 and 1
    #[arg(long, value_name = "D", default_value_t = 0.75)]
    pub discount: f64,

    /// Tokens seen this many times or fewer become <unk>
    #[arg(long, value_name = "T", default_value_t = 1)]
    pub unk_threshold: u64,

    /// Corpus lines are roman-numeral tokens instead of chord symbols
    #[arg(long, default_value = "false")]
    pub roman: bool,

    /// Scan subdirectories recursively
    #[arg(short, long, default_value = "false")]
    pub recursive: bool,
}

//! chordsuggest CLI entry point

use chordsuggest::analysis::DiatonicKeyDetector;
use chordsuggest::config::cli::{PredictArgs, TrainArgs};
use chordsuggest::config::{Cli, Command, PredictSettings, TrainSettings};
use chordsuggest::model::ModelProvider;
use chordsuggest::pipeline::{self, Predictor};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&cli);

    let outcome = match &cli.command {
        Command::Predict(args) => run_predict(args),
        Command::Train(args) => run_train(args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = if cli.quiet { "error" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_predict(args: &PredictArgs) -> chordsuggest::Result<()> {
    let settings = PredictSettings::from_args(args)?;

    let provider = ModelProvider::from_path(&settings.model_path)?;
    let detector = DiatonicKeyDetector::new();
    let predictor = Predictor::new(provider.model(), &detector);

    let response = predictor.predict(&settings.request);

    let json = if settings.pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }?;

    println!("{}", json);
    Ok(())
}

fn run_train(args: &TrainArgs) -> chordsuggest::Result<()> {
    let settings = TrainSettings::from_args(args)?;

    let summary = pipeline::train(&settings)?;

    println!(
        "Summary: {} progressions from {} files ({} skipped, {} unusable lines), {} tokens in vocabulary",
        summary.sequences,
        summary.files_found - summary.files_skipped,
        summary.files_skipped,
        summary.lines_skipped,
        summary.vocabulary_size
    );
    println!("Model written to {}", summary.output.display());

    Ok(())
}

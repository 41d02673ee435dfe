use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use deploy_medic::cli::{Cli, Commands};
use deploy_medic::config::MedicConfig;
use deploy_medic::episode::{EpisodeSimulator, SeededOutcomeSource};
use deploy_medic::error::Result;
use deploy_medic::{
    ErrorClassifier, ErrorSignature, RecoveryContext, RecoveryPolicy, RewardEvaluator,
    StateEncoder,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("deploy_medic=debug")
    } else {
        EnvFilter::new("deploy_medic=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => MedicConfig::load(path)?,
        None => MedicConfig::default(),
    };

    match cli.command {
        Commands::Classify { logs } => {
            let logs = match logs {
                Some(text) => text,
                None => read_stdin()?,
            };
            let classifier = ErrorClassifier::new(config.classifier);
            match classifier.classify_from_text(&logs) {
                Some(classification) => print_json(&classification)?,
                None => println!("null"),
            }
        }
        Commands::Decide { payload } => {
            let (signature, context) = read_payload(payload.as_deref())?;
            let policy = RecoveryPolicy::new(config.policy);
            let decision = policy.decide_from_signature(&signature, &context);
            print_json(&decision)?;
        }
        Commands::Simulate { payload, seed } => {
            let (signature, context) = read_payload(payload.as_deref())?;
            let simulator = EpisodeSimulator::new(
                StateEncoder::new(config.encoder),
                RecoveryPolicy::new(config.policy),
                RewardEvaluator::new(config.evaluator),
                config.simulator,
            );
            let mut source = SeededOutcomeSource::new(seed);
            let episode = simulator.run(&signature, &context, &mut source);
            print_json(&episode)?;
        }
    }

    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Read a loosely-typed `{signature, context}` JSON payload from a file or
/// stdin, coercing missing fields to defaults.
fn read_payload(path: Option<&Path>) -> Result<(ErrorSignature, RecoveryContext)> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(PathBuf::from(path))?,
        None => read_stdin()?,
    };
    let value: serde_json::Value = serde_json::from_str(&raw)?;

    let signature = value
        .get("signature")
        .map(ErrorSignature::from_value)
        .unwrap_or_else(|| ErrorSignature::from_value(&value));
    let context = value
        .get("context")
        .map(RecoveryContext::from_value)
        .unwrap_or_default();
    Ok((signature, context))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

mod app;
mod config;
mod domain;
mod infrastructure;
mod mailbox;
mod model;
mod tasks;
mod text;
mod training;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use infrastructure::{
    directories::{self, ResolvedPaths},
    logging, shutdown,
};

use crate::{
    config::AppConfig,
    model::{save_model, SpamClassifier},
    text::Normalizer,
    training::{find_dataset, load_corpus, Trainer},
};

#[derive(Debug, Parser)]
#[command(name = "spam-triage", version, about = "Classify unread mail and quarantine spam")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Triage the mailbox now and then on the configured cron schedule.
    Run {
        /// Run a single pass and exit.
        #[arg(long)]
        once: bool,
    },
    /// Train a model from a labeled CSV and write the artifact.
    Train {
        /// Dataset with `Category` and `Message` columns.
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Classify one piece of text with the saved model.
    Classify { text: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config)?;
    logging::init_tracing(&config, &paths)?;

    match cli.command {
        Command::Run { once } => {
            let shutdown = shutdown::Shutdown::new();
            shutdown::install_signal_handlers(shutdown.clone());
            let app = app::TriageApp::initialize(config, &paths, shutdown)?;
            if once {
                app.run_once().await?;
                Ok(())
            } else {
                app.run().await
            }
        }
        Command::Train { data } => train(&config, &paths, data),
        Command::Classify { text } => classify(&config, &text),
    }
}

fn train(config: &AppConfig, paths: &ResolvedPaths, data: Option<PathBuf>) -> Result<()> {
    let mut candidates = vec![paths.data_dir.join("spam.csv")];
    candidates.extend(config.training.dataset_candidates.iter().cloned());
    let dataset = data
        .or_else(|| find_dataset(&candidates))
        .context("no training dataset found; pass --data or place spam.csv under data/")?;
    tracing::info!(target: "training", path = %dataset.display(), "loading dataset");
    let corpus = load_corpus(&dataset)?;

    let trainer = Trainer::new(Normalizer::english(), config.training.clone());
    let report = trainer.train(&corpus)?;

    let path = config.model.artifact_path();
    save_model(path, &report.model)?;
    tracing::info!(
        target: "training",
        path = %path.display(),
        kind = %report.model.kind(),
        features = report.model.vectorizer.dimension(),
        records = report.stats.valid,
        "model saved"
    );
    if let Some(eval) = &report.evaluation {
        println!("accuracy: {:.4} on {} held-out records", eval.accuracy, eval.test_size);
    }
    Ok(())
}

fn classify(config: &AppConfig, text: &str) -> Result<()> {
    let classifier = SpamClassifier::load(
        Normalizer::english(),
        config.model.artifact_path(),
        config.triage.confidence_threshold,
    )?;
    let verdict = classifier.predict(text);
    println!(
        "{} (spam probability {:.2}%)",
        verdict.label,
        verdict.spam_probability * 100.0
    );
    Ok(())
}

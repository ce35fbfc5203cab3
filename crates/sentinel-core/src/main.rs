mod config;
mod pipeline;
pub mod results;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pipeline::{DetectArgs, SummaryArgs, TrainArgs};

/// burn-sentinel: autoencoder training and reconstruction-error anomaly detection.
#[derive(Parser)]
#[command(name = "burn-sentinel", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands for training, detection, and dataset inspection.
#[derive(Subcommand)]
enum Command {
    /// Train an autoencoder and calibrate its anomaly threshold.
    Train {
        /// Path to the sentinel config TOML file.
        #[arg(long, default_value = "configs/sentinel.toml")]
        config: PathBuf,
        /// Path to the training Parquet file.
        #[arg(long)]
        data: PathBuf,
        /// Optional held-out validation Parquet file.
        #[arg(long)]
        val_data: Option<PathBuf>,
        /// Directory for checkpoints, normalizer, and calibration.
        #[arg(long, default_value = "checkpoints/autoencoder")]
        checkpoint_dir: PathBuf,
        /// Override the number of training epochs.
        #[arg(long)]
        epochs: Option<usize>,
        /// Resume training from this epoch's checkpoint.
        #[arg(long)]
        resume_from: Option<usize>,
    },
    /// Classify a test set against a trained checkpoint.
    Detect {
        /// Path to the sentinel config TOML file.
        #[arg(long, default_value = "configs/sentinel.toml")]
        config: PathBuf,
        /// Path to the test Parquet file.
        #[arg(long)]
        data: PathBuf,
        /// Checkpoint directory produced by `train`.
        #[arg(long, default_value = "checkpoints/autoencoder")]
        checkpoint_dir: PathBuf,
        /// Path to write the JSON detection report.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Override the calibrated threshold.
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Print statistics from a sample Parquet file.
    Summary {
        /// Path to the sample Parquet file.
        #[arg(long)]
        input: PathBuf,
        /// Output as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            config,
            data,
            val_data,
            checkpoint_dir,
            epochs,
            resume_from,
        } => pipeline::run_train(TrainArgs {
            config,
            data,
            val_data,
            checkpoint_dir,
            epochs,
            resume_from,
        }),
        Command::Detect {
            config,
            data,
            checkpoint_dir,
            output,
            threshold,
        } => pipeline::run_detect(DetectArgs {
            config,
            data,
            checkpoint_dir,
            output,
            threshold,
        }),
        Command::Summary { input, json } => pipeline::run_summary(SummaryArgs { input, json }),
    }
}

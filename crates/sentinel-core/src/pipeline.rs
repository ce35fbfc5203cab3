//! Train, detect, and summary pipelines for the sentinel CLI.

use std::path::PathBuf;

use burn::backend::ndarray::NdArray;
use burn::backend::Autodiff;
use burn::module::AutodiffModule;
use indicatif::{ProgressBar, ProgressStyle};

use autoencoder::detection::{score_with_model, ThresholdCalibration};
use autoencoder::evaluation::{evaluate, RatioPolicy};
use autoencoder::model::conv::ConvDenoiserConfig;
use autoencoder::model::dense::DenseAutoencoderConfig;
use autoencoder::model::Reconstructor;
use autoencoder::training::data::ReconstructionDataset;
use autoencoder::training::trainer::{load_model_weights, train, TrainingConfig};
use dataset::{DatasetReader, MinMaxNormalizer, SampleLabel, SampleRecord};

use crate::config::{build_training_config, load_sentinel_toml, ModelSpec};
use crate::results::{median, DetectionReport};

type InferenceBackend = NdArray<f32>;
type TrainBackend = Autodiff<InferenceBackend>;

/// Arguments for the `train` subcommand.
#[derive(Debug)]
pub struct TrainArgs {
    /// Path to the sentinel config TOML file.
    pub config: PathBuf,
    /// Path to the training Parquet file.
    pub data: PathBuf,
    /// Optional held-out validation Parquet file.
    pub val_data: Option<PathBuf>,
    /// Directory for checkpoints, normalizer, and calibration.
    pub checkpoint_dir: PathBuf,
    /// Optional CLI override for epoch count.
    pub epochs: Option<usize>,
    /// Resume training from this epoch's checkpoint.
    pub resume_from: Option<usize>,
}

/// Arguments for the `detect` subcommand.
#[derive(Debug)]
pub struct DetectArgs {
    /// Path to the sentinel config TOML file.
    pub config: PathBuf,
    /// Path to the test Parquet file.
    pub data: PathBuf,
    /// Checkpoint directory produced by `train`.
    pub checkpoint_dir: PathBuf,
    /// Path to write the JSON detection report.
    pub output: Option<PathBuf>,
    /// Override the calibrated threshold.
    pub threshold: Option<f32>,
}

/// Arguments for the `summary` subcommand.
#[derive(Debug)]
pub struct SummaryArgs {
    /// Path to a sample Parquet file.
    pub input: PathBuf,
    /// Output as JSON instead of human-readable text.
    pub json: bool,
}

/// Check that the dataset width matches what the configured model expects.
fn validate_width(records: &[SampleRecord], expected: usize) -> anyhow::Result<()> {
    if let Some(first) = records.first() {
        if first.width() != expected {
            anyhow::bail!(
                "Dataset width {} does not match configured model input {expected}",
                first.width()
            );
        }
    }
    Ok(())
}

/// Train one model kind, then calibrate the threshold from the normal
/// training losses. Shared by both architectures.
fn train_and_calibrate<M>(
    training: &TrainingConfig,
    model: M,
    train_set: &ReconstructionDataset,
    val_set: Option<&ReconstructionDataset>,
    resume_from: Option<usize>,
) -> anyhow::Result<ThresholdCalibration>
where
    M: AutodiffModule<TrainBackend> + Reconstructor<TrainBackend>,
    M::InnerModule: Reconstructor<InferenceBackend>,
{
    let device = Default::default();
    let (trained, _history) = train(training, model, train_set, val_set, &device, resume_from)?;

    // Calibrate on the same normal population the model just trained on
    let inference_model = trained.valid();
    let losses = score_with_model::<InferenceBackend, _>(
        &inference_model,
        train_set.inputs(),
        &Default::default(),
    )?;
    let calibration = ThresholdCalibration::from_losses(&losses)?;

    tracing::info!(
        threshold = calibration.threshold,
        mean = calibration.mean,
        stddev = calibration.stddev,
        n_samples = calibration.n_samples,
        "Calibrated anomaly threshold"
    );

    Ok(calibration)
}

/// Train an autoencoder and calibrate its anomaly threshold.
///
/// Writes into the checkpoint directory: model/optimizer checkpoints,
/// `normalizer.json` (constants fitted on the full training split), and
/// `calibration.json` (threshold from normal training losses).
pub fn run_train(args: TrainArgs) -> anyhow::Result<()> {
    // 1. Load config
    let toml = load_sentinel_toml(&args.config)?;
    let checkpoint_dir = args.checkpoint_dir.to_string_lossy().into_owned();
    let training = build_training_config(&toml.training, &checkpoint_dir, args.epochs)?;

    // 2. Load training data
    let records = DatasetReader::read_all(&args.data)?;
    validate_width(&records, toml.model.input_dim())?;
    tracing::info!(count = records.len(), path = %args.data.display(), "Loaded training data");

    // 3. Fit the normalizer on the full training split and persist it
    std::fs::create_dir_all(&args.checkpoint_dir)?;
    let normalizer = MinMaxNormalizer::fit(&records)?;
    normalizer.save(&args.checkpoint_dir.join("normalizer.json"))?;

    // 4. The autoencoder trains on the normal-labeled subset only
    let normal: Vec<&SampleRecord> = records.iter().filter(|r| r.label.is_normal()).collect();
    tracing::info!(
        normal = normal.len(),
        anomalous = records.len() - normal.len(),
        "Training on normal-labeled samples"
    );
    let train_set = ReconstructionDataset::identity(normalizer.transform_all(&normal));

    // 5. Optional held-out validation pairs
    let val_set = match &args.val_data {
        Some(path) => {
            let val_records = DatasetReader::read_all(path)?;
            validate_width(&val_records, toml.model.input_dim())?;
            let val_normal: Vec<&SampleRecord> =
                val_records.iter().filter(|r| r.label.is_normal()).collect();
            Some(ReconstructionDataset::identity(
                normalizer.transform_all(&val_normal),
            ))
        }
        None => None,
    };

    // 6. Train + calibrate, dispatching on the configured architecture
    let device = Default::default();
    let calibration = match &toml.model {
        ModelSpec::Dense {
            input_dim,
            hidden1,
            hidden2,
            latent_dim,
        } => {
            let model = DenseAutoencoderConfig::new(*input_dim)
                .with_hidden1(*hidden1)
                .with_hidden2(*hidden2)
                .with_latent_dim(*latent_dim)
                .init::<TrainBackend>(&device);
            train_and_calibrate(&training, model, &train_set, val_set.as_ref(), args.resume_from)?
        }
        ModelSpec::Conv {
            height,
            width,
            filters1,
            filters2,
        } => {
            let model = ConvDenoiserConfig::new(*height, *width)
                .with_filters1(*filters1)
                .with_filters2(*filters2)
                .init::<TrainBackend>(&device);
            train_and_calibrate(&training, model, &train_set, val_set.as_ref(), args.resume_from)?
        }
    };

    // 7. Persist the calibration next to the checkpoints
    calibration.save(&args.checkpoint_dir.join("calibration.json"))?;

    Ok(())
}

/// Score and classify one test set with a loaded model.
fn classify_records<M: Reconstructor<InferenceBackend>>(
    model: &M,
    normalizer: &MinMaxNormalizer,
    calibration: &ThresholdCalibration,
    records: &[SampleRecord],
    batch_size: usize,
) -> anyhow::Result<(Vec<f32>, Vec<SampleLabel>)> {
    let device = Default::default();
    let normalized: Vec<Vec<f32>> = records.iter().map(|r| normalizer.transform(&r.values)).collect();

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .expect("valid progress bar template")
            .progress_chars("=> "),
    );

    let mut losses = Vec::with_capacity(records.len());
    for chunk in normalized.chunks(batch_size.max(1)) {
        let chunk_losses = score_with_model::<InferenceBackend, _>(model, chunk, &device)?;
        pb.inc(chunk_losses.len() as u64);
        losses.extend(chunk_losses);
    }
    pb.finish_and_clear();

    let predictions = losses
        .iter()
        .map(|&loss| calibration.classify_loss(loss))
        .collect();
    Ok((losses, predictions))
}

/// Classify a test set against a trained checkpoint and report metrics.
pub fn run_detect(args: DetectArgs) -> anyhow::Result<()> {
    // 1. Load config, normalizer, and calibration
    let toml = load_sentinel_toml(&args.config)?;
    let normalizer = MinMaxNormalizer::load(&args.checkpoint_dir.join("normalizer.json"))?;
    let mut calibration = ThresholdCalibration::load(&args.checkpoint_dir.join("calibration.json"))?;

    // CLI flag beats the config's [detection] override
    if let Some(threshold) = args.threshold.or(toml.detection.threshold_override) {
        tracing::info!(
            calibrated = calibration.threshold,
            threshold,
            "Overriding calibrated threshold"
        );
        calibration.threshold = threshold;
    }

    // 2. Load test data
    let records = DatasetReader::read_all(&args.data)?;
    validate_width(&records, toml.model.input_dim())?;
    tracing::info!(count = records.len(), path = %args.data.display(), "Loaded test data");

    // 3. Load model weights and classify
    let device = Default::default();
    let model_path = args.checkpoint_dir.join("final").join("model");
    let (losses, predictions) = match &toml.model {
        ModelSpec::Dense {
            input_dim,
            hidden1,
            hidden2,
            latent_dim,
        } => {
            let model = DenseAutoencoderConfig::new(*input_dim)
                .with_hidden1(*hidden1)
                .with_hidden2(*hidden2)
                .with_latent_dim(*latent_dim)
                .init::<InferenceBackend>(&device);
            let model = load_model_weights::<InferenceBackend, _>(model, &model_path, &device)?;
            classify_records(&model, &normalizer, &calibration, &records, 512)?
        }
        ModelSpec::Conv {
            height,
            width,
            filters1,
            filters2,
        } => {
            let model = ConvDenoiserConfig::new(*height, *width)
                .with_filters1(*filters1)
                .with_filters2(*filters2)
                .init::<InferenceBackend>(&device);
            let model = load_model_weights::<InferenceBackend, _>(model, &model_path, &device)?;
            classify_records(&model, &normalizer, &calibration, &records, 512)?
        }
    };

    // 4. Evaluate against ground truth
    let predicted: Vec<bool> = predictions.iter().map(SampleLabel::is_normal).collect();
    let truth: Vec<bool> = records.iter().map(|r| r.label.is_normal()).collect();
    let metrics = evaluate(&predicted, &truth, RatioPolicy::Zero)?;

    let class_mean = |keep_normal: bool| -> f64 {
        let selected: Vec<f64> = losses
            .iter()
            .zip(&records)
            .filter(|(_, r)| r.label.is_normal() == keep_normal)
            .map(|(&l, _)| l as f64)
            .collect();
        if selected.is_empty() {
            0.0
        } else {
            selected.iter().sum::<f64>() / selected.len() as f64
        }
    };

    let mut all_losses: Vec<f64> = losses.iter().map(|&l| l as f64).collect();
    let report = DetectionReport {
        checkpoint: args.checkpoint_dir.to_string_lossy().into_owned(),
        dataset: args.data.to_string_lossy().into_owned(),
        threshold: calibration.threshold,
        total: records.len(),
        predicted_normal: predicted.iter().filter(|&&p| p).count(),
        predicted_anomalous: predicted.iter().filter(|&&p| !p).count(),
        mean_loss_normal: class_mean(true),
        mean_loss_anomalous: class_mean(false),
        median_loss: median(&mut all_losses),
        metrics,
    };

    // 5. Print and optionally persist the report
    println!("Detection results for {}", report.dataset);
    println!("  threshold:           {:.6}", report.threshold);
    println!(
        "  classified:          {} normal / {} anomalous (of {})",
        report.predicted_normal, report.predicted_anomalous, report.total
    );
    println!("  accuracy:            {:.4}", report.metrics.accuracy);
    println!("  precision:           {:.4}", report.metrics.precision);
    println!("  recall:              {:.4}", report.metrics.recall);
    println!("  mean loss (normal):  {:.6}", report.mean_loss_normal);
    println!("  mean loss (anomal.): {:.6}", report.mean_loss_anomalous);
    println!("  median loss:         {:.6}", report.median_loss);

    if let Some(output) = &args.output {
        serde_json::to_writer_pretty(std::fs::File::create(output)?, &report)?;
        tracing::info!(path = %output.display(), "Wrote detection report");
    }

    Ok(())
}

/// Print statistics for a sample Parquet file.
pub fn run_summary(args: SummaryArgs) -> anyhow::Result<()> {
    let summary = DatasetReader::read_summary(&args.input)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Dataset {}", args.input.display());
        println!("  records:    {}", summary.total_records);
        println!("  normal:     {}", summary.normal_count);
        println!("  anomalous:  {}", summary.anomalous_count);
        println!("  width:      {}", summary.sample_width);
        println!(
            "  value range: [{:.4}, {:.4}]",
            summary.min_value, summary.max_value
        );
    }

    Ok(())
}

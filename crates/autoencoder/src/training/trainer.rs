//! Epoch-based training loop for autoencoders.
//!
//! Ties together the mini-batch plan, tensor bridge, reconstruction losses,
//! and metrics into a training loop using AdamW with gradient clipping.
//! For the denoising task the input tensor is corrupted with Gaussian noise
//! per batch while the target stays clean.

use std::path::Path;
use std::time::Instant;

use burn::grad_clipping::GradientClippingConfig;
use burn::module::AutodiffModule;
use burn::optim::{AdamWConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::Distribution;
use rand::SeedableRng;

use crate::model::bridge::samples_to_tensor;
use crate::model::Reconstructor;
use crate::training::data::ReconstructionDataset;
use crate::training::loss::{reconstruction_loss, ReconstructionLossType};
use crate::training::metrics::{EpochMetrics, MetricsHistory};

/// Metadata saved alongside each checkpoint for resuming training.
#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct CheckpointMeta {
    pub epoch: usize,
    pub trained_batches: u64,
}

/// Configuration for autoencoder training.
#[derive(Config, Debug)]
pub struct TrainingConfig {
    /// Learning rate for AdamW.
    #[config(default = 1e-3)]
    pub lr: f64,
    /// Weight decay for AdamW.
    #[config(default = 0.0)]
    pub weight_decay: f64,
    /// Maximum gradient norm for clipping.
    #[config(default = 1.0)]
    pub max_grad_norm: f64,
    /// Number of passes over the training set.
    #[config(default = 20)]
    pub epochs: usize,
    /// Mini-batch size.
    #[config(default = 512)]
    pub batch_size: usize,
    /// Whether to reshuffle the training set each epoch.
    #[config(default = true)]
    pub shuffle: bool,
    /// Stddev of Gaussian input corruption. 0 disables denoising mode.
    #[config(default = 0.0)]
    pub noise_std: f64,
    /// Reconstruction criterion to optimize.
    #[config(default = "ReconstructionLossType::MeanAbsolute")]
    pub loss_type: ReconstructionLossType,
    /// Epochs between metric logging.
    #[config(default = 1)]
    pub log_interval: usize,
    /// Epochs between checkpoint saves. 0 saves only the final checkpoint.
    #[config(default = 0)]
    pub checkpoint_interval: usize,
    /// Directory for saving checkpoints.
    #[config(default = "String::from(\"checkpoints/autoencoder\")")]
    pub checkpoint_dir: String,
}

/// Running average accumulator for batch losses over one epoch.
struct RunningAvg {
    loss: f64,
    count: usize,
}

impl RunningAvg {
    fn new() -> Self {
        Self { loss: 0.0, count: 0 }
    }

    fn update(&mut self, loss: f64) {
        self.loss += loss;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.loss / self.count as f64
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Compute the average reconstruction loss over a dataset (no gradients,
/// no input corruption).
fn eval_loss<B: Backend, M: Reconstructor<B>>(
    model: &M,
    set: &ReconstructionDataset,
    batch_size: usize,
    loss_type: ReconstructionLossType,
    device: &B::Device,
) -> Option<f64> {
    if set.is_empty() {
        return None;
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let mut avg = RunningAvg::new();
    for batch in set.epoch_batches(batch_size, false, &mut rng) {
        let inputs = samples_to_tensor::<B>(&batch.inputs, device);
        let targets = samples_to_tensor::<B>(&batch.targets, device);
        let loss = reconstruction_loss(loss_type, model.reconstruct(inputs), targets);
        avg.update(loss.into_scalar().elem::<f32>() as f64);
    }
    Some(avg.mean())
}

/// Run the autoencoder training loop.
///
/// # Arguments
/// - `config`: training hyperparameters
/// - `model`: initialized autoencoder (consumed and returned updated)
/// - `train_set`: normalized input/target pairs
/// - `val_set`: optional held-out pairs scored with the non-autodiff module
/// - `device`: burn device for tensor operations
/// - `resume_epoch`: if `Some(epoch)`, load optimizer state and metadata
///   from `{checkpoint_dir}/epoch_{epoch}/` and continue from there
///
/// # Returns
/// The trained model and the per-epoch metrics history.
pub fn train<B, M>(
    config: &TrainingConfig,
    mut model: M,
    train_set: &ReconstructionDataset,
    val_set: Option<&ReconstructionDataset>,
    device: &B::Device,
    resume_epoch: Option<usize>,
) -> anyhow::Result<(M, MetricsHistory)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Reconstructor<B>,
    M::InnerModule: Reconstructor<B::InnerBackend>,
{
    if train_set.is_empty() {
        anyhow::bail!("Training set is empty");
    }
    std::fs::create_dir_all(&config.checkpoint_dir)?;

    tracing::info!(
        loss_type = %config.loss_type,
        epochs = config.epochs,
        batch_size = config.batch_size,
        noise_std = config.noise_std,
        samples = train_set.len(),
        "Starting training"
    );

    let optim_config = AdamWConfig::new()
        .with_weight_decay(config.weight_decay as f32)
        .with_grad_clipping(Some(GradientClippingConfig::Norm(
            config.max_grad_norm as f32,
        )));
    let mut optimizer = optim_config.init();

    let mut rng = rand::rngs::StdRng::from_entropy();
    let mut history = MetricsHistory::new();
    let mut running_avg = RunningAvg::new();
    let train_start = Instant::now();
    let mut trained_batches: u64 = 0;
    let start_epoch: usize;

    // Resume from checkpoint if requested
    if let Some(epoch) = resume_epoch {
        let epoch_dir = format!("{}/epoch_{epoch}", config.checkpoint_dir);
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();

        let optim_path = format!("{epoch_dir}/optimizer");
        let optim_record = recorder
            .load(optim_path.into(), device)
            .map_err(|e| anyhow::anyhow!("Failed to load optimizer from {epoch_dir}: {e}"))?;
        optimizer = optimizer.load_record(optim_record);

        let meta_path = format!("{epoch_dir}/meta.json");
        let meta: CheckpointMeta = serde_json::from_reader(
            std::fs::File::open(&meta_path)
                .map_err(|e| anyhow::anyhow!("Failed to open {meta_path}: {e}"))?,
        )
        .map_err(|e| anyhow::anyhow!("Failed to parse {meta_path}: {e}"))?;
        trained_batches = meta.trained_batches;
        start_epoch = epoch;

        tracing::info!(start_epoch, trained_batches, "Resumed training from checkpoint");
    } else {
        start_epoch = 0;
    }

    for epoch in start_epoch..config.epochs {
        running_avg.reset();

        for batch in train_set.epoch_batches(config.batch_size, config.shuffle, &mut rng) {
            let inputs = samples_to_tensor::<B>(&batch.inputs, device);
            let targets = samples_to_tensor::<B>(&batch.targets, device);

            // Denoising mode: corrupt the input, reconstruct the clean target
            let inputs = if config.noise_std > 0.0 {
                let noise = Tensor::random(
                    inputs.dims(),
                    Distribution::Normal(0.0, config.noise_std),
                    device,
                );
                (inputs + noise).clamp(0.0, 1.0)
            } else {
                inputs
            };

            let reconstruction = model.reconstruct(inputs);
            let loss = reconstruction_loss(config.loss_type, reconstruction, targets);
            let loss_val: f64 = loss.clone().into_scalar().elem::<f32>() as f64;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(config.lr.into(), model, grads);

            trained_batches += 1;
            running_avg.update(loss_val);
        }

        let val_loss = if config.log_interval > 0 && epoch % config.log_interval == 0 {
            val_set.and_then(|vs| {
                eval_loss(
                    &model.valid(),
                    vs,
                    config.batch_size,
                    config.loss_type,
                    device,
                )
            })
        } else {
            None
        };

        let metrics = EpochMetrics {
            epoch,
            train_loss: running_avg.mean(),
            val_loss,
        };

        if config.log_interval > 0 && epoch % config.log_interval == 0 {
            let warnings = metrics.health_check();
            if !warnings.is_empty() {
                tracing::warn!(epoch, "Health check warnings: {warnings:?}");
            }

            let elapsed = train_start.elapsed().as_secs_f64();
            match metrics.val_loss {
                Some(val) => tracing::info!(
                    epoch,
                    train_loss = format!("{:.6}", metrics.train_loss),
                    val_loss = format!("{val:.6}"),
                    elapsed_secs = format!("{elapsed:.1}"),
                    "Epoch complete"
                ),
                None => tracing::info!(
                    epoch,
                    train_loss = format!("{:.6}", metrics.train_loss),
                    elapsed_secs = format!("{elapsed:.1}"),
                    "Epoch complete"
                ),
            }
        }
        history.push(metrics);

        if config.checkpoint_interval > 0 && epoch > 0 && epoch % config.checkpoint_interval == 0 {
            save_checkpoint(
                &format!("{}/epoch_{epoch}", config.checkpoint_dir),
                &model,
                &optimizer,
                epoch,
                trained_batches,
            )?;
            tracing::info!(epoch, "Checkpoint saved (model + optimizer + meta)");
        }
    }

    let total_time = train_start.elapsed();
    tracing::info!(
        trained_batches,
        epochs = config.epochs,
        elapsed_secs = format!("{:.1}", total_time.as_secs_f64()),
        "Training loop finished"
    );

    save_checkpoint(
        &format!("{}/final", config.checkpoint_dir),
        &model,
        &optimizer,
        config.epochs,
        trained_batches,
    )?;
    tracing::info!("Training complete. Final checkpoint saved (model + optimizer + meta).");

    Ok((model, history))
}

/// Save model weights, optimizer state, and metadata into one directory.
fn save_checkpoint<B, M, O>(
    dir: &str,
    model: &M,
    optimizer: &O,
    epoch: usize,
    trained_batches: u64,
) -> anyhow::Result<()>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    std::fs::create_dir_all(dir)?;
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();

    let model_path = format!("{dir}/model");
    model
        .clone()
        .save_file(&model_path, &recorder)
        .map_err(|e| anyhow::anyhow!("Failed to save model to {dir}: {e}"))?;

    let optim_path = format!("{dir}/optimizer");
    recorder
        .record(optimizer.to_record(), optim_path.into())
        .map_err(|e| anyhow::anyhow!("Failed to save optimizer to {dir}: {e}"))?;

    let meta_path = format!("{dir}/meta.json");
    serde_json::to_writer(
        std::fs::File::create(&meta_path)?,
        &CheckpointMeta {
            epoch,
            trained_batches,
        },
    )?;

    Ok(())
}

/// Load saved weights into a freshly initialized model.
pub fn load_model_weights<B: Backend, M: Module<B>>(
    model: M,
    path: &Path,
    device: &B::Device,
) -> anyhow::Result<M> {
    let model = model
        .load_file(
            path,
            &NamedMpkFileRecorder::<FullPrecisionSettings>::new(),
            device,
        )
        .map_err(|e| anyhow::anyhow!("Failed to load checkpoint from {}: {e}", path.display()))?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_avg() {
        let mut avg = RunningAvg::new();
        assert_eq!(avg.mean(), 0.0);

        avg.update(0.2);
        avg.update(0.4);
        assert!((avg.mean() - 0.3).abs() < 1e-12);

        avg.reset();
        assert_eq!(avg.mean(), 0.0);
    }

    #[test]
    fn test_default_config() {
        let config = TrainingConfig::new();
        assert!((config.lr - 1e-3).abs() < 1e-12);
        assert_eq!(config.epochs, 20);
        assert_eq!(config.batch_size, 512);
        assert!(config.shuffle);
        assert_eq!(config.noise_std, 0.0);
        assert_eq!(config.loss_type, ReconstructionLossType::MeanAbsolute);
        assert_eq!(config.checkpoint_interval, 0);
    }
}

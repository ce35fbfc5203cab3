//! Reconstruction-error anomaly detection.
//!
//! A trained autoencoder reconstructs normal samples well and anomalous
//! samples poorly. The per-sample mean absolute error between input and
//! reconstruction is the anomaly score; a threshold calibrated on the loss
//! distribution of normal training samples separates the two classes.

use std::path::Path;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::bridge::{sample_to_tensor, samples_to_tensor, tensor_to_rows};
use crate::model::Reconstructor;
use dataset::SampleLabel;

/// Errors from anomaly scoring and calibration.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// Input and reconstruction widths differ; the model/data contract was
    /// violated upstream. Never silently truncated or padded.
    #[error("Shape mismatch: input has {expected} values, reconstruction has {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Too few normal samples to calibrate a threshold (stddev needs >= 2).
    #[error("Insufficient calibration data: got {count} losses, need at least 2")]
    InsufficientData { count: usize },

    /// Parallel sequences passed to evaluation have different lengths.
    #[error("Length mismatch: {left} predictions vs {right} ground-truth labels")]
    LengthMismatch { left: usize, right: usize },
}

/// Per-sample anomaly score: mean absolute error between a sample and its
/// reconstruction.
///
/// Symmetric in its arguments, non-negative, and zero exactly when the two
/// sequences are elementwise equal.
pub fn reconstruction_error(input: &[f32], reconstruction: &[f32]) -> Result<f32, DetectError> {
    if input.len() != reconstruction.len() {
        return Err(DetectError::ShapeMismatch {
            expected: input.len(),
            actual: reconstruction.len(),
        });
    }

    let sum: f32 = input
        .iter()
        .zip(reconstruction)
        .map(|(x, r)| (x - r).abs())
        .sum();
    Ok(sum / input.len() as f32)
}

/// Calibrated decision boundary for anomaly classification.
///
/// `threshold = mean + stddev` over the reconstruction errors of
/// normal-labeled training samples, computed once after training. The
/// **population** standard deviation (divide by `n`) is the fixed policy
/// here. Recalibrating requires re-deriving from a normal-sample
/// population; anomalous or test losses must never enter the calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCalibration {
    /// The decision boundary: `loss < threshold` classifies normal.
    pub threshold: f32,
    /// Mean of the calibration losses.
    pub mean: f32,
    /// Population standard deviation of the calibration losses.
    pub stddev: f32,
    /// Number of losses the calibration was derived from.
    pub n_samples: usize,
}

impl ThresholdCalibration {
    /// Calibrate from the reconstruction errors of normal training samples.
    ///
    /// Fails with [`DetectError::InsufficientData`] on fewer than 2 losses:
    /// the standard deviation of 0 or 1 values is undefined or trivially
    /// zero, which would make the boundary meaningless.
    pub fn from_losses(losses: &[f32]) -> Result<Self, DetectError> {
        if losses.len() < 2 {
            return Err(DetectError::InsufficientData {
                count: losses.len(),
            });
        }

        let n = losses.len() as f32;
        let mean = losses.iter().sum::<f32>() / n;
        let variance = losses.iter().map(|l| (l - mean) * (l - mean)).sum::<f32>() / n;
        let stddev = variance.sqrt();

        Ok(Self {
            threshold: mean + stddev,
            mean,
            stddev,
            n_samples: losses.len(),
        })
    }

    /// Classify a single loss value against the boundary.
    ///
    /// Strict less-than: a loss exactly at the threshold classifies
    /// anomalous.
    pub fn classify_loss(&self, loss: f32) -> SampleLabel {
        if loss < self.threshold {
            SampleLabel::Normal
        } else {
            SampleLabel::Anomalous
        }
    }

    /// Persist the calibration as JSON.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(std::fs::File::create(path)?, self)?;
        tracing::info!(
            threshold = self.threshold,
            n_samples = self.n_samples,
            path = %path.display(),
            "Saved threshold calibration"
        );
        Ok(())
    }

    /// Load a calibration from JSON.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let calibration: Self = serde_json::from_reader(
            std::fs::File::open(path)
                .map_err(|e| anyhow::anyhow!("Failed to open {}: {e}", path.display()))?,
        )?;
        Ok(calibration)
    }
}

/// Score a batch of normalized samples with any reconstructor: one forward
/// pass, then per-sample mean absolute error.
///
/// Used both for threshold calibration (scoring the normal training
/// population post-training) and by [`AnomalyDetector`] at classification
/// time.
pub fn score_with_model<B: Backend, M: Reconstructor<B>>(
    model: &M,
    samples: &[Vec<f32>],
    device: &B::Device,
) -> Result<Vec<f32>, DetectError> {
    if samples.is_empty() {
        return Ok(vec![]);
    }

    let inputs = samples_to_tensor::<B>(samples, device);
    let reconstructions = tensor_to_rows::<B>(model.reconstruct(inputs));

    samples
        .iter()
        .zip(&reconstructions)
        .map(|(sample, recon)| reconstruction_error(sample, recon))
        .collect()
}

/// Anomaly detector: a trained reconstructor plus a calibrated threshold.
///
/// Stateless per call — classification reads the model and threshold,
/// mutates nothing, and is deterministic for a fixed model and threshold.
pub struct AnomalyDetector<B: Backend, M: Reconstructor<B>> {
    model: M,
    calibration: ThresholdCalibration,
    device: B::Device,
}

impl<B: Backend, M: Reconstructor<B>> AnomalyDetector<B, M> {
    /// Create a detector from a trained model and its calibration.
    pub fn new(model: M, calibration: ThresholdCalibration, device: B::Device) -> Self {
        Self {
            model,
            calibration,
            device,
        }
    }

    /// The calibration in use.
    pub fn calibration(&self) -> &ThresholdCalibration {
        &self.calibration
    }

    /// Score a single normalized sample.
    pub fn score_sample(&self, sample: &[f32]) -> Result<f32, DetectError> {
        let input = sample_to_tensor::<B>(sample, &self.device);
        let reconstruction = self.model.reconstruct(input);
        let rows = tensor_to_rows::<B>(reconstruction);
        reconstruction_error(sample, &rows[0])
    }

    /// Score a batch of normalized samples in one forward pass.
    pub fn score_samples(&self, samples: &[Vec<f32>]) -> Result<Vec<f32>, DetectError> {
        score_with_model(&self.model, samples, &self.device)
    }

    /// Classify a single normalized sample.
    pub fn classify(&self, sample: &[f32]) -> Result<SampleLabel, DetectError> {
        Ok(self.calibration.classify_loss(self.score_sample(sample)?))
    }

    /// Classify a batch of normalized samples.
    pub fn classify_all(&self, samples: &[Vec<f32>]) -> Result<Vec<SampleLabel>, DetectError> {
        Ok(self
            .score_samples(samples)?
            .into_iter()
            .map(|loss| self.calibration.classify_loss(loss))
            .collect())
    }
}

//! Integration tests for the autoencoder crate.
//!
//! These tests exercise cross-module interactions: model + loss + optimizer
//! over full training runs, checkpoint save/load fidelity, and the
//! train → calibrate → classify pipeline. All use the NdArray backend and
//! synthetic data.

use burn::backend::ndarray::NdArray;
use burn::backend::Autodiff;
use burn::module::AutodiffModule;
use std::path::Path;
use tempfile::TempDir;

use autoencoder::detection::{AnomalyDetector, ThresholdCalibration};
use autoencoder::model::bridge::{samples_to_tensor, tensor_to_rows};
use autoencoder::model::dense::DenseAutoencoderConfig;
use autoencoder::training::data::ReconstructionDataset;
use autoencoder::training::loss::ReconstructionLossType;
use autoencoder::training::trainer::{load_model_weights, train, TrainingConfig};

type TestBackend = NdArray<f32>;
type TestAutodiffBackend = Autodiff<NdArray<f32>>;

const WIDTH: usize = 8;

/// Smooth in-range samples with small amplitude jitter.
fn normal_samples(count: usize) -> Vec<Vec<f32>> {
    (0..count)
        .map(|i| {
            let amplitude = 0.25 + 0.01 * (i % 5) as f32;
            (0..WIDTH)
                .map(|j| 0.5 + amplitude * (j as f32 * 0.8).sin())
                .collect()
        })
        .collect()
}

fn quick_config(dir: &Path, epochs: usize) -> TrainingConfig {
    TrainingConfig::new()
        .with_epochs(epochs)
        .with_batch_size(16)
        .with_lr(5e-3)
        .with_checkpoint_dir(dir.to_string_lossy().into_owned())
}

#[test]
fn test_training_reduces_loss() {
    let tmp = TempDir::new().unwrap();
    let device = Default::default();

    let model = DenseAutoencoderConfig::new(WIDTH)
        .with_hidden1(16)
        .with_hidden2(8)
        .with_latent_dim(4)
        .init::<TestAutodiffBackend>(&device);

    let train_set = ReconstructionDataset::identity(normal_samples(32));
    let config = quick_config(tmp.path(), 60);

    let (_model, history) = train(&config, model, &train_set, None, &device, None).unwrap();

    assert_eq!(history.len(), 60);
    let first = history.entries()[0].train_loss;
    let last = history.last().unwrap().train_loss;
    assert!(last.is_finite());
    assert!(
        last < first,
        "Loss should decrease over training: first={first}, last={last}"
    );
}

#[test]
fn test_validation_loss_is_tracked() {
    let tmp = TempDir::new().unwrap();
    let device = Default::default();

    let model = DenseAutoencoderConfig::new(WIDTH)
        .with_hidden1(16)
        .with_hidden2(8)
        .with_latent_dim(4)
        .init::<TestAutodiffBackend>(&device);

    let train_set = ReconstructionDataset::identity(normal_samples(24));
    let val_set = ReconstructionDataset::identity(normal_samples(8));
    let config = quick_config(tmp.path(), 5);

    let (_model, history) =
        train(&config, model, &train_set, Some(&val_set), &device, None).unwrap();

    for entry in history.entries() {
        let val = entry.val_loss.expect("val loss should be recorded");
        assert!(val.is_finite());
    }
}

#[test]
fn test_checkpoint_save_load_preserves_weights() {
    let tmp = TempDir::new().unwrap();
    let device = Default::default();

    let model_config = DenseAutoencoderConfig::new(WIDTH)
        .with_hidden1(16)
        .with_hidden2(8)
        .with_latent_dim(4);
    let model = model_config.init::<TestAutodiffBackend>(&device);

    let train_set = ReconstructionDataset::identity(normal_samples(16));
    let config = quick_config(tmp.path(), 3);

    let (trained, _) = train(&config, model, &train_set, None, &device, None).unwrap();

    let final_model_path = tmp.path().join("final").join("model");
    assert!(tmp.path().join("final").exists());

    // Load the checkpoint into a fresh inference-backend model and compare
    // outputs against the trained model's inference view.
    let inference_device = Default::default();
    let fresh = model_config.init::<TestBackend>(&inference_device);
    let loaded =
        load_model_weights::<TestBackend, _>(fresh, &final_model_path, &inference_device).unwrap();

    let probe = samples_to_tensor::<TestBackend>(&normal_samples(4), &inference_device);
    let from_loaded = tensor_to_rows::<TestBackend>(loaded.forward(probe.clone()));
    let from_trained = tensor_to_rows::<TestBackend>(trained.valid().forward(probe));

    for (a, b) in from_loaded.iter().flatten().zip(from_trained.iter().flatten()) {
        assert!((a - b).abs() < 1e-6, "Loaded weights diverge: {a} vs {b}");
    }
}

#[test]
fn test_denoising_mode_trains() {
    let tmp = TempDir::new().unwrap();
    let device = Default::default();

    let model = DenseAutoencoderConfig::new(WIDTH)
        .with_hidden1(16)
        .with_hidden2(8)
        .with_latent_dim(4)
        .init::<TestAutodiffBackend>(&device);

    let train_set = ReconstructionDataset::identity(normal_samples(16));
    let config = quick_config(tmp.path(), 4)
        .with_noise_std(0.3)
        .with_loss_type(ReconstructionLossType::MeanSquared);

    let (_model, history) = train(&config, model, &train_set, None, &device, None).unwrap();
    for entry in history.entries() {
        assert!(entry.train_loss.is_finite());
    }
}

#[test]
fn test_train_calibrate_classify_pipeline() {
    let tmp = TempDir::new().unwrap();
    let device = Default::default();

    let model = DenseAutoencoderConfig::new(WIDTH)
        .with_hidden1(16)
        .with_hidden2(8)
        .with_latent_dim(4)
        .init::<TestAutodiffBackend>(&device);

    let samples = normal_samples(32);
    let train_set = ReconstructionDataset::identity(samples.clone());
    let config = quick_config(tmp.path(), 30);

    let (trained, _) = train(&config, model, &train_set, None, &device, None).unwrap();
    let inference_model = trained.valid();
    let inference_device = Default::default();

    // Calibrate from the trained model's scores on the normal population,
    // exactly as the detection pipeline does.
    let probe_detector = AnomalyDetector::<TestBackend, _>::new(
        inference_model,
        ThresholdCalibration::from_losses(&[0.0, 1.0]).unwrap(),
        inference_device,
    );
    let losses = probe_detector.score_samples(&samples).unwrap();
    let calibration = ThresholdCalibration::from_losses(&losses).unwrap();

    // Manual mean + population stddev must match the calibrator.
    let n = losses.len() as f32;
    let mean = losses.iter().sum::<f32>() / n;
    let variance = losses.iter().map(|l| (l - mean) * (l - mean)).sum::<f32>() / n;
    assert!((calibration.mean - mean).abs() < 1e-6);
    assert!((calibration.stddev - variance.sqrt()).abs() < 1e-6);
    assert!(calibration.threshold.is_finite());
    assert!(calibration.threshold >= 0.0);

    // Classification is deterministic for a fixed model and threshold.
    let first = probe_detector.classify_all(&samples).unwrap();
    let second = probe_detector.classify_all(&samples).unwrap();
    assert_eq!(first, second);
}

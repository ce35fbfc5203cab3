//! TOML config loading for the sentinel CLI.
//!
//! Deserializes `configs/sentinel.toml`, which has `[model]`, `[training]`,
//! and `[detection]` sections, then merges with CLI overrides.

use std::path::Path;

use autoencoder::training::loss::ReconstructionLossType;
use autoencoder::training::trainer::TrainingConfig;
use serde::Deserialize;

/// Model architecture selection, tag-dispatched from TOML.
///
/// The architecture is a hyperparameter choice: both variants satisfy the
/// same reconstruct contract, so the detection pipeline is indifferent
/// to which one the config names.
///
/// # Example (TOML)
///
/// ```toml
/// [model]
/// type = "Dense"
/// input_dim = 140
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ModelSpec {
    /// Symmetric MLP autoencoder over flat samples.
    Dense {
        /// Width of each input sample.
        input_dim: usize,
        /// First hidden layer dimension.
        #[serde(default = "default_hidden1")]
        hidden1: usize,
        /// Second hidden layer dimension.
        #[serde(default = "default_hidden2")]
        hidden2: usize,
        /// Latent (bottleneck) dimension.
        #[serde(default = "default_latent_dim")]
        latent_dim: usize,
    },
    /// Convolutional denoiser over single-channel images.
    Conv {
        /// Image height (divisible by 4).
        height: usize,
        /// Image width (divisible by 4).
        width: usize,
        /// Channels after the first convolution.
        #[serde(default = "default_filters1")]
        filters1: usize,
        /// Channels at the bottleneck.
        #[serde(default = "default_filters2")]
        filters2: usize,
    },
}

fn default_hidden1() -> usize {
    32
}
fn default_hidden2() -> usize {
    16
}
fn default_latent_dim() -> usize {
    8
}
fn default_filters1() -> usize {
    8
}
fn default_filters2() -> usize {
    4
}

impl ModelSpec {
    /// Flat width of each sample this model expects.
    pub fn input_dim(&self) -> usize {
        match self {
            Self::Dense { input_dim, .. } => *input_dim,
            Self::Conv { height, width, .. } => height * width,
        }
    }
}

/// Optional overrides for `TrainingConfig` fields.
///
/// All fields are `Option`; unset fields keep the built-in defaults.
#[derive(Debug, Default, Deserialize)]
pub struct TrainingOverrides {
    /// Number of training epochs.
    pub epochs: Option<usize>,
    /// Learning rate.
    pub lr: Option<f64>,
    /// Mini-batch size.
    pub batch_size: Option<usize>,
    /// Whether to reshuffle each epoch.
    pub shuffle: Option<bool>,
    /// Stddev of Gaussian input corruption (denoising mode).
    pub noise_std: Option<f64>,
    /// "mae" or "mse".
    pub loss: Option<String>,
    /// Epochs between checkpoint saves.
    pub checkpoint_interval: Option<usize>,
}

/// Detection-stage settings.
#[derive(Debug, Default, Deserialize)]
pub struct DetectionSettings {
    /// Fixed decision boundary, replacing the calibrated one.
    pub threshold_override: Option<f32>,
}

/// Top-level structure matching `configs/sentinel.toml`.
#[derive(Debug, Deserialize)]
pub struct SentinelToml {
    /// Model architecture.
    pub model: ModelSpec,
    /// Training hyperparameter overrides.
    #[serde(default)]
    pub training: TrainingOverrides,
    /// Detection-stage settings.
    #[serde(default)]
    pub detection: DetectionSettings,
}

/// Load and deserialize a `SentinelToml` from a TOML file.
pub fn load_sentinel_toml(path: &Path) -> anyhow::Result<SentinelToml> {
    let contents = std::fs::read_to_string(path)?;
    let config: SentinelToml = toml::from_str(&contents)?;
    tracing::info!(path = %path.display(), "Loaded sentinel config");
    Ok(config)
}

/// Build a `TrainingConfig` from defaults, TOML overrides, and CLI flags.
///
/// Priority chain: built-in defaults < TOML values < CLI flags.
pub fn build_training_config(
    overrides: &TrainingOverrides,
    checkpoint_dir: &str,
    epochs_cli: Option<usize>,
) -> anyhow::Result<TrainingConfig> {
    let mut config = TrainingConfig::new().with_checkpoint_dir(checkpoint_dir.to_string());

    if let Some(n) = overrides.epochs {
        config.epochs = n;
    }
    if let Some(lr) = overrides.lr {
        config.lr = lr;
    }
    if let Some(n) = overrides.batch_size {
        config.batch_size = n;
    }
    if let Some(shuffle) = overrides.shuffle {
        config.shuffle = shuffle;
    }
    if let Some(std) = overrides.noise_std {
        config.noise_std = std;
    }
    if let Some(loss) = &overrides.loss {
        config.loss_type = match loss.as_str() {
            "mae" => ReconstructionLossType::MeanAbsolute,
            "mse" => ReconstructionLossType::MeanSquared,
            other => anyhow::bail!("Unknown loss type {other:?}, expected \"mae\" or \"mse\""),
        };
    }
    if let Some(n) = overrides.checkpoint_interval {
        config.checkpoint_interval = n;
    }

    // CLI override takes highest priority
    if let Some(n) = epochs_cli {
        config.epochs = n;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_toml() {
        let toml_str = r#"
[model]
type = "Dense"
input_dim = 140
hidden1 = 64
latent_dim = 4

[training]
epochs = 40
lr = 0.005
batch_size = 256
noise_std = 0.0
loss = "mae"

[detection]
threshold_override = 0.05
"#;
        let config: SentinelToml = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.model,
            ModelSpec::Dense {
                input_dim: 140,
                hidden1: 64,
                hidden2: 16,
                latent_dim: 4,
            }
        );
        assert_eq!(config.training.epochs, Some(40));
        assert_eq!(config.training.loss.as_deref(), Some("mae"));
        assert_eq!(config.detection.threshold_override, Some(0.05));
    }

    #[test]
    fn test_deserialize_model_only() {
        // training and detection sections missing — defaults apply
        let toml_str = r#"
[model]
type = "Conv"
height = 28
width = 28
"#;
        let config: SentinelToml = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.model,
            ModelSpec::Conv {
                height: 28,
                width: 28,
                filters1: 8,
                filters2: 4,
            }
        );
        assert!(config.training.epochs.is_none());
        assert!(config.detection.threshold_override.is_none());
    }

    #[test]
    fn test_input_dim() {
        let dense = ModelSpec::Dense {
            input_dim: 140,
            hidden1: 32,
            hidden2: 16,
            latent_dim: 8,
        };
        assert_eq!(dense.input_dim(), 140);

        let conv = ModelSpec::Conv {
            height: 28,
            width: 28,
            filters1: 8,
            filters2: 4,
        };
        assert_eq!(conv.input_dim(), 784);
    }

    #[test]
    fn test_build_training_config_priority() {
        let overrides = TrainingOverrides {
            epochs: Some(40),
            lr: Some(0.005),
            batch_size: None,
            shuffle: None,
            noise_std: Some(0.3),
            loss: Some("mse".to_string()),
            checkpoint_interval: None,
        };

        let config = build_training_config(&overrides, "ckpt", Some(7)).unwrap();
        // CLI epochs beats TOML epochs
        assert_eq!(config.epochs, 7);
        assert!((config.lr - 0.005).abs() < 1e-12);
        // Unset fields keep defaults
        assert_eq!(config.batch_size, 512);
        assert!(config.shuffle);
        assert_eq!(config.loss_type, ReconstructionLossType::MeanSquared);
        assert_eq!(config.checkpoint_dir, "ckpt");
    }

    #[test]
    fn test_build_training_config_bad_loss() {
        let overrides = TrainingOverrides {
            loss: Some("huber".to_string()),
            ..Default::default()
        };
        assert!(build_training_config(&overrides, "ckpt", None).is_err());
    }
}

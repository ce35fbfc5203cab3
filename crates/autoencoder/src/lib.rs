//! Autoencoders for reconstruction, denoising, and anomaly detection.
//!
//! Provides burn-based encoder/decoder models (dense and convolutional),
//! an epoch training loop with checkpointing, and reconstruction-error
//! anomaly detection: per-sample mean absolute error scored against a
//! threshold calibrated on normal training data.

pub mod detection;
pub mod evaluation;
pub mod model;
pub mod training;

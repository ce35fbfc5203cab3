//! Result types for detection runs.

use serde::{Deserialize, Serialize};

use autoencoder::evaluation::EvaluationReport;

/// Results from classifying a test set against a calibrated threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Checkpoint directory the model and calibration came from.
    pub checkpoint: String,
    /// Path of the test dataset.
    pub dataset: String,
    /// Decision boundary used.
    pub threshold: f32,
    /// Total samples classified.
    pub total: usize,
    /// Samples classified normal.
    pub predicted_normal: usize,
    /// Samples classified anomalous.
    pub predicted_anomalous: usize,
    /// Mean reconstruction error over truly normal test samples.
    pub mean_loss_normal: f64,
    /// Mean reconstruction error over truly anomalous test samples.
    pub mean_loss_anomalous: f64,
    /// Median reconstruction error over the whole test set.
    pub median_loss: f64,
    /// Accuracy/precision/recall against ground truth.
    pub metrics: EvaluationReport,
}

/// Compute the median of a slice of f64 values.
///
/// Returns 0.0 for empty slices.
pub fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

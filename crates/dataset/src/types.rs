//! Data types for labeled samples, dataset splits, and summaries.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors from dataset loading and preprocessing.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Samples in one file have inconsistent widths.
    #[error("Sample {index} has width {actual}, expected {expected}")]
    ShapeMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// Normalization constants collapse (max == min); the data cannot be
    /// min-max scaled.
    #[error("Degenerate value range: min == max == {0}")]
    DegenerateRange(f32),

    /// The collection has no samples to fit statistics on.
    #[error("Cannot fit on an empty sample collection")]
    Empty,

    /// IO error from file access.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Label for a sample: within the normal population or anomalous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleLabel {
    Normal,
    Anomalous,
}

impl fmt::Display for SampleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Anomalous => write!(f, "anomalous"),
        }
    }
}

impl SampleLabel {
    /// Build a label from the Parquet boolean encoding (`true` = normal).
    pub fn from_bool(is_normal: bool) -> Self {
        if is_normal {
            Self::Normal
        } else {
            Self::Anomalous
        }
    }

    /// Whether this label marks the normal population.
    pub fn is_normal(&self) -> bool {
        matches!(self, Self::Normal)
    }
}

/// A fixed-width sequence of readings with its ground-truth label.
///
/// One ECG cycle, one flattened image, one window of sensor readings.
/// Immutable once loaded; preprocessing produces new vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Raw readings. All records in one dataset share the same width.
    pub values: Vec<f32>,
    /// Ground-truth label. Used for threshold calibration and evaluation,
    /// never for representation learning.
    pub label: SampleLabel,
}

impl SampleRecord {
    /// Number of readings in this sample.
    pub fn width(&self) -> usize {
        self.values.len()
    }
}

/// Training and test partitions of a labeled dataset.
#[derive(Debug, Clone, Default)]
pub struct DatasetSplit {
    pub train: Vec<SampleRecord>,
    pub test: Vec<SampleRecord>,
}

impl DatasetSplit {
    /// Shuffle `records` and partition them, putting `test_fraction` of the
    /// records (rounded down) into the test set.
    pub fn partition(
        mut records: Vec<SampleRecord>,
        test_fraction: f64,
        rng: &mut impl Rng,
    ) -> Self {
        records.shuffle(rng);
        let test_len = (records.len() as f64 * test_fraction.clamp(0.0, 1.0)) as usize;
        let train = records.split_off(test_len);
        Self {
            train,
            test: records,
        }
    }

    /// Normal-labeled training samples. The autoencoder trains on these and
    /// the threshold calibrates on their losses.
    pub fn train_normal(&self) -> Vec<&SampleRecord> {
        self.train.iter().filter(|r| r.label.is_normal()).collect()
    }

    /// Anomalous-labeled training samples.
    pub fn train_anomalous(&self) -> Vec<&SampleRecord> {
        self.train.iter().filter(|r| !r.label.is_normal()).collect()
    }
}

/// Summary statistics for one dataset file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_records: usize,
    pub normal_count: usize,
    pub anomalous_count: usize,
    /// Shared width of every sample, 0 for an empty file.
    pub sample_width: usize,
    /// Smallest reading across all samples.
    pub min_value: f32,
    /// Largest reading across all samples.
    pub max_value: f32,
}

impl DatasetSummary {
    /// Compute a summary over a slice of records.
    ///
    /// Assumes widths were already validated by the reader; uses the first
    /// record's width.
    pub fn from_records(records: &[SampleRecord]) -> Self {
        let mut normal_count = 0;
        let mut min_value = f32::INFINITY;
        let mut max_value = f32::NEG_INFINITY;

        for record in records {
            if record.label.is_normal() {
                normal_count += 1;
            }
            for &v in &record.values {
                min_value = min_value.min(v);
                max_value = max_value.max(v);
            }
        }

        if records.is_empty() {
            min_value = 0.0;
            max_value = 0.0;
        }

        Self {
            total_records: records.len(),
            normal_count,
            anomalous_count: records.len() - normal_count,
            sample_width: records.first().map(SampleRecord::width).unwrap_or(0),
            min_value,
            max_value,
        }
    }
}

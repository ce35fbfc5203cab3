//! Min-max normalization with statistics fitted on training data.
//!
//! The constants are computed once from the training split and then applied
//! identically to train and test samples. Refitting on test data would leak
//! test statistics into preprocessing, so the fitted normalizer is persisted
//! as JSON next to the model checkpoint and reloaded at detection time.

use crate::types::{DatasetError, SampleRecord};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Min-max scaler mapping training-range values to `[0, 1]`.
///
/// Test values outside the training range map outside `[0, 1]`; they are
/// intentionally not clipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxNormalizer {
    /// Smallest reading seen across all elements of all training samples.
    pub min_val: f32,
    /// Largest reading seen across all elements of all training samples.
    pub max_val: f32,
}

impl MinMaxNormalizer {
    /// Fit normalization constants on a training collection.
    ///
    /// Fails with [`DatasetError::Empty`] on an empty collection and
    /// [`DatasetError::DegenerateRange`] when every reading is identical.
    pub fn fit(records: &[SampleRecord]) -> Result<Self, DatasetError> {
        let mut min_val = f32::INFINITY;
        let mut max_val = f32::NEG_INFINITY;
        let mut seen = false;

        for record in records {
            for &v in &record.values {
                min_val = min_val.min(v);
                max_val = max_val.max(v);
                seen = true;
            }
        }

        if !seen {
            return Err(DatasetError::Empty);
        }
        if max_val <= min_val {
            return Err(DatasetError::DegenerateRange(min_val));
        }

        Ok(Self { min_val, max_val })
    }

    /// Scale one sample elementwise: `(v - min_val) / (max_val - min_val)`.
    ///
    /// Pure given the fitted constants; applying it to train and test data
    /// uses the same constant pair.
    pub fn transform(&self, values: &[f32]) -> Vec<f32> {
        let range = self.max_val - self.min_val;
        values.iter().map(|v| (v - self.min_val) / range).collect()
    }

    /// Scale a batch of samples.
    pub fn transform_all(&self, records: &[&SampleRecord]) -> Vec<Vec<f32>> {
        records.iter().map(|r| self.transform(&r.values)).collect()
    }

    /// Map normalized values back to the original scale.
    pub fn inverse_transform(&self, values: &[f32]) -> Vec<f32> {
        let range = self.max_val - self.min_val;
        values.iter().map(|v| v * range + self.min_val).collect()
    }

    /// Persist the fitted constants as JSON.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(std::fs::File::create(path)?, self)?;
        tracing::info!(path = %path.display(), "Saved normalizer constants");
        Ok(())
    }

    /// Load fitted constants from JSON.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let normalizer: Self = serde_json::from_reader(
            std::fs::File::open(path)
                .map_err(|e| anyhow::anyhow!("Failed to open {}: {e}", path.display()))?,
        )?;
        Ok(normalizer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SampleLabel;
    use tempfile::TempDir;

    fn record(values: Vec<f32>) -> SampleRecord {
        SampleRecord {
            values,
            label: SampleLabel::Normal,
        }
    }

    #[test]
    fn test_fit_and_transform() {
        let records = vec![record(vec![0.0, 5.0]), record(vec![10.0, 2.5])];
        let norm = MinMaxNormalizer::fit(&records).unwrap();
        assert_eq!(norm.min_val, 0.0);
        assert_eq!(norm.max_val, 10.0);

        let scaled = norm.transform(&[0.0, 5.0, 10.0]);
        assert_eq!(scaled, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_fixed_constants_apply_to_unseen_data() {
        // Test values outside the training range land outside [0, 1]
        // rather than being rescaled with recomputed constants.
        let records = vec![record(vec![0.0, 10.0])];
        let norm = MinMaxNormalizer::fit(&records).unwrap();

        let scaled = norm.transform(&[-5.0, 15.0]);
        assert!(scaled[0] < 0.0);
        assert!(scaled[1] > 1.0);
    }

    #[test]
    fn test_transform_is_pure() {
        let records = vec![record(vec![0.0, 4.0])];
        let norm = MinMaxNormalizer::fit(&records).unwrap();
        let input = vec![1.0, 3.0];
        assert_eq!(norm.transform(&input), norm.transform(&input));
    }

    #[test]
    fn test_inverse_round_trip() {
        let records = vec![record(vec![-2.0, 6.0])];
        let norm = MinMaxNormalizer::fit(&records).unwrap();
        let original = vec![-2.0, 0.0, 3.0, 6.0];
        let restored = norm.inverse_transform(&norm.transform(&original));
        for (a, b) in original.iter().zip(&restored) {
            assert!((a - b).abs() < 1e-5, "{a} != {b}");
        }
    }

    #[test]
    fn test_degenerate_range_fails() {
        let records = vec![record(vec![3.0, 3.0]), record(vec![3.0, 3.0])];
        let err = MinMaxNormalizer::fit(&records).unwrap_err();
        assert!(matches!(err, DatasetError::DegenerateRange(v) if v == 3.0));
    }

    #[test]
    fn test_empty_fails() {
        let err = MinMaxNormalizer::fit(&[]).unwrap_err();
        assert!(matches!(err, DatasetError::Empty));
    }

    #[test]
    fn test_save_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("normalizer.json");
        let norm = MinMaxNormalizer {
            min_val: -1.5,
            max_val: 2.5,
        };
        norm.save(&path).unwrap();
        let loaded = MinMaxNormalizer::load(&path).unwrap();
        assert_eq!(norm, loaded);
    }
}

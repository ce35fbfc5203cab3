//! Mini-batch planning for reconstruction training.
//!
//! Holds normalized input/target sample pairs and produces shuffled
//! mini-batch index plans per epoch. Does NOT build tensors — the training
//! loop converts each batch via the tensor bridge, so the dataset stays
//! backend-agnostic.

use rand::seq::SliceRandom;
use rand::Rng;

/// Normalized input/target pairs for one training or validation set.
///
/// For plain reconstruction the target equals the input; for denoising the
/// trainer corrupts the input tensor per batch while the target stays clean.
#[derive(Debug, Clone)]
pub struct ReconstructionDataset {
    inputs: Vec<Vec<f32>>,
    targets: Vec<Vec<f32>>,
}

/// One mini-batch of input/target rows, cloned out of the dataset.
#[derive(Debug, Clone)]
pub struct Batch {
    pub inputs: Vec<Vec<f32>>,
    pub targets: Vec<Vec<f32>>,
}

impl ReconstructionDataset {
    /// Build a dataset where each sample reconstructs itself.
    ///
    /// # Panics
    /// Panics if samples have inconsistent widths.
    pub fn identity(samples: Vec<Vec<f32>>) -> Self {
        if let Some(first) = samples.first() {
            let dim = first.len();
            for (i, s) in samples.iter().enumerate() {
                assert_eq!(s.len(), dim, "sample {i} has width {}, expected {dim}", s.len());
            }
        }
        Self {
            targets: samples.clone(),
            inputs: samples,
        }
    }

    /// Build a dataset with distinct inputs and targets (equal lengths and
    /// widths required).
    pub fn paired(inputs: Vec<Vec<f32>>, targets: Vec<Vec<f32>>) -> Self {
        assert_eq!(
            inputs.len(),
            targets.len(),
            "inputs and targets must have equal length"
        );
        Self { inputs, targets }
    }

    /// Number of sample pairs.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Whether the dataset holds no samples.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Width of each sample, 0 when empty.
    pub fn width(&self) -> usize {
        self.inputs.first().map(Vec::len).unwrap_or(0)
    }

    /// All input rows, in stored order.
    pub fn inputs(&self) -> &[Vec<f32>] {
        &self.inputs
    }

    /// Plan one epoch of mini-batches.
    ///
    /// Indices are shuffled when `shuffle` is set; the final short batch is
    /// kept. Returns cloned rows so the caller can move them into tensors.
    pub fn epoch_batches(
        &self,
        batch_size: usize,
        shuffle: bool,
        rng: &mut impl Rng,
    ) -> Vec<Batch> {
        assert!(batch_size > 0, "batch_size must be > 0");

        let mut indices: Vec<usize> = (0..self.len()).collect();
        if shuffle {
            indices.shuffle(rng);
        }

        indices
            .chunks(batch_size)
            .map(|chunk| Batch {
                inputs: chunk.iter().map(|&i| self.inputs[i].clone()).collect(),
                targets: chunk.iter().map(|&i| self.targets[i].clone()).collect(),
            })
            .collect()
    }
}

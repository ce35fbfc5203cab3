//! Tensor bridge: utilities to convert between sample vectors (`Vec<f32>`)
//! and burn tensors.
//!
//! The dataset crate produces plain `Vec<f32>` samples; burn needs
//! `Tensor<B, 2>` batches for the models. Scores travel back the other way.

use burn::prelude::*;
use burn::tensor::TensorData;

/// Convert a batch of f32 samples to a burn 2D tensor.
///
/// # Arguments
/// - `samples`: slice of vectors, each of dimension `dim`
/// - `device`: burn device to place the tensor on
///
/// # Panics
/// Panics if samples is empty or if vectors have inconsistent lengths.
pub fn samples_to_tensor<B: Backend>(samples: &[Vec<f32>], device: &B::Device) -> Tensor<B, 2> {
    assert!(!samples.is_empty(), "samples must not be empty");
    let dim = samples[0].len();
    assert!(dim > 0, "sample dimension must be > 0");
    for (i, sample) in samples.iter().enumerate() {
        assert_eq!(
            sample.len(),
            dim,
            "sample {i} has length {}, expected {dim}",
            sample.len()
        );
    }

    let batch = samples.len();
    let flat: Vec<f32> = samples.iter().flat_map(|v| v.iter().copied()).collect();
    Tensor::from_data(TensorData::new(flat, [batch, dim]), device)
}

/// Convert a single f32 sample to a burn 2D tensor of shape `(1, dim)`.
pub fn sample_to_tensor<B: Backend>(sample: &[f32], device: &B::Device) -> Tensor<B, 2> {
    let dim = sample.len();
    assert!(dim > 0, "sample dimension must be > 0");
    Tensor::from_data(TensorData::new(sample.to_vec(), [1, dim]), device)
}

/// Extract the rows of a burn 2D tensor as f32 vectors.
pub fn tensor_to_rows<B: Backend>(tensor: Tensor<B, 2>) -> Vec<Vec<f32>> {
    let [_batch, dim] = tensor.dims();
    let flat = tensor.into_data().to_vec::<f32>().unwrap();
    flat.chunks(dim).map(|chunk| chunk.to_vec()).collect()
}

/// Extract f32 values from a burn 1D tensor.
pub fn tensor_to_vec<B: Backend>(tensor: Tensor<B, 1>) -> Vec<f32> {
    tensor.into_data().to_vec::<f32>().unwrap()
}

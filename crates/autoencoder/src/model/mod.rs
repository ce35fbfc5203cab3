//! Autoencoder model components: dense and convolutional encoder/decoder
//! stacks, and the tensor bridge between sample vectors and burn tensors.

pub mod bridge;
pub mod conv;
pub mod dense;

use burn::prelude::*;

/// Seam between models and the rest of the system.
///
/// An autoencoder, whatever its internals, maps a batch of flat samples to
/// reconstructions of the same shape. The trainer and the anomaly detector
/// only rely on this contract, so layer depth, width, and convolution vs.
/// dense are hyperparameter choices invisible to them.
pub trait Reconstructor<B: Backend> {
    /// Reconstruct a batch. Input and output shape: `(batch, dim)`.
    fn reconstruct(&self, input: Tensor<B, 2>) -> Tensor<B, 2>;
}

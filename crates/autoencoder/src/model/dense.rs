use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::activation::{relu, sigmoid};

use crate::model::Reconstructor;

/// Configuration for the dense autoencoder.
///
/// A symmetric MLP compressing each sample through a narrow latent layer
/// and expanding it back:
///
/// ```text
/// (batch, input_dim)
///   → Linear(input_dim→hidden1) → ReLU
///   → Linear(hidden1→hidden2) → ReLU
///   → Linear(hidden2→latent) → ReLU        (encoder output)
///   → Linear(latent→hidden2) → ReLU
///   → Linear(hidden2→hidden1) → ReLU
///   → Linear(hidden1→input_dim) → Sigmoid
///   → (batch, input_dim)
/// ```
///
/// The sigmoid output assumes inputs normalized to `[0, 1]`.
#[derive(Config, Debug)]
pub struct DenseAutoencoderConfig {
    /// Width of each input sample (e.g. 140 for one ECG cycle).
    pub input_dim: usize,
    /// First hidden layer dimension.
    #[config(default = 32)]
    pub hidden1: usize,
    /// Second hidden layer dimension.
    #[config(default = 16)]
    pub hidden2: usize,
    /// Latent (bottleneck) dimension.
    #[config(default = 8)]
    pub latent_dim: usize,
}

/// Dense autoencoder: MLP encoder and decoder stacks around a bottleneck.
#[derive(Module, Debug)]
pub struct DenseAutoencoder<B: Backend> {
    enc1: Linear<B>,
    enc2: Linear<B>,
    enc3: Linear<B>,
    dec1: Linear<B>,
    dec2: Linear<B>,
    dec3: Linear<B>,
}

impl DenseAutoencoderConfig {
    /// Initialize a DenseAutoencoder with the given configuration.
    pub fn init<B: Backend>(&self, device: &B::Device) -> DenseAutoencoder<B> {
        DenseAutoencoder {
            enc1: LinearConfig::new(self.input_dim, self.hidden1).init(device),
            enc2: LinearConfig::new(self.hidden1, self.hidden2).init(device),
            enc3: LinearConfig::new(self.hidden2, self.latent_dim).init(device),
            dec1: LinearConfig::new(self.latent_dim, self.hidden2).init(device),
            dec2: LinearConfig::new(self.hidden2, self.hidden1).init(device),
            dec3: LinearConfig::new(self.hidden1, self.input_dim).init(device),
        }
    }
}

impl<B: Backend> DenseAutoencoder<B> {
    /// Compress a batch into its latent representation.
    ///
    /// Input shape: `(batch, input_dim)`, output shape: `(batch, latent_dim)`.
    pub fn encode(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.enc1.forward(input));
        let x = relu(self.enc2.forward(x));
        relu(self.enc3.forward(x))
    }

    /// Expand latent representations back to sample space.
    ///
    /// Input shape: `(batch, latent_dim)`, output shape: `(batch, input_dim)`.
    pub fn decode(&self, latent: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.dec1.forward(latent));
        let x = relu(self.dec2.forward(x));
        sigmoid(self.dec3.forward(x))
    }

    /// Full forward pass: encode then decode.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        self.decode(self.encode(input))
    }
}

impl<B: Backend> Reconstructor<B> for DenseAutoencoder<B> {
    fn reconstruct(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        self.forward(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use burn::tensor::Distribution;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model = DenseAutoencoderConfig::new(140).init::<TestBackend>(&device);
        let input = Tensor::<TestBackend, 2>::random(
            [8, 140],
            Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let output = model.forward(input);
        assert_eq!(output.dims(), [8, 140]);
    }

    #[test]
    fn test_encode_shape() {
        let device = Default::default();
        let model = DenseAutoencoderConfig::new(64)
            .with_hidden1(16)
            .with_hidden2(8)
            .with_latent_dim(4)
            .init::<TestBackend>(&device);
        let input = Tensor::<TestBackend, 2>::random(
            [3, 64],
            Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let latent = model.encode(input);
        assert_eq!(latent.dims(), [3, 4]);
    }

    #[test]
    fn test_output_in_unit_interval() {
        let device = Default::default();
        let model = DenseAutoencoderConfig::new(32).init::<TestBackend>(&device);
        let input = Tensor::<TestBackend, 2>::random(
            [4, 32],
            Distribution::Normal(0.0, 3.0),
            &device,
        );
        let output = model.forward(input);

        let max: f32 = output.clone().max().into_scalar().elem();
        let min: f32 = output.min().into_scalar().elem();
        assert!(max <= 1.0, "Sigmoid output exceeded 1.0: {max}");
        assert!(min >= 0.0, "Sigmoid output below 0.0: {min}");
    }

    #[test]
    fn test_forward_deterministic() {
        let device = Default::default();
        let model = DenseAutoencoderConfig::new(16).init::<TestBackend>(&device);
        let input = Tensor::<TestBackend, 2>::random(
            [2, 16],
            Distribution::Uniform(0.0, 1.0),
            &device,
        );

        let out1 = model.forward(input.clone());
        let out2 = model.forward(input);
        let diff: f32 = (out1 - out2).abs().sum().into_scalar().elem();
        assert!(diff < 1e-7, "Repeated forward should match, diff={diff}");
    }

    #[test]
    fn test_parameter_count() {
        let device = Default::default();
        let model = DenseAutoencoderConfig::new(140).init::<TestBackend>(&device);
        let count = model.num_params();

        // Encoder: 140*32+32 + 32*16+16 + 16*8+8 = 5176
        // Decoder: 8*16+16 + 16*32+32 + 32*140+140 = 5308
        assert_eq!(count, 10_484, "Expected 10,484 params, got {count}");
    }
}

use burn::nn::conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::PaddingConfig2d;
use burn::prelude::*;
use burn::tensor::activation::{relu, sigmoid};

use crate::model::Reconstructor;

/// Configuration for the convolutional denoising autoencoder.
///
/// Operates on single-channel images:
///
/// ```text
/// (batch, 1, H, W)
///   → Conv2d(1→filters1, 3x3, stride 2) → ReLU          (H/2, W/2)
///   → Conv2d(filters1→filters2, 3x3, stride 2) → ReLU   (H/4, W/4)
///   → ConvTranspose2d(filters2→filters1, 3x3, stride 2) → ReLU
///   → ConvTranspose2d(filters1→filters1, 3x3, stride 2) → ReLU
///   → Conv2d(filters1→1, 3x3, stride 1) → Sigmoid
///   → (batch, 1, H, W)
/// ```
///
/// Height and width must be divisible by 4 so the stride-2 stages invert
/// exactly (e.g. 28x28).
#[derive(Config, Debug)]
pub struct ConvDenoiserConfig {
    /// Image height.
    pub height: usize,
    /// Image width.
    pub width: usize,
    /// Channels after the first convolution.
    #[config(default = 8)]
    pub filters1: usize,
    /// Channels at the bottleneck.
    #[config(default = 4)]
    pub filters2: usize,
}

/// Convolutional autoencoder for image denoising.
///
/// Trained with Gaussian-corrupted inputs against clean targets; at
/// inference the forward pass maps a noisy image to its cleaned estimate.
#[derive(Module, Debug)]
pub struct ConvDenoiser<B: Backend> {
    enc1: Conv2d<B>,
    enc2: Conv2d<B>,
    dec1: ConvTranspose2d<B>,
    dec2: ConvTranspose2d<B>,
    head: Conv2d<B>,
    height: usize,
    width: usize,
}

impl ConvDenoiserConfig {
    /// Initialize a ConvDenoiser with the given configuration.
    ///
    /// # Panics
    /// Panics if height or width is not divisible by 4.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvDenoiser<B> {
        assert!(
            self.height % 4 == 0 && self.width % 4 == 0,
            "image dims must be divisible by 4, got {}x{}",
            self.height,
            self.width
        );

        ConvDenoiser {
            enc1: Conv2dConfig::new([1, self.filters1], [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            enc2: Conv2dConfig::new([self.filters1, self.filters2], [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            dec1: ConvTranspose2dConfig::new([self.filters2, self.filters1], [3, 3])
                .with_stride([2, 2])
                .with_padding([1, 1])
                .with_padding_out([1, 1])
                .init(device),
            dec2: ConvTranspose2dConfig::new([self.filters1, self.filters1], [3, 3])
                .with_stride([2, 2])
                .with_padding([1, 1])
                .with_padding_out([1, 1])
                .init(device),
            head: Conv2dConfig::new([self.filters1, 1], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            height: self.height,
            width: self.width,
        }
    }
}

impl<B: Backend> ConvDenoiser<B> {
    /// Compress a batch of images to the bottleneck feature maps.
    ///
    /// Input shape: `(batch, 1, H, W)`, output: `(batch, filters2, H/4, W/4)`.
    pub fn encode(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.enc1.forward(input));
        relu(self.enc2.forward(x))
    }

    /// Expand bottleneck feature maps back to image space.
    pub fn decode(&self, latent: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = relu(self.dec1.forward(latent));
        let x = relu(self.dec2.forward(x));
        sigmoid(self.head.forward(x))
    }

    /// Full forward pass over image tensors: `(batch, 1, H, W)` in and out.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.decode(self.encode(input))
    }
}

impl<B: Backend> Reconstructor<B> for ConvDenoiser<B> {
    /// Adapter for the flat-sample contract: reshapes `(batch, H*W)` rows
    /// into images, runs the convolutional stack, and flattens back.
    fn reconstruct(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let [batch, dim] = input.dims();
        assert_eq!(
            dim,
            self.height * self.width,
            "flat sample width {dim} does not match {}x{}",
            self.height,
            self.width
        );
        let images = input.reshape([batch, 1, self.height, self.width]);
        self.forward(images).reshape([batch, dim])
    }
}

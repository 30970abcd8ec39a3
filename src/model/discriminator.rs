//! Discriminator network for DCGAN
//!
//! The Discriminator classifies 96x96 RGB images as real or fake.
//! Architecture uses strided 2D convolutions with ELU activations to
//! downsample, followed by a linear classifier.

use tch::{nn, nn::Module, nn::ModuleT, Tensor};
use tracing::debug;

use super::elu::{check_float, Elu};
use super::init::{wscale, wscale_normal};
use super::{batch_norm_config, Mode, BASE_CHANNELS, BASE_SIZE, IMAGE_CHANNELS, IMAGE_SIZE};
use crate::error::{Error, Result};

/// Discriminator network configuration
#[derive(Debug, Clone)]
pub struct DiscriminatorConfig {
    /// ELU coefficient for negative inputs
    pub elu_alpha: f64,
    /// Batch normalization epsilon
    pub bn_eps: f64,
    /// Batch normalization momentum for the running estimates
    pub bn_momentum: f64,
}

impl Default for DiscriminatorConfig {
    fn default() -> Self {
        Self {
            elu_alpha: 1.0,
            bn_eps: 2e-5,
            bn_momentum: 0.1,
        }
    }
}

/// Discriminator network
///
/// Architecture:
/// 1. `c0`: Conv2d 3 -> 64 with ELU and no normalization
/// 2. `c1`..`c3`: Conv2d (k4 s2 p1) with BatchNorm and ELU, up to 512 channels
/// 3. Flatten and `l4l` linear layer to 2 logits (real/fake)
#[derive(Debug)]
pub struct Discriminator {
    config: DiscriminatorConfig,
    elu: Elu,
    c0: nn::Conv2D,
    c1: nn::Conv2D,
    c2: nn::Conv2D,
    c3: nn::Conv2D,
    l4l: nn::Linear,
    // The first stage stays unnormalized; bn0 is only registered for the
    // checkpoint layout.
    _bn0: nn::BatchNorm,
    bn1: nn::BatchNorm,
    bn2: nn::BatchNorm,
    bn3: nn::BatchNorm,
}

fn conv(vs: nn::Path, in_channels: i64, out_channels: i64) -> nn::Conv2D {
    let ws_init = wscale_normal(wscale(4 * 4 * in_channels), &[out_channels, in_channels, 4, 4]);
    let config = nn::ConvConfig {
        stride: 2,
        padding: 1,
        ws_init,
        bs_init: nn::Init::Const(0.0),
        ..Default::default()
    };
    nn::conv2d(vs, in_channels, out_channels, 4, config)
}

impl Discriminator {
    /// Create a new Discriminator network
    pub fn new(vs: &nn::Path, config: DiscriminatorConfig) -> Self {
        let flat = BASE_SIZE * BASE_SIZE * BASE_CHANNELS;
        let bn = batch_norm_config(config.bn_eps, config.bn_momentum);

        let c0 = conv(vs / "c0", IMAGE_CHANNELS, 64);
        let c1 = conv(vs / "c1", 64, 128);
        let c2 = conv(vs / "c2", 128, 256);
        let c3 = conv(vs / "c3", 256, BASE_CHANNELS);

        let l4l = nn::linear(
            vs / "l4l",
            flat,
            2,
            nn::LinearConfig {
                ws_init: wscale_normal(wscale(flat), &[2, flat]),
                bs_init: Some(nn::Init::Const(0.0)),
                bias: true,
            },
        );

        let _bn0 = nn::batch_norm2d(vs / "bn0", 64, bn);
        let bn1 = nn::batch_norm2d(vs / "bn1", 128, bn);
        let bn2 = nn::batch_norm2d(vs / "bn2", 256, bn);
        let bn3 = nn::batch_norm2d(vs / "bn3", BASE_CHANNELS, bn);

        Self {
            elu: Elu::new(config.elu_alpha),
            config,
            c0,
            c1,
            c2,
            c3,
            l4l,
            _bn0,
            bn1,
            bn2,
            bn3,
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    ///
    /// * `images` - Tensor of shape (batch_size, 3, 96, 96)
    /// * `mode` - Whether batch norm uses batch or running statistics
    ///
    /// # Returns
    ///
    /// Tensor of shape (batch_size, 2) with logits (no softmax)
    pub fn forward_t(&self, images: &Tensor, mode: Mode) -> Result<Tensor> {
        check_float(images)?;
        let size = images.size();
        let batch_size = match size.as_slice() {
            [batch, IMAGE_CHANNELS, IMAGE_SIZE, IMAGE_SIZE] => *batch,
            _ => {
                return Err(Error::ShapeMismatch {
                    expected: format!("(batch, {}, {}, {})", IMAGE_CHANNELS, IMAGE_SIZE, IMAGE_SIZE),
                    actual: size,
                })
            }
        };
        let train = mode.is_train();

        let x = self.elu.apply(&self.c0.forward(images));
        let x = self.elu.apply(&self.bn1.forward_t(&self.c1.forward(&x), train));
        let x = self.elu.apply(&self.bn2.forward_t(&self.c2.forward(&x), train));
        let x = self.elu.apply(&self.bn3.forward_t(&self.c3.forward(&x), train));

        // Flatten and classify
        let x = x.view([batch_size, BASE_SIZE * BASE_SIZE * BASE_CHANNELS]);
        let logits = self.l4l.forward(&x);

        debug!(output = ?logits.size(), ?mode, "discriminator forward");
        Ok(logits)
    }

    /// Classify images (inference mode)
    ///
    /// Returns the two raw real/fake logits consumed by an external loss.
    pub fn classify(&self, images: &Tensor) -> Result<Tensor> {
        self.forward_t(images, Mode::Inference)
    }

    /// Get configuration
    pub fn config(&self) -> &DiscriminatorConfig {
        &self.config
    }
}

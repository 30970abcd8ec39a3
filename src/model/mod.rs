//! Model module containing the GAN architecture components
//!
//! This module provides:
//! - ELU activation with tensor and CPU kernels
//! - Generator network mapping latent vectors to 96x96 RGB images
//! - Discriminator network mapping images to real/fake logits
//! - DCGAN wrapper owning both networks and their variable stores

mod dcgan;
mod discriminator;
mod elu;
mod generator;
mod init;

pub use dcgan::Dcgan;
pub use discriminator::{Discriminator, DiscriminatorConfig};
pub use elu::{check_float, Elu};
pub use generator::{Generator, GeneratorConfig};
pub use init::{fan_in, wscale_normal};

/// Side length of the images produced by the generator
pub const IMAGE_SIZE: i64 = 96;
/// Number of color channels
pub const IMAGE_CHANNELS: i64 = 3;
/// Side length of the smallest feature map (96 / 2^4)
pub const BASE_SIZE: i64 = 6;
/// Channel depth of the smallest feature map
pub const BASE_CHANNELS: i64 = 512;

/// Whether batch normalization uses batch statistics or running estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Normalize with batch statistics and update the running estimates
    Train,
    /// Normalize with the stored running estimates
    Inference,
}

impl Mode {
    /// Flag expected by `tch` modules
    pub fn is_train(self) -> bool {
        matches!(self, Mode::Train)
    }
}

/// Batch normalization settings shared by both networks.
///
/// Defaults follow the normalization the published checkpoints were trained
/// with: eps 2e-5 and a running-average decay of 0.9.
pub(crate) fn batch_norm_config(eps: f64, momentum: f64) -> tch::nn::BatchNormConfig {
    tch::nn::BatchNormConfig {
        eps,
        momentum,
        ws_init: tch::nn::Init::Const(1.0),
        bs_init: tch::nn::Init::Const(0.0),
        ..Default::default()
    }
}

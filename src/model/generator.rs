//! Generator network for DCGAN
//!
//! The Generator transforms latent noise vectors into 96x96 RGB images.
//! Architecture projects the latent vector to a 512x6x6 feature map and
//! upsamples it with four transposed 2D convolutions.

use tch::{nn, nn::Module, nn::ModuleT, Tensor};
use tracing::debug;

use super::elu::check_float;
use super::init::{wscale, wscale_normal};
use super::{batch_norm_config, Mode, BASE_CHANNELS, BASE_SIZE, IMAGE_CHANNELS};
use crate::error::{Error, Result};

/// Generator network configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Size of the latent noise vector
    pub latent_dim: i64,
    /// Batch normalization epsilon
    pub bn_eps: f64,
    /// Batch normalization momentum for the running estimates
    pub bn_momentum: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            latent_dim: 100,
            bn_eps: 2e-5,
            bn_momentum: 0.1,
        }
    }
}

/// Generator network
///
/// Architecture:
/// 1. Linear projection `l0z` to 6*6*512 features, BatchNorm `bn0l`, ReLU
/// 2. Reshape to (512, 6, 6)
/// 3. `dc1`..`dc3`: ConvTranspose2d (k4 s2 p1) with BatchNorm and ReLU
/// 4. `dc4`: ConvTranspose2d to 3 channels, no normalization or activation
///
/// Spatial size goes 6 -> 12 -> 24 -> 48 -> 96 while channels go
/// 512 -> 256 -> 128 -> 64 -> 3.
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    l0z: nn::Linear,
    dc1: nn::ConvTranspose2D,
    dc2: nn::ConvTranspose2D,
    dc3: nn::ConvTranspose2D,
    dc4: nn::ConvTranspose2D,
    bn0l: nn::BatchNorm,
    // Registered so checkpoints keep their layout; the projection is
    // normalized by bn0l instead.
    _bn0: nn::BatchNorm,
    bn1: nn::BatchNorm,
    bn2: nn::BatchNorm,
    bn3: nn::BatchNorm,
}

fn deconv(vs: nn::Path, in_channels: i64, out_channels: i64) -> nn::ConvTranspose2D {
    let ws_init = wscale_normal(wscale(4 * 4 * in_channels), &[in_channels, out_channels, 4, 4]);
    let config = nn::ConvTransposeConfig {
        stride: 2,
        padding: 1,
        ws_init,
        bs_init: nn::Init::Const(0.0),
        ..Default::default()
    };
    nn::conv_transpose2d(vs, in_channels, out_channels, 4, config)
}

impl Generator {
    /// Create a new Generator network
    pub fn new(vs: &nn::Path, config: GeneratorConfig) -> Self {
        let projected = BASE_SIZE * BASE_SIZE * BASE_CHANNELS;
        let bn = batch_norm_config(config.bn_eps, config.bn_momentum);

        let l0z = nn::linear(
            vs / "l0z",
            config.latent_dim,
            projected,
            nn::LinearConfig {
                ws_init: wscale_normal(wscale(config.latent_dim), &[projected, config.latent_dim]),
                bs_init: Some(nn::Init::Const(0.0)),
                bias: true,
            },
        );

        let dc1 = deconv(vs / "dc1", BASE_CHANNELS, 256);
        let dc2 = deconv(vs / "dc2", 256, 128);
        let dc3 = deconv(vs / "dc3", 128, 64);
        let dc4 = deconv(vs / "dc4", 64, IMAGE_CHANNELS);

        let bn0l = nn::batch_norm1d(vs / "bn0l", projected, bn);
        let _bn0 = nn::batch_norm2d(vs / "bn0", BASE_CHANNELS, bn);
        let bn1 = nn::batch_norm2d(vs / "bn1", 256, bn);
        let bn2 = nn::batch_norm2d(vs / "bn2", 128, bn);
        let bn3 = nn::batch_norm2d(vs / "bn3", 64, bn);

        Self {
            config,
            l0z,
            dc1,
            dc2,
            dc3,
            dc4,
            bn0l,
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
    /// * `noise` - Tensor of shape (batch_size, latent_dim)
    /// * `mode` - Whether batch norm uses batch or running statistics
    ///
    /// # Returns
    ///
    /// Tensor of shape (batch_size, 3, 96, 96) with raw pixel values
    pub fn forward_t(&self, noise: &Tensor, mode: Mode) -> Result<Tensor> {
        check_float(noise)?;
        let size = noise.size();
        let batch_size = match size.as_slice() {
            [batch, dim] if *dim == self.config.latent_dim => *batch,
            [_, dim] => {
                return Err(Error::LatentDimMismatch {
                    expected: self.config.latent_dim,
                    actual: *dim,
                })
            }
            _ => {
                return Err(Error::ShapeMismatch {
                    expected: format!("(batch, {})", self.config.latent_dim),
                    actual: size,
                })
            }
        };
        let train = mode.is_train();

        // Project and reshape: (batch, latent) -> (batch, 512, 6, 6)
        let x = self.l0z.forward(noise);
        let x = self.bn0l.forward_t(&x, train).relu();
        let x = x.view([batch_size, BASE_CHANNELS, BASE_SIZE, BASE_SIZE]);

        let x = self.bn1.forward_t(&self.dc1.forward(&x), train).relu();
        let x = self.bn2.forward_t(&self.dc2.forward(&x), train).relu();
        let x = self.bn3.forward_t(&self.dc3.forward(&x), train).relu();
        let x = self.dc4.forward(&x);

        debug!(output = ?x.size(), ?mode, "generator forward");
        Ok(x)
    }

    /// Generate images (inference mode)
    pub fn generate(&self, noise: &Tensor) -> Result<Tensor> {
        self.forward_t(noise, Mode::Inference)
    }

    /// Get configuration
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn::VarStore, Device, Kind};

    fn generator(vs: &VarStore) -> Generator {
        Generator::new(&vs.root(), GeneratorConfig::default())
    }

    #[test]
    fn test_generator_output_shape() {
        let vs = VarStore::new(Device::Cpu);
        let gen = generator(&vs);

        let noise = Tensor::rand([4, 100], (Kind::Float, Device::Cpu)) * 2.0 - 1.0;
        let output = gen.generate(&noise).unwrap();

        assert_eq!(output.size(), vec![4, 3, 96, 96]);
    }

    #[test]
    fn test_zero_latent_gives_finite_image() {
        tch::manual_seed(0);
        let vs = VarStore::new(Device::Cpu);
        let gen = generator(&vs);

        let noise = Tensor::zeros([1, 100], (Kind::Float, Device::Cpu));
        let output = gen.generate(&noise).unwrap();

        assert_eq!(output.size(), vec![1, 3, 96, 96]);
        let finite = output.isfinite().all().int64_value(&[]);
        assert_eq!(finite, 1);
    }

    #[test]
    fn test_training_mode_uses_batch_statistics() {
        tch::manual_seed(1);
        let vs = VarStore::new(Device::Cpu);
        let gen = generator(&vs);

        let noise = Tensor::randn([2, 100], (Kind::Float, Device::Cpu));
        let train = gen.forward_t(&noise, Mode::Train).unwrap();
        let infer = gen.forward_t(&noise, Mode::Inference).unwrap();

        assert_eq!(train.size(), vec![2, 3, 96, 96]);
        assert!(!train.allclose(&infer, 1e-5, 1e-5, false));
    }

    #[test]
    fn test_registers_checkpoint_layout() {
        let vs = VarStore::new(Device::Cpu);
        let _gen = generator(&vs);
        let variables = vs.variables();

        for layer in ["l0z", "dc1", "dc2", "dc3", "dc4"] {
            assert!(variables.contains_key(&format!("{}.weight", layer)));
            assert!(variables.contains_key(&format!("{}.bias", layer)));
        }
        for layer in ["bn0l", "bn0", "bn1", "bn2", "bn3"] {
            assert!(variables.contains_key(&format!("{}.running_mean", layer)));
        }
        assert_eq!(variables["l0z.weight"].size(), vec![18432, 100]);
        assert_eq!(variables["dc1.weight"].size(), vec![512, 256, 4, 4]);
        assert_eq!(variables["dc4.weight"].size(), vec![64, 3, 4, 4]);
        assert_eq!(variables["bn0l.running_var"].size(), vec![18432]);
    }

    #[test]
    fn test_rejects_wrong_latent_dimension() {
        let vs = VarStore::new(Device::Cpu);
        let gen = generator(&vs);

        let noise = Tensor::zeros([1, 64], (Kind::Float, Device::Cpu));
        assert!(matches!(
            gen.generate(&noise),
            Err(Error::LatentDimMismatch { expected: 100, actual: 64 })
        ));

        let flat = Tensor::zeros([100], (Kind::Float, Device::Cpu));
        assert!(matches!(gen.generate(&flat), Err(Error::ShapeMismatch { .. })));

        let doubles = Tensor::zeros([1, 100], (Kind::Double, Device::Cpu));
        assert!(matches!(gen.generate(&doubles), Err(Error::DTypeMismatch(_))));
    }
}

//! DCGAN wrapper combining Generator and Discriminator
//!
//! Provides convenient methods for generation, discrimination and
//! checkpoint handling.

use rand::Rng;
use std::path::Path;
use tch::{nn::VarStore, Device, Tensor};

use super::discriminator::{Discriminator, DiscriminatorConfig};
use super::generator::{Generator, GeneratorConfig};
use crate::error::{Error, Result};
use crate::generation::sample_latent;
use crate::utils::{load_network_checkpoint, save_checkpoint, CheckpointMeta};

/// Complete DCGAN model
pub struct Dcgan {
    /// Generator network
    pub generator: Generator,
    /// Discriminator network
    pub discriminator: Discriminator,
    /// Variable store for generator
    pub gen_vs: VarStore,
    /// Variable store for discriminator
    pub disc_vs: VarStore,
    /// Device (CPU/GPU)
    pub device: Device,
}

impl Dcgan {
    /// Create a new DCGAN model
    ///
    /// # Arguments
    ///
    /// * `gen_config` - Generator configuration
    /// * `disc_config` - Discriminator configuration
    /// * `device` - Device to create model on
    pub fn new(gen_config: GeneratorConfig, disc_config: DiscriminatorConfig, device: Device) -> Self {
        let gen_vs = VarStore::new(device);
        let disc_vs = VarStore::new(device);

        let generator = Generator::new(&gen_vs.root(), gen_config);
        let discriminator = Discriminator::new(&disc_vs.root(), disc_config);

        Self {
            generator,
            discriminator,
            gen_vs,
            disc_vs,
            device,
        }
    }

    /// Create DCGAN with the default 100-dimensional latent space
    pub fn with_defaults(device: Device) -> Self {
        Self::new(GeneratorConfig::default(), DiscriminatorConfig::default(), device)
    }

    /// Generate images from uniformly sampled latent vectors
    ///
    /// # Returns
    ///
    /// Tensor of shape (num_samples, 3, 96, 96)
    pub fn generate<R: Rng + ?Sized>(&self, num_samples: i64, rng: &mut R) -> Result<Tensor> {
        let noise = sample_latent(num_samples, self.latent_dim(), rng, self.device)?;
        self.generator.generate(&noise)
    }

    /// Generate images from specific noise vectors
    pub fn generate_from_noise(&self, noise: &Tensor) -> Result<Tensor> {
        self.generator.generate(noise)
    }

    /// Real/fake logits for a batch of images
    pub fn discriminate(&self, images: &Tensor) -> Result<Tensor> {
        self.discriminator.classify(images)
    }

    fn meta(&self, network: &str) -> CheckpointMeta {
        CheckpointMeta::new(network, self.latent_dim(), self.discriminator.config().elu_alpha)
    }

    /// Save both networks, each with a metadata sidecar
    pub fn save<P: AsRef<Path>>(&self, gen_path: P, disc_path: P) -> Result<()> {
        save_checkpoint(&self.gen_vs, &self.meta("generator"), gen_path)?;
        save_checkpoint(&self.disc_vs, &self.meta("discriminator"), disc_path)?;
        Ok(())
    }

    /// Load both networks, validating each checkpoint and its sidecar
    /// against the architecture
    pub fn load<P: AsRef<Path>>(&mut self, gen_path: P, disc_path: P) -> Result<()> {
        let gen_meta = self.meta("generator");
        let disc_meta = self.meta("discriminator");
        load_network_checkpoint(&mut self.gen_vs, gen_path, &gen_meta)?;
        load_network_checkpoint(&mut self.disc_vs, disc_path, &disc_meta)?;
        Ok(())
    }

    /// Get latent dimension
    pub fn latent_dim(&self) -> i64 {
        self.generator.config().latent_dim
    }

    /// Stop tracking gradients for all parameters
    pub fn freeze(&mut self) {
        self.gen_vs.freeze();
        self.disc_vs.freeze();
    }

    /// Interpolate between two points in latent space
    ///
    /// Useful for visualizing smooth transitions between generated samples
    ///
    /// # Arguments
    ///
    /// * `z1` - First latent vector, shape (latent_dim,)
    /// * `z2` - Second latent vector, shape (latent_dim,)
    /// * `steps` - Number of interpolation steps, at least 2
    ///
    /// # Returns
    ///
    /// Tensor of shape (steps, 3, 96, 96)
    pub fn interpolate(&self, z1: &Tensor, z2: &Tensor, steps: i64) -> Result<Tensor> {
        if steps < 2 {
            return Err(Error::InvalidInput(format!(
                "interpolation needs at least 2 steps, got {}",
                steps
            )));
        }
        for z in [z1, z2] {
            if z.size() != [self.latent_dim()] {
                return Err(Error::ShapeMismatch {
                    expected: format!("({},)", self.latent_dim()),
                    actual: z.size(),
                });
            }
        }

        let path: Vec<Tensor> = (0..steps)
            .map(|i| {
                let alpha = i as f64 / (steps - 1) as f64;
                z1 * (1.0 - alpha) + z2 * alpha
            })
            .collect();

        self.generator.generate(&Tensor::stack(&path, 0))
    }
}

//! Image generation pipeline
//!
//! Loads a trained generator, samples latent vectors uniformly from [-1, 1),
//! runs the generator in inference mode and tiles the results into a grid.

use image::{ImageFormat, RgbImage};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use tch::{nn::VarStore, Device, Tensor};
use tracing::info;

use crate::error::{Error, Result};
use crate::imaging::{nchw_to_nhwc, tensor_to_array4, tile, to_unit_range, GridStyle};
use crate::model::{Generator, GeneratorConfig};
use crate::utils::{load_network_checkpoint, CheckpointMeta, Config};

/// Sample `num_samples` latent vectors uniformly from [-1, 1).
pub fn sample_latent<R: Rng + ?Sized>(
    num_samples: i64,
    latent_dim: i64,
    rng: &mut R,
    device: Device,
) -> Result<Tensor> {
    if num_samples <= 0 || latent_dim <= 0 {
        return Err(Error::InvalidInput(format!(
            "cannot sample {} latent vectors of dimension {}",
            num_samples, latent_dim
        )));
    }

    let uniform = Uniform::new(-1.0f32, 1.0);
    let data: Vec<f32> = uniform
        .sample_iter(rng)
        .take((num_samples * latent_dim) as usize)
        .collect();

    Ok(Tensor::from_slice(&data)
        .view([num_samples, latent_dim])
        .to_device(device))
}

/// Turn raw generator output of shape (n, 3, h, w) into a grid image.
pub fn render_images(images: &Tensor, style: &GridStyle) -> Result<RgbImage> {
    let pixels = nchw_to_nhwc(to_unit_range(&tensor_to_array4(images)?));
    tile(&pixels, style)
}

/// Generate `num_images` samples and tile them into a grid.
pub fn generate_grid<R: Rng + ?Sized>(
    generator: &Generator,
    num_images: usize,
    style: &GridStyle,
    rng: &mut R,
    device: Device,
) -> Result<RgbImage> {
    let latent_dim = generator.config().latent_dim;
    let z = sample_latent(num_images as i64, latent_dim, rng, device)?;
    let images = tch::no_grad(|| generator.generate(&z))?;
    render_images(&images, style)
}

/// Build a generator and load its weights from a checkpoint.
///
/// Fails if the checkpoint does not match the architecture. The returned
/// variable store owns the loaded parameters.
pub fn load_generator<P: AsRef<Path>>(
    path: P,
    config: GeneratorConfig,
    device: Device,
) -> Result<(VarStore, Generator)> {
    let path = path.as_ref();
    let mut vs = VarStore::new(device);
    let generator = Generator::new(&vs.root(), config);

    let expected = CheckpointMeta::new("generator", generator.config().latent_dim, 1.0);
    load_network_checkpoint(&mut vs, path, &expected)?;

    info!("Loaded generator from {}", path.display());
    Ok((vs, generator))
}

/// Everything needed to produce one grid image from a checkpoint
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Generator checkpoint
    pub model: PathBuf,
    /// Number of images in the grid
    pub num_images: usize,
    /// Output path; the extension picks the image format
    pub output: PathBuf,
    /// Seed for latent sampling
    pub seed: Option<u64>,
}

impl GenerateRequest {
    /// Request using the generation defaults of `config`
    pub fn from_config<P: AsRef<Path>>(model: P, config: &Config) -> Self {
        Self {
            model: model.as_ref().to_path_buf(),
            num_images: config.generation.num_images,
            output: PathBuf::from(&config.generation.output),
            seed: config.generation.seed,
        }
    }
}

/// Load the generator, sample a grid and write it to the output path.
pub fn run(request: &GenerateRequest, config: &Config, device: Device) -> Result<RgbImage> {
    if request.num_images == 0 {
        return Err(Error::InvalidInput("number of images must be > 0".into()));
    }
    if !request.model.is_file() {
        return Err(Error::InvalidInput(format!(
            "model checkpoint {} does not exist",
            request.model.display()
        )));
    }
    if let Err(err) = ImageFormat::from_path(&request.output) {
        return Err(Error::InvalidInput(format!(
            "cannot write {}: {}",
            request.output.display(),
            err
        )));
    }

    let (_vs, generator) = load_generator(&request.model, config.generator_config(), device)?;

    let mut rng = match request.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!("Generating {} images", request.num_images);
    let grid = generate_grid(
        &generator,
        request.num_images,
        &config.grid_style(),
        &mut rng,
        device,
    )?;

    grid.save(&request.output)?;
    info!(
        "Saved {}x{} grid to {}",
        grid.width(),
        grid.height(),
        request.output.display()
    );
    Ok(grid)
}

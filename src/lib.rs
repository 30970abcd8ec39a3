//! # DCGAN for 96x96 Image Synthesis
//!
//! This crate provides a Deep Convolutional Generative Adversarial Network
//! (DCGAN) whose discriminator uses an Exponential Linear Unit (ELU) activation,
//! together with the tooling needed to turn a trained generator checkpoint into
//! a grid of sample images.
//!
//! ## Modules
//!
//! - `model`: Generator, Discriminator, ELU activation and the DCGAN pair
//! - `generation`: Latent sampling and the checkpoint-to-image pipeline
//! - `imaging`: Grid layout and raster conversion
//! - `utils`: Clipping, configuration and checkpoint IO
//! - `error`: Library error type

pub mod error;
pub mod generation;
pub mod imaging;
pub mod model;
pub mod utils;

pub use error::{Error, Result};
pub use generation::{generate_grid, sample_latent};
pub use imaging::{grid_shape, tile, GridStyle};
pub use model::{Dcgan, Discriminator, Elu, Generator, Mode};
pub use utils::{clip, clip_tensor, clip_value, load_checkpoint, save_checkpoint, Config};

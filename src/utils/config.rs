//! Configuration management
//!
//! Provides unified configuration for model construction and image generation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::imaging::GridStyle;
use crate::model::{DiscriminatorConfig, GeneratorConfig};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model configuration
    pub model: ModelConfig,
    /// Generation configuration
    pub generation: GenerationConfig,
}

/// Model-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Latent dimension size
    pub latent_dim: i64,
    /// ELU coefficient used by the discriminator
    pub elu_alpha: f64,
    /// Batch normalization epsilon
    pub bn_eps: f64,
    /// Batch normalization momentum
    pub bn_momentum: f64,
}

/// Generation-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Number of images in the output grid
    pub num_images: usize,
    /// Output image path
    pub output: String,
    /// Seed for latent sampling; random when absent
    pub seed: Option<u64>,
    /// Pixels between grid cells
    pub padding: u32,
    /// Device: "cpu" or "cuda"
    pub device: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig {
                latent_dim: 100,
                elu_alpha: 1.0,
                bn_eps: 2e-5,
                bn_momentum: 0.1,
            },
            generation: GenerationConfig {
                num_images: 25,
                output: "tmp.png".to_string(),
                seed: None,
                padding: 2,
                device: "cpu".to_string(),
            },
        }
    }
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from TOML or JSON depending on the extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = if is_toml(path.as_ref()) {
            Self::from_toml(path)?
        } else {
            Self::from_json(path)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Save as TOML or JSON depending on the extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if is_toml(path.as_ref()) {
            self.save_toml(path)
        } else {
            self.save_json(path)
        }
    }

    /// Get device from configuration
    pub fn get_device(&self) -> tch::Device {
        match self.generation.device.to_lowercase().as_str() {
            "cuda" | "gpu" => {
                if tch::Cuda::is_available() {
                    tch::Device::Cuda(0)
                } else {
                    tracing::warn!("CUDA requested but not available, falling back to CPU");
                    tch::Device::Cpu
                }
            }
            _ => tch::Device::Cpu,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.latent_dim <= 0 {
            return Err(Error::Config("latent dimension must be > 0".into()));
        }
        if !(self.model.elu_alpha.is_finite() && self.model.elu_alpha >= 0.0) {
            return Err(Error::Config("ELU alpha must be a finite, non-negative number".into()));
        }
        if self.model.bn_eps.is_nan() || self.model.bn_eps <= 0.0 {
            return Err(Error::Config("batch norm epsilon must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.model.bn_momentum) {
            return Err(Error::Config("batch norm momentum must be in [0, 1]".into()));
        }
        if self.generation.num_images == 0 {
            return Err(Error::Config("number of images must be > 0".into()));
        }
        if self.generation.output.is_empty() {
            return Err(Error::Config("output path must not be empty".into()));
        }
        Ok(())
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            latent_dim: self.model.latent_dim,
            bn_eps: self.model.bn_eps,
            bn_momentum: self.model.bn_momentum,
        }
    }

    pub fn discriminator_config(&self) -> DiscriminatorConfig {
        DiscriminatorConfig {
            elu_alpha: self.model.elu_alpha,
            bn_eps: self.model.bn_eps,
            bn_momentum: self.model.bn_momentum,
        }
    }

    pub fn grid_style(&self) -> GridStyle {
        GridStyle {
            padding: self.generation.padding,
            ..Default::default()
        }
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("toml")
}

/// Create default configuration file if it doesn't exist
pub fn ensure_config_exists<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if path.exists() {
        Config::load(path)
    } else {
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }
}

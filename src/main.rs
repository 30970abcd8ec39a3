//! DCGAN for 96x96 Image Synthesis
//!
//! Main entry point providing CLI interface for:
//! - Generating sample grids from a trained generator
//! - Scoring images with a trained discriminator
//! - Inspecting checkpoints
//! - Writing freshly initialized checkpoints and default configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tch::nn::VarStore;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rust_dcgan_images::{
    generation::{self, GenerateRequest},
    imaging::load_image,
    model::{Dcgan, Discriminator},
    utils::{
        ensure_config_exists, inspect_checkpoint, load_network_checkpoint, CheckpointMeta, Config,
    },
};

/// DCGAN for synthetic 96x96 images
#[derive(Parser)]
#[command(name = "dcgan")]
#[command(version = "0.1.0")]
#[command(about = "Generate and score 96x96 images with a DCGAN")]
struct Cli {
    /// Path to configuration file (TOML or JSON); defaults are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a grid of samples from a generator checkpoint
    Generate {
        /// Path to trained generator checkpoint
        #[arg(short, long)]
        model: PathBuf,

        /// Number of images to generate
        #[arg(short, long)]
        num: Option<usize>,

        /// Output image path
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Seed for latent sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Use GPU if available
        #[arg(long)]
        gpu: bool,
    },

    /// Print real/fake logits of a discriminator checkpoint for image files
    Classify {
        /// Path to trained discriminator checkpoint
        #[arg(short, long)]
        model: PathBuf,

        /// Images to score
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// List tensor names and shapes stored in a checkpoint
    Inspect {
        /// Checkpoint file
        path: PathBuf,
    },

    /// Write randomly initialized generator and discriminator checkpoints
    InitWeights {
        /// Output directory
        #[arg(short, long, default_value = "checkpoints")]
        output: PathBuf,

        /// Seed for weight initialization
        #[arg(long, default_value = "0")]
        seed: i64,
    },

    /// Initialize default configuration file
    Init {
        /// Output configuration file path
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.verbosity.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Generate {
            model,
            num,
            out,
            seed,
            gpu,
        } => {
            let mut config = config;
            if gpu {
                config.generation.device = "cuda".to_string();
            }
            let mut request = GenerateRequest::from_config(&model, &config);
            if let Some(num) = num {
                request.num_images = num;
            }
            if let Some(out) = out {
                request.output = out;
            }
            if seed.is_some() {
                request.seed = seed;
            }

            let device = config.get_device();
            generation::run(&request, &config, device)
                .with_context(|| format!("failed to generate from {}", model.display()))?;
        }
        Commands::Classify { model, images } => {
            classify(&config, &model, &images)?;
        }
        Commands::Inspect { path } => {
            let entries = inspect_checkpoint(&path)
                .with_context(|| format!("failed to read checkpoint {}", path.display()))?;
            let total: i64 = entries.iter().map(|(_, shape)| shape.iter().product::<i64>()).sum();

            for (name, shape) in &entries {
                println!("{:<24} {:?}", name, shape);
            }
            println!("{} tensors, {} values", entries.len(), total);
        }
        Commands::InitWeights { output, seed } => {
            tch::manual_seed(seed);
            let dcgan = Dcgan::new(
                config.generator_config(),
                config.discriminator_config(),
                tch::Device::Cpu,
            );
            dcgan.save(output.join("generator.ot"), output.join("discriminator.ot"))?;
            info!("Wrote initial weights to {} (seed {})", output.display(), seed);
        }
        Commands::Init { output } => {
            ensure_config_exists(&output)?;
            info!("Configuration written to {}", output.display());
        }
    }

    Ok(())
}

/// Score images with a discriminator checkpoint.
///
/// Prints one line per image: path, real logit, fake logit.
fn classify(config: &Config, model: &Path, images: &[PathBuf]) -> Result<()> {
    let device = config.get_device();
    let mut vs = VarStore::new(device);
    let discriminator = Discriminator::new(&vs.root(), config.discriminator_config());
    let expected = CheckpointMeta::new(
        "discriminator",
        config.model.latent_dim,
        discriminator.config().elu_alpha,
    );
    load_network_checkpoint(&mut vs, model, &expected)
        .with_context(|| format!("failed to load discriminator {}", model.display()))?;
    info!("Loaded discriminator from {}", model.display());

    for path in images {
        let image = load_image(path, device)
            .with_context(|| format!("failed to read image {}", path.display()))?;
        let logits = tch::no_grad(|| discriminator.classify(&image))?;
        let real = logits.double_value(&[0, 0]);
        let fake = logits.double_value(&[0, 1]);
        println!("{}\t{:.6}\t{:.6}", path.display(), real, fake);
    }

    Ok(())
}

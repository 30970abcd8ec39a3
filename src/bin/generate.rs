//! Standalone binary for generating a grid of sample images
//!
//! Usage:
//!   cargo run --bin generate -- --model generator.ot --num 25 --out tmp.png

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rust_dcgan_images::{
    generation::{self, GenerateRequest},
    utils::Config,
};

/// Generate 96x96 images with a trained DCGAN generator
#[derive(Parser)]
#[command(name = "generate")]
#[command(about = "Generate a grid of images using a trained DCGAN generator")]
struct Args {
    /// Path to the generator checkpoint
    #[arg(short, long)]
    model: PathBuf,

    /// Number of images to generate
    #[arg(short, long, default_value = "25", value_parser = clap::value_parser!(u32).range(1..))]
    num: u32,

    /// Output image file; the extension picks the format
    #[arg(short, long, default_value = "tmp.png")]
    out: PathBuf,

    /// Seed for latent sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Use GPU if available
    #[arg(long)]
    gpu: bool,
}

fn main() -> Result<()> {
    // Setup logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = Config::default();
    if args.gpu {
        config.generation.device = "cuda".to_string();
    }
    let device = config.get_device();
    info!("Using {:?}", device);

    let request = GenerateRequest {
        model: args.model,
        num_images: args.num as usize,
        output: args.out,
        seed: args.seed,
    };

    generation::run(&request, &config, device)
        .with_context(|| format!("failed to generate images from {}", request.model.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["generate", "--model", "generator.ot"]).unwrap();

        assert_eq!(args.model, PathBuf::from("generator.ot"));
        assert_eq!(args.num, 25);
        assert_eq!(args.out, PathBuf::from("tmp.png"));
        assert_eq!(args.seed, None);
        assert!(!args.gpu);
    }

    #[test]
    fn test_short_flags() {
        let args =
            Args::try_parse_from(["generate", "-m", "g.safetensors", "-n", "9", "-o", "grid.jpg"])
                .unwrap();

        assert_eq!(args.model, PathBuf::from("g.safetensors"));
        assert_eq!(args.num, 9);
        assert_eq!(args.out, PathBuf::from("grid.jpg"));
    }

    #[test]
    fn test_model_is_required() {
        assert!(Args::try_parse_from(["generate"]).is_err());
        assert!(Args::try_parse_from(["generate", "--num", "4"]).is_err());
    }

    #[test]
    fn test_zero_images_rejected() {
        assert!(Args::try_parse_from(["generate", "-m", "g.ot", "--num", "0"]).is_err());
    }
}

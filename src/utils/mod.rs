//! Utility module with helper functions
//!
//! This module provides:
//! - Clipping of pixel values into [-1, 1]
//! - Configuration handling
//! - Checkpoint save/load utilities

mod checkpoint;
mod clip;
mod config;

pub use checkpoint::{
    inspect_checkpoint, load_checkpoint, load_checkpoint_meta, load_network_checkpoint, meta_path,
    normalize_name, read_named_tensors, save_checkpoint, CheckpointMeta,
};
pub use clip::{clip, clip_tensor, clip_value};
pub use config::{ensure_config_exists, Config, GenerationConfig, ModelConfig};

//! Error types for the DCGAN library

use tch::Kind;
use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Tensor element type is not 32-bit float
    #[error("expected a float32 tensor, got {0:?}")]
    DTypeMismatch(Kind),

    /// Tensor or array has the wrong shape
    #[error("invalid shape: expected {expected}, got {actual:?}")]
    ShapeMismatch { expected: String, actual: Vec<i64> },

    /// Latent vectors do not match the generator
    #[error("latent dimension mismatch: model expects {expected}, got {actual}")]
    LatentDimMismatch { expected: i64, actual: i64 },

    /// Checkpoint was trained with a different ELU coefficient
    #[error("ELU alpha mismatch: model uses {expected}, checkpoint was saved with {actual}")]
    EluAlphaMismatch { expected: f64, actual: f64 },

    /// Checkpoint does not contain a parameter the model declares
    #[error("checkpoint {path} is missing parameter `{name}`")]
    MissingParameter { path: String, name: String },

    /// Checkpoint parameter has a shape incompatible with the architecture
    #[error("checkpoint parameter `{name}` has shape {found:?}, model expects {expected:?}")]
    ParameterShape {
        name: String,
        expected: Vec<i64>,
        found: Vec<i64>,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Error raised by libtorch
    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),

    /// ndarray shape error
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Image encoding/decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error means the checkpoint does not fit the architecture
    pub fn is_checkpoint_mismatch(&self) -> bool {
        matches!(
            self,
            Error::MissingParameter { .. }
                | Error::ParameterShape { .. }
                | Error::LatentDimMismatch { .. }
                | Error::EluAlphaMismatch { .. }
        )
    }
}

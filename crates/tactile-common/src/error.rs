//! Error types for the tactile-map boundaries.
//!
//! The pipeline stages themselves never fail; these errors cover reading
//! configuration, decoding input images and encoding outputs.

use thiserror::Error;

/// Result type alias using TactileError.
pub type TactileResult<T> = Result<T, TactileError>;

/// Primary error type for tactile-map operations.
#[derive(Debug, Error)]
pub enum TactileError {
    // === Configuration Errors ===
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    // === Image Errors ===
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(String),
}

impl TactileError {
    /// Process exit code the CLI uses for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            TactileError::ConfigParse(_) | TactileError::InvalidConfig { .. } => 2,
            TactileError::Decode(_) | TactileError::UnsupportedFormat(_) => 3,
            TactileError::Encode(_) => 4,
            TactileError::Io(_) => 5,
        }
    }
}

impl From<std::io::Error> for TactileError {
    fn from(err: std::io::Error) -> Self {
        TactileError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TactileError {
    fn from(err: serde_json::Error) -> Self {
        TactileError::ConfigParse(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for TactileError {
    fn from(err: serde_yaml::Error) -> Self {
        TactileError::ConfigParse(format!("YAML error: {}", err))
    }
}

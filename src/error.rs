//! Configuration errors for Scorch.
//!
//! Everything here is raised while building, preparing or restoring the
//! processing chain. The audio path itself never returns an error.

use thiserror::Error;

/// Result type alias for configuration-time operations
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unknown parameter id: {id}")]
    UnknownParameter { id: String },

    #[error("Unsupported channel layout: {inputs} in / {outputs} out (mono or stereo only)")]
    UnsupportedLayout { inputs: usize, outputs: usize },

    #[error("Invalid sample rate: {sample_rate}")]
    InvalidSampleRate { sample_rate: f32 },

    #[error("Invalid maximum block size: {max_block_size}")]
    InvalidBlockSize { max_block_size: usize },

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Snapshot(err.to_string())
    }
}

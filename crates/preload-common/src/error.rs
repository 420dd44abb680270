//! Error types shared across the preload workspace

use thiserror::Error;

/// Result type alias for preload operations
pub type Result<T> = std::result::Result<T, PreloadError>;

/// Errors raised outside the import pipeline proper: configuration,
/// persisted state and logging setup.
#[derive(Error, Debug)]
pub enum PreloadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("State store error: {0}")]
    State(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl PreloadError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a state store error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }
}

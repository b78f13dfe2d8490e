//! Error types for Alybot

use thiserror::Error;

/// Result type alias for Alybot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Alybot
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Sound file decoding error
    #[error("decode error: {0}")]
    Decode(String),

    /// Command file parsing error
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Voice connection could not be established
    #[error("connection error: {0}")]
    Connection(String),

    /// A playback is already in progress
    #[error("voice playback already in progress")]
    Busy,

    /// Operation did not finish in time
    #[error("timed out: {0}")]
    Timeout(String),

    /// Malformed bot command payload
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Channel (messaging) error
    #[error("channel error: {0}")]
    Channel(String),

    /// Voice transport error
    #[error("voice error: {0}")]
    Voice(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),
}

//! Error types for strings-processor
//!
//! The string transforms themselves never fail. Errors only arise in the
//! layers around them: loading configuration and moving metrics in and out.

use thiserror::Error;

/// Metric encoding/decoding errors
#[derive(Error, Debug)]
pub enum CodecError {
    /// Malformed line protocol input
    #[error("Invalid line protocol: {0}")]
    LineProtocol(String),

    /// Malformed JSON input, or a JSON encoding failure
    #[error("Invalid JSON metric: {0}")]
    Json(#[from] serde_json::Error),

    /// Metric cannot be represented in the output format
    #[error("Cannot encode metric '{name}': {reason}")]
    Unencodable { name: String, reason: String },

    /// Underlying reader or writer failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Whether the error concerns a single line rather than the stream
    ///
    /// Per-line errors let the reader skip ahead; I/O errors end the stream.
    pub fn is_per_line(&self) -> bool {
        !matches!(self, CodecError::Io(_))
    }
}

/// Result type alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Codec error
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// I/O error opening input or output
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

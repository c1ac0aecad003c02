//! Error types for qagraph.
//!
//! Library crates use [`QaGraphError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all qagraph operations.
#[derive(Debug, thiserror::Error)]
pub enum QaGraphError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level HTTP error while talking to an NLP service.
    #[error("network error: {0}")]
    Network(String),

    /// An NLP service answered, but with an error status or unusable payload.
    #[error("service error ({service}): {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    /// JSON parsing error for a dataset file.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (schema mismatch, invalid span, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The fused graph does not cover the record's tokens one-to-one.
    #[error(
        "graph token mismatch for record {id}: input has {expected} tokens, graph has {actual}"
    )]
    GraphMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QaGraphError>;

impl QaGraphError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a service error tagged with the service name.
    pub fn service(service: &'static str, msg: impl Into<String>) -> Self {
        Self::Service {
            service,
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

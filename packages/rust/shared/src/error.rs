//! Error types for readmegen.
//!
//! Library crates use [`ReadmeGenError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all readmegen operations.
#[derive(Debug, thiserror::Error)]
pub enum ReadmeGenError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Repository ingestion cannot produce a usable context. Fatal.
    #[error("repository processing error: {message}")]
    Repository { message: String },

    /// Unknown LLM backend configured. Fatal, raised before any request.
    #[error("unsupported LLM service: {service}")]
    UnsupportedService { service: String },

    /// Cloning or copying the repository failed.
    #[error("git error: {0}")]
    Git(String),

    /// Network/HTTP error outside a specific prompt job (e.g. metadata fetch).
    #[error("network error: {0}")]
    Network(String),

    /// A single prompt job failed. Non-fatal at the batch level: the
    /// dispatcher records it at the job's position and continues.
    #[error("request {index} failed: {message}")]
    Request { index: usize, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed manifest, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ReadmeGenError>;

impl ReadmeGenError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a repository processing error from any displayable message.
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository {
            message: msg.into(),
        }
    }

    /// Create a per-job request error carrying the job index.
    pub fn request(index: usize, msg: impl Into<String>) -> Self {
        Self::Request {
            index,
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
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

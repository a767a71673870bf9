//! Error types for Sakbe operations.
//!
//! This module provides the common `Error` type and `Result<T>` alias used
//! across all Sakbe crates. Uses `thiserror` for derive macros.
//!
//! Call sites construct errors through the helper methods
//! (`Error::validation(...)`, `Error::io_with_path(...)`) rather than
//! spelling variants, and the retry layer classifies failures with
//! [`Error::is_retryable`].

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur in Sakbe operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before it touched any state.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A vector that cannot be normalized or does not fit the index.
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// No backend registered for the language and no fallback configured.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// An embedding backend failed; the failure may be transient.
    #[error("Embedding backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A snapshot or cache artifact could not be written or read.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Item not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error annotated with the path that caused it.
    #[error("I/O error at {path}: {source}")]
    IoPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an invalid vector error.
    pub fn invalid_vector(msg: impl Into<String>) -> Self {
        Self::InvalidVector(msg.into())
    }

    /// Create an unsupported language error.
    pub fn unsupported_language(language: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(language.into())
    }

    /// Create a backend unavailable error.
    pub fn backend_unavailable(msg: impl Into<String>) -> Self {
        Self::BackendUnavailable(msg.into())
    }

    /// Create a persistence error.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an I/O error annotated with the offending path.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Whether retrying the failed operation could plausibly succeed.
    ///
    /// Backend outages and I/O failures are transient; everything else
    /// reflects bad input or corrupt state and retrying would only repeat
    /// the failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable(_) | Self::Io(_) | Self::IoPath { .. }
        )
    }
}

/// Result type alias using Sakbe's Error type.
pub type Result<T> = std::result::Result<T, Error>;

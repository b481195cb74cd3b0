//! Error types for mdatlas.
//!
//! This module defines a unified error enum that covers every failure category
//! in the workspace: configuration, file I/O, access control, section lookup,
//! output formats, parsing, structure validation and the RPC protocol.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for mdatlas.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic: errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors without a more specific context
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be read from disk
    #[error("Failed to read file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Path rejected by the access-control gate
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Requested section ID is not present in the document
    #[error("Section not found: {id}")]
    SectionNotFound { id: String },

    /// Requested output format is not supported
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Markdown grammar or parser setup errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// A document structure failed validation
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// JSON-RPC / MCP protocol errors
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Build a [`AppError::FileRead`] for `path`.
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Whether this error was caused by the caller's input rather than the environment.
    ///
    /// Input errors are never worth retrying.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AppError::SectionNotFound { .. }
                | AppError::UnsupportedFormat(_)
                | AppError::AccessDenied(_)
        )
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

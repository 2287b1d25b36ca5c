/// Triplesh Error Module
///
/// This module defines the error types shared by the shell, the quad store
/// and the query-language sessions.
use std::time::Duration;
use thiserror::Error;

/// Error type for the triplesh application.
///
/// Most variants are recoverable: the REPL prints them and keeps reading.
/// `LineTooLong` is the exception and ends the process.
#[derive(Error, Debug)]
pub enum ShellError {
    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed TOML in the configuration file
    #[error("Configuration error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON encoding errors raised while producing results
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Query evaluation errors
    #[error("Query error: {0}")]
    Query(String),

    /// A session gave up after its configured time budget
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// The quad store could not complete an operation
    #[error("Store error: {0}")]
    Store(String),

    /// An input line exceeded the reader's length limit
    #[error("Line too long: input lines are limited to {limit} bytes")]
    LineTooLong { limit: usize },
}

/// Type alias for Result to use ShellError as the error type.
pub type Result<T> = std::result::Result<T, ShellError>;

//! Common error types for the skills matrix

use thiserror::Error;

/// Common result type for skills matrix operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by the skills matrix crates
///
/// The Filter Engine and Matrix Aggregator never produce these; they cover
/// configuration loading and local file persistence only.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

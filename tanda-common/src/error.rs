//! Common error types for tanda tools

use thiserror::Error;

/// Common result type for tanda operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across tanda crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or malformed data
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

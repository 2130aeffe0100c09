//! Error types for backing media

use std::io;
use thiserror::Error;

/// Errors raised by a backing medium
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Key cannot be mapped onto this medium
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Result type alias for medium operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

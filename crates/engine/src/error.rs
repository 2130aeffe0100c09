//! Error types for the store engine

use shapestore_core::{format_paths, KeyPath};
use shapestore_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by [`Store`](crate::Store) operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Structural misuse: bad path, invalid schema, cyclic default
    #[error(transparent)]
    Core(#[from] shapestore_core::Error),

    /// Backing medium failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Value could not be serialized for saving
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation failed and no invalid-value handler is registered
    #[error("invalid value at {}", format_paths(.paths))]
    InvalidValue {
        /// Absolute paths that failed validation
        paths: Vec<KeyPath>,
    },

    /// The medium changed since this store last read or wrote it, and no
    /// conflict handler is registered
    #[error("conflict: medium holds {current:?}, store last saw {baseline:?}")]
    Conflict {
        /// What the medium holds now
        current: Option<String>,
        /// What this store last observed
        baseline: Option<String>,
    },

    /// Rejected configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal failure (thread spawn, config file I/O)
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Whether this error reports a save conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    /// Whether this error reports a validation failure
    pub fn is_invalid_value(&self) -> bool {
        matches!(self, StoreError::InvalidValue { .. })
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_display() {
        let err = StoreError::InvalidValue {
            paths: vec![KeyPath::root().key("version"), KeyPath::root().key("str")],
        };
        assert_eq!(err.to_string(), "invalid value at [version, str]");
        assert!(err.is_invalid_value());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_conflict_display() {
        let err = StoreError::Conflict {
            current: Some("{\"n\":1}".to_string()),
            baseline: None,
        };
        assert!(err.to_string().starts_with("conflict: medium holds"));
        assert!(err.is_conflict());
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err = StoreError::from(shapestore_core::Error::CircularReference);
        assert_eq!(err.to_string(), shapestore_core::Error::CircularReference.to_string());
    }
}

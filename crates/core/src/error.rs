//! Error types for shapestore core
//!
//! Structural errors raised by path traversal, graph cloning and schema
//! construction. These indicate misuse rather than bad data: validation
//! failures are not errors and are reported through [`crate::Validation`].
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::path::{format_paths, KeyPath};
use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for shapestore core
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A traversal walked past a value that cannot be indexed,
    /// or past a type node that declares no such field
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The full path being traversed
        path: KeyPath,
        /// What went wrong along the way
        reason: String,
    },

    /// The same object instance was reached twice during one deep clone
    #[error("circular reference detected while cloning")]
    CircularReference,

    /// A type's default value does not satisfy the type itself
    #[error("default value is invalid at {}", format_paths(.paths))]
    InvalidDefaultValue {
        /// Failing paths, relative to the default value
        paths: Vec<KeyPath>,
    },

    /// Type options are contradictory or malformed
    #[error("invalid schema options: {0}")]
    InvalidSchemaOptions(String),
}

impl Error {
    /// Build an [`Error::InvalidPath`]
    pub fn invalid_path(path: &KeyPath, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_path() {
        let path = KeyPath::root().key("a").key("b");
        let err = Error::invalid_path(&path, "cannot index into number");
        let msg = err.to_string();
        assert!(msg.contains("invalid path 'a.b'"));
        assert!(msg.contains("cannot index into number"));
    }

    #[test]
    fn test_error_display_circular_reference() {
        let err = Error::CircularReference;
        assert!(err.to_string().contains("circular reference"));
    }

    #[test]
    fn test_error_display_invalid_default() {
        let err = Error::InvalidDefaultValue {
            paths: vec![KeyPath::root(), KeyPath::root().key("name")],
        };
        let msg = err.to_string();
        assert!(msg.contains("<root>"));
        assert!(msg.contains("name"));
    }

    #[test]
    fn test_error_display_schema_options() {
        let err = Error::InvalidSchemaOptions("null and undefined both disabled".to_string());
        assert!(err.to_string().contains("invalid schema options"));
    }

    #[test]
    fn test_error_pattern_matching() {
        let err = Error::invalid_path(&KeyPath::root().key("x"), "missing");
        match err {
            Error::InvalidPath { path, reason } => {
                assert_eq!(path.to_path_string(), "x");
                assert_eq!(reason, "missing");
            }
            _ => panic!("Wrong error variant"),
        }
    }
}

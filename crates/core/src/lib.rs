//! Core types for shapestore
//!
//! This crate defines the foundational pieces used by the store engine:
//! - KeyPath / Selector: addressing nested locations in a JSON value
//! - Path operations: get, set, delete and existence probes by key path
//! - Node / deep_clone: shared value graphs and cycle-checked copying
//! - Type: closed set of structural validators with default values
//! - infer_type: best-effort Type from an example value
//! - Error: structural error type

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod graph;
pub mod infer;
pub mod path;
pub mod schema;

pub use error::{Error, Result};
pub use graph::{deep_clone, Node};
pub use infer::infer_type;
pub use path::{
    delete_by_path, format_paths, get_by_path, get_by_path_mut, parse_path, set_by_path,
    test_path, KeyPath, Selector, MAX_ARRAY_GAP,
};
pub use schema::{Type, Validation};

/// Re-exported so callers build values with the same JSON type
pub use serde_json::{json, Value};

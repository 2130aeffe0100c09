//! shapestore - Schema-validated, path-addressable value store
//!
//! Declare the shape of a value as a [`Type`] tree, load it from a backing
//! [`Medium`], and read or write individual sub-paths. Every write is
//! validated against the sub-type at its path; invalid stored values are
//! repaired from defaults; saves are debounced and refuse to overwrite
//! changes made by another agent.
//!
//! # Quick Start
//!
//! ```
//! use shapestore::{json, MemoryMedium, Store, Type};
//! use std::sync::Arc;
//!
//! let schema = Type::dictionary()
//!     .field("version", Type::number().integer(true).min(0.0).default_value(json!(1)).build()?)
//!     .field("greeting", Type::string().default_value(json!("Hello, world!")).build()?)
//!     .build()?;
//!
//! let store = Store::builder("settings")
//!     .schema(schema)
//!     .on_invalid(|paths| eprintln!("rejected: {:?}", paths))
//!     .open(Arc::new(MemoryMedium::new()))?;
//!
//! assert_eq!(store.get("greeting")?, Some(json!("Hello, world!")));
//! assert!(!store.set("version", json!(-1))?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! - `shapestore-core`: key paths, path utilities, the `Type` system, inference
//! - `shapestore-storage`: the `Medium` trait with memory and file backends
//! - `shapestore-engine`: `Store`, `StoreBuilder`, `StoreConfig`

pub use shapestore_core::{
    deep_clone, delete_by_path, format_paths, get_by_path, get_by_path_mut, infer_type, json,
    parse_path, set_by_path, test_path, Error, KeyPath, Node, Result, Selector, Type, Validation,
    Value,
};
pub use shapestore_engine::{
    ConflictHandler, InvalidHandler, Store, StoreBuilder, StoreConfig, StoreError, StoreResult,
    CONFIG_FILE_NAME,
};
pub use shapestore_storage::{FileMedium, Medium, MemoryMedium, StorageError, StorageResult};

/// Type builders and variant structs
pub mod schema {
    pub use shapestore_core::schema::*;
}

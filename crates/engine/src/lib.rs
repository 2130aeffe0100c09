//! Store engine for shapestore
//!
//! Orchestrates a schema-validated value held in memory against a backing
//! medium:
//! - Store: load, validate, repair, path reads and writes, save
//! - StoreBuilder: fluent construction and opening
//! - StoreConfig: behaviour flags, loadable from `shapestore.toml`
//! - Debounced saves on a dedicated worker thread
//! - Optimistic conflict detection against the medium

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
mod debounce;
pub mod error;
mod repair;
pub mod store;

pub use builder::StoreBuilder;
pub use config::{StoreConfig, CONFIG_FILE_NAME};
pub use error::{StoreError, StoreResult};
pub use store::{ConflictHandler, InvalidHandler, Store};

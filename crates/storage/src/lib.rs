//! Backing media for shapestore
//!
//! A medium is a synchronous key-value store of strings. Stores read the
//! serialized value from it on load and write back on save.
//! - Medium: the trait every backend implements
//! - MemoryMedium: in-process map, plus the process-wide ambient instance
//! - FileMedium: one JSON file per key in a directory

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod file;
pub mod medium;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileMedium;
pub use medium::Medium;
pub use memory::MemoryMedium;

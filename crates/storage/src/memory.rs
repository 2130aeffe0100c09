//! In-process medium

use crate::error::StorageResult;
use crate::medium::Medium;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Process-wide medium handed out by [`MemoryMedium::ambient`]
static AMBIENT: Lazy<Arc<MemoryMedium>> = Lazy::new(|| Arc::new(MemoryMedium::new()));

/// A medium backed by a map in memory
///
/// Cloning the `Arc` around one instance lets several stores observe each
/// other's writes, which is how two agents sharing a key are modelled.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryMedium {
    /// Create an empty medium
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared medium used when a store is opened without one
    pub fn ambient() -> Arc<MemoryMedium> {
        Arc::clone(&AMBIENT)
    }

    /// Remove a key, returning what was stored
    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().remove(key)
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Medium for MemoryMedium {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        trace!(target: "shapestore::storage", key, bytes = value.len(), "memory write");
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

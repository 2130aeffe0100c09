//! The backing medium trait

use crate::error::StorageResult;

/// A synchronous key-value store of serialized values
///
/// `read` returns `None` when nothing is stored under `key`. Implementations
/// must be shareable across threads, since a store's debounced save runs on
/// its own worker thread.
pub trait Medium: Send + Sync {
    /// Read the raw string stored under `key`
    fn read(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the raw string stored under `key`
    fn write(&self, key: &str, value: &str) -> StorageResult<()>;
}

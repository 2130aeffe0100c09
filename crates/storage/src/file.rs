//! Directory-backed medium
//!
//! Each key is stored as `<dir>/<key>.json`. Writes go to a uniquely named
//! sibling temp file which is fsynced and renamed over the target, so a reader
//! never observes a half-written value.

use crate::error::{StorageError, StorageResult};
use crate::medium::Medium;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Distinguishes temp files of concurrent writes to the same key
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A medium storing one file per key
#[derive(Debug, Clone)]
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    /// Open a medium rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(FileMedium { dir })
    }

    /// Directory holding the stored files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds `key`
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

fn validate_key(key: &str) -> StorageResult<()> {
    let bad = key.is_empty()
        || key == "."
        || key.contains("..")
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0');
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

impl Medium for FileMedium {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let temp_path = self.dir.join(format!(
            "{}.json.{}.{}.tmp",
            key,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = persist(&temp_path, &path, value) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        // Directory fsync is not supported everywhere; the rename already landed.
        if let Ok(dir) = File::open(&self.dir) {
            let _ = dir.sync_all();
        }

        debug!(target: "shapestore::storage", path = %path.display(), bytes = value.len(), "wrote file");
        Ok(())
    }
}

/// Write `value` to `temp_path`, fsync it, and rename it over `path`
fn persist(temp_path: &Path, path: &Path, value: &str) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(temp_path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp_path, path)
}

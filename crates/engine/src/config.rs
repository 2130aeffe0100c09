//! Store configuration via `shapestore.toml`
//!
//! Every flag has a documented default, so an empty file (or no file at all)
//! yields the same behaviour as [`StoreConfig::default`]. Callbacks are not
//! part of the file; attach them through [`StoreBuilder`](crate::StoreBuilder).

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "shapestore.toml";

/// Behaviour flags for a [`Store`](crate::Store).
///
/// # Example
///
/// ```toml
/// delay_ms = 250
/// secure = true
/// auto_fix = true
/// path_separator = "/"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Save debounce in milliseconds. `0` saves synchronously.
    #[serde(default)]
    pub delay_ms: u64,
    /// Skip the load normally performed when the store is opened.
    #[serde(default)]
    pub lazy_load: bool,
    /// Reserved. Accepted and persisted but not consulted by `load`.
    #[serde(default)]
    pub strict_load: bool,
    /// Compare the medium against the last observed value before saving.
    #[serde(default = "default_true")]
    pub secure: bool,
    /// Repair invalid loaded values instead of rejecting the load.
    #[serde(default = "default_true")]
    pub auto_fix: bool,
    /// Separator used to split string selectors into keys.
    #[serde(default = "default_separator")]
    pub path_separator: String,
}

fn default_true() -> bool {
    true
}

fn default_separator() -> String {
    ".".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            delay_ms: 0,
            lazy_load: false,
            strict_load: false,
            secure: true,
            auto_fix: true,
            path_separator: default_separator(),
        }
    }
}

impl StoreConfig {
    /// Save debounce as a duration.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Whether saves are deferred to the worker thread.
    pub fn is_debounced(&self) -> bool {
        self.delay_ms > 0
    }

    /// Check option values.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if `path_separator` is empty.
    pub fn validate(&self) -> StoreResult<()> {
        if self.path_separator.is_empty() {
            return Err(StoreError::InvalidConfig(
                "path_separator must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# shapestore configuration
#
# Save debounce in milliseconds (default: 0)
#   0   = every write is saved immediately
#   >0  = writes within the window collapse into one save
delay_ms = 0

# Defer the initial load until load() is called (default: false)
lazy_load = false

# Reserved for stricter load semantics; currently has no effect (default: false)
strict_load = false

# Detect writes made by other agents before saving (default: true)
secure = true

# Repair invalid stored values with schema defaults (default: true)
auto_fix = true

# Separator for string selectors such as "user.name" (default: ".")
path_separator = "."
"#
    }

    /// Load a store config file, then [`validate`](Self::validate) it.
    ///
    /// # Errors
    ///
    /// [`StoreError::Internal`] when the file cannot be read, and
    /// [`StoreError::InvalidConfig`] when it is not a valid store config.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| file_error("read", path, e))?;
        let config: StoreConfig = toml::from_str(&content).map_err(|e| {
            StoreError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the store config at `path`, first writing the commented
    /// [`default_toml`](Self::default_toml) there if no file exists yet.
    pub fn load_or_create(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())
                .map_err(|e| file_error("create", path, e))?;
        }
        Self::from_file(path)
    }

    /// Persist these flags to `path`. An invalid config is never written.
    pub fn write_to_file(&self, path: &Path) -> StoreResult<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self)
            .map_err(|e| StoreError::Internal(format!("cannot encode store config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| file_error("write", path, e))
    }
}

fn file_error(action: &str, path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Internal(format!(
        "cannot {} store config {}: {}",
        action,
        path.display(),
        e
    ))
}

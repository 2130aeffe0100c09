//! The store: a validated value mirrored to a backing medium
//!
//! # Load
//!
//! The serialized source (read from the medium, or passed explicitly) is
//! parsed and validated against the schema. Without an explicit schema the
//! type inferred from the default value is used instead. Invalid paths are
//! reported to the invalid-value handler and, with `auto_fix`, repaired from
//! the schema defaults (or the default value). The source string becomes the
//! conflict baseline.
//!
//! # Writes
//!
//! `set`, `update` and `reset` validate against the sub-type at the target
//! path, commit, and request a save. Saves are synchronous when `delay_ms` is
//! zero, otherwise debounced on a worker thread.
//!
//! # Conflicts
//!
//! With `secure`, every save first compares the medium's current content with
//! the baseline. A mismatch means another agent wrote the key: the save is
//! abandoned and the conflict handler decides what to do.
//!
//! Handlers run after the state lock is released, so they may call back into
//! the store. The closure passed to [`Store::update`] runs under the lock and
//! must not.

use crate::builder::StoreBuilder;
use crate::config::StoreConfig;
use crate::debounce::SaveScheduler;
use crate::error::{StoreError, StoreResult};
use crate::repair::{repair, Template};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shapestore_core::{
    delete_by_path, format_paths, get_by_path, parse_path, set_by_path, test_path, KeyPath,
    Selector, Type, Validation,
};
use shapestore_storage::Medium;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};

/// Receives every absolute path that failed one load or write
pub type InvalidHandler = Arc<dyn Fn(&[KeyPath]) + Send + Sync>;

/// Receives the medium's current content and the store's baseline
pub type ConflictHandler = Arc<dyn Fn(Option<&str>, Option<&str>) + Send + Sync>;

/// Mutable part of a store
struct State {
    value: Value,
    /// Last string observed in, or written to, the medium
    baseline: Option<String>,
    loaded: bool,
}

/// Everything the save worker needs; owned by the store, borrowed weakly by
/// the worker
pub(crate) struct Shared {
    name: String,
    medium: Arc<dyn Medium>,
    schema: Option<Type>,
    default: Option<Value>,
    /// Explicit schema, or the type inferred from `default`
    validator: Option<Type>,
    config: StoreConfig,
    on_invalid: Option<InvalidHandler>,
    on_conflict: Option<ConflictHandler>,
    state: Mutex<State>,
}

impl Shared {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        medium: Arc<dyn Medium>,
        schema: Option<Type>,
        default: Option<Value>,
        validator: Option<Type>,
        config: StoreConfig,
        on_invalid: Option<InvalidHandler>,
        on_conflict: Option<ConflictHandler>,
    ) -> Self {
        let initial = default.clone().unwrap_or(Value::Null);
        Shared {
            name,
            medium,
            schema,
            default,
            validator,
            config,
            on_invalid,
            on_conflict,
            state: Mutex::new(State {
                value: initial,
                baseline: None,
                loaded: false,
            }),
        }
    }

    fn template(&self) -> Option<Template<'_>> {
        match (&self.schema, &self.default) {
            (Some(schema), _) => Some(Template::Schema(schema)),
            (None, Some(default)) => Some(Template::Example(default)),
            (None, None) => None,
        }
    }

    fn validate(&self, value: &Value) -> Validation {
        match &self.validator {
            Some(validator) => validator.validate_value(value),
            None => Validation::Valid,
        }
    }

    /// Report invalid paths: `Ok(false)` through the handler, or an error
    fn reject(&self, paths: Vec<KeyPath>) -> StoreResult<bool> {
        warn!(
            target: "shapestore::store",
            store = %self.name,
            paths = %format_paths(&paths),
            "rejected invalid value"
        );
        match &self.on_invalid {
            Some(handler) => {
                handler(&paths);
                Ok(false)
            }
            None => Err(StoreError::InvalidValue { paths }),
        }
    }

    /// Compare against the baseline and write; `Ok(false)` on a handled conflict
    pub(crate) fn save(&self) -> StoreResult<bool> {
        let mut state = self.state.lock();

        if self.config.secure {
            let current = self.medium.read(&self.name)?;
            if current != state.baseline {
                let baseline = state.baseline.clone();
                drop(state);
                warn!(target: "shapestore::save", store = %self.name, "medium changed since last load or save");
                return match &self.on_conflict {
                    Some(handler) => {
                        handler(current.as_deref(), baseline.as_deref());
                        Ok(false)
                    }
                    None => Err(StoreError::Conflict { current, baseline }),
                };
            }
        }

        let serialized = serde_json::to_string(&state.value)?;
        self.medium.write(&self.name, &serialized)?;
        debug!(target: "shapestore::save", store = %self.name, bytes = serialized.len(), "saved");
        state.baseline = Some(serialized);
        Ok(true)
    }
}

/// A schema-validated, path-addressable value persisted to a [`Medium`]
///
/// # Example
///
/// ```
/// use shapestore_core::{json, Type};
/// use shapestore_engine::Store;
/// use shapestore_storage::MemoryMedium;
/// use std::sync::Arc;
///
/// let schema = Type::dictionary()
///     .field("volume", Type::number().min(0.0).max(10.0).default_value(json!(5)).build()?)
///     .build()?;
///
/// let store = Store::builder("player")
///     .schema(schema)
///     .open(Arc::new(MemoryMedium::new()))?;
///
/// assert_eq!(store.get("volume")?, Some(json!(5)));
/// assert!(store.set("volume", json!(7))?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Store {
    shared: Arc<Shared>,
    scheduler: Option<SaveScheduler>,
}

impl Store {
    /// Start building a store persisted under `name`
    pub fn builder(name: impl Into<String>) -> StoreBuilder {
        StoreBuilder::new(name)
    }

    /// Wrap shared state, spawning the save worker when saves are debounced
    pub(crate) fn start(shared: Shared) -> StoreResult<Self> {
        let shared = Arc::new(shared);
        let scheduler = if shared.config.is_debounced() {
            let weak: Weak<Shared> = Arc::downgrade(&shared);
            Some(SaveScheduler::spawn(move || {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                if let Err(e) = shared.save() {
                    error!(target: "shapestore::save", store = %shared.name, error = %e, "debounced save failed");
                }
            })?)
        } else {
            None
        };
        Ok(Store { shared, scheduler })
    }

    /// The persistence key
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Behaviour flags
    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    /// The explicit schema, if one was given
    pub fn schema(&self) -> Option<&Type> {
        self.shared.schema.as_ref()
    }

    /// The type values are validated against: the explicit schema, or the
    /// type inferred from the default value
    pub fn validator(&self) -> Option<&Type> {
        self.shared.validator.as_ref()
    }

    /// The default value
    pub fn default_value(&self) -> Option<&Value> {
        self.shared.default.as_ref()
    }

    /// Whether a load has succeeded
    pub fn is_loaded(&self) -> bool {
        self.shared.state.lock().loaded
    }

    /// The conflict baseline
    pub fn baseline(&self) -> Option<String> {
        self.shared.state.lock().baseline.clone()
    }

    fn parse(&self, selector: impl Into<Selector>) -> KeyPath {
        parse_path(selector, &self.shared.config.path_separator)
    }

    // =========================================================================
    // Load
    // =========================================================================

    /// Load from the medium
    ///
    /// Returns `Ok(false)` when nothing is stored and there is no default, or
    /// when the stored value is invalid and could not be repaired.
    pub fn load(&self) -> StoreResult<bool> {
        let source = self.shared.medium.read(&self.shared.name)?;
        self.load_from(source.as_deref())
    }

    /// Load from an explicit serialized source (`None` = nothing stored)
    pub fn load_from(&self, source: Option<&str>) -> StoreResult<bool> {
        let shared = &self.shared;

        let (mut value, validation) = match source {
            None => match &shared.default {
                Some(default) => (default.clone(), Validation::Valid),
                None => {
                    debug!(target: "shapestore::store", store = %shared.name, "nothing stored and no default");
                    return Ok(false);
                }
            },
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(parsed) => {
                    let validation = shared.validate(&parsed);
                    (parsed, validation)
                }
                Err(e) => {
                    warn!(target: "shapestore::store", store = %shared.name, error = %e, "stored value is not JSON");
                    (Value::Null, Validation::Invalid(vec![KeyPath::root()]))
                }
            },
        };

        let mut repaired = false;
        if let Validation::Invalid(paths) = validation {
            let template = match shared.template() {
                Some(template) if shared.config.auto_fix => template,
                _ => return shared.reject(paths),
            };
            if let Some(handler) = &shared.on_invalid {
                handler(&paths);
            }
            repair(&mut value, &paths, template)?;
            info!(
                target: "shapestore::store",
                store = %shared.name,
                paths = %format_paths(&paths),
                "repaired stored value"
            );
            repaired = true;
        }

        {
            let mut state = shared.state.lock();
            state.value = value;
            state.baseline = source.map(str::to_string);
            state.loaded = true;
        }
        debug!(target: "shapestore::store", store = %shared.name, found = source.is_some(), "loaded");

        if source.is_none() || repaired {
            self.request_save()?;
        }
        Ok(true)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// A copy of the whole value
    pub fn value(&self) -> Value {
        self.shared.state.lock().value.clone()
    }

    /// A copy of the value at `selector`
    ///
    /// `Ok(None)` when the final key is missing; `InvalidPath` when an
    /// intermediate cannot be indexed.
    pub fn get(&self, selector: impl Into<Selector>) -> StoreResult<Option<Value>> {
        let path = self.parse(selector);
        let state = self.shared.state.lock();
        Ok(get_by_path(&state.value, &path)?.cloned())
    }

    /// The value at `selector`, deserialized
    pub fn get_as<T: DeserializeOwned>(&self, selector: impl Into<Selector>) -> StoreResult<Option<T>> {
        match self.get(selector)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Replace the value at `selector`
    ///
    /// Returns `Ok(false)` without mutating when the path is undeclared or the
    /// value fails the sub-type, after passing the absolute failing paths to
    /// the invalid-value handler.
    pub fn set(&self, selector: impl Into<Selector>, value: Value) -> StoreResult<bool> {
        self.update(selector, move |_| value)
    }

    /// Replace the value at `selector` with `patch(current)`
    pub fn update<F>(&self, selector: impl Into<Selector>, patch: F) -> StoreResult<bool>
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        let path = self.parse(selector);
        let rejected = self.commit(&path, patch)?;
        if !rejected.is_empty() {
            return self.shared.reject(rejected);
        }
        debug!(target: "shapestore::store", store = %self.shared.name, path = %path, "set");
        self.request_save()?;
        Ok(true)
    }

    /// Validate and commit under the lock; returns the rejected paths
    fn commit<F>(&self, path: &KeyPath, patch: F) -> StoreResult<Vec<KeyPath>>
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        let sub_type = match &self.shared.validator {
            Some(validator) => match validator.type_at_path(path) {
                Ok(sub_type) => Some(sub_type),
                Err(_) => return Ok(vec![path.clone()]),
            },
            None => None,
        };

        let mut state = self.shared.state.lock();
        let candidate = patch(get_by_path(&state.value, path)?);

        if let Some(sub_type) = sub_type {
            if let Validation::Invalid(relative) = sub_type.validate_value(&candidate) {
                return Ok(relative.iter().map(|p| path.join(p)).collect());
            }
        }

        if path.is_root() {
            state.value = candidate;
        } else {
            set_by_path(&mut state.value, path, candidate)?;
        }
        Ok(Vec::new())
    }

    /// Restore the default at `selector`
    ///
    /// Returns `Ok(false)` when the path does not resolve in the current
    /// value, or when the reset value would not validate (an element of a
    /// List has no default of its own). A path with no default is deleted.
    pub fn reset(&self, selector: impl Into<Selector>) -> StoreResult<bool> {
        let path = self.parse(selector);
        {
            let mut state = self.shared.state.lock();
            if !test_path(&state.value, &path) {
                return Ok(false);
            }
            let replacement = self.shared.template().and_then(|t| t.default_at(&path));
            let candidate = if path.is_root() {
                replacement.unwrap_or(Value::Null)
            } else {
                let mut value = state.value.clone();
                match replacement {
                    Some(default) => set_by_path(&mut value, &path, default)?,
                    None => {
                        delete_by_path(&mut value, &path)?;
                    }
                }
                value
            };
            if let Validation::Invalid(paths) = self.shared.validate(&candidate) {
                debug!(
                    target: "shapestore::store",
                    store = %self.shared.name,
                    path = %path,
                    invalid = %format_paths(&paths),
                    "reset skipped"
                );
                return Ok(false);
            }
            state.value = candidate;
        }
        debug!(target: "shapestore::store", store = %self.shared.name, path = %path, "reset");
        self.request_save()?;
        Ok(true)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Save now, superseding any pending debounced save
    ///
    /// Returns `Ok(false)` when a conflict was passed to the conflict handler.
    pub fn save(&self) -> StoreResult<bool> {
        if let Some(scheduler) = &self.scheduler {
            scheduler.take_pending();
        }
        self.shared.save()
    }

    /// Run a pending debounced save now; `Ok(false)` if none was pending
    pub fn flush(&self) -> StoreResult<bool> {
        match &self.scheduler {
            Some(scheduler) if scheduler.take_pending() => self.shared.save(),
            _ => Ok(false),
        }
    }

    /// Whether a debounced save is waiting
    pub fn has_pending_save(&self) -> bool {
        self.scheduler
            .as_ref()
            .map_or(false, SaveScheduler::is_pending)
    }

    fn request_save(&self) -> StoreResult<()> {
        match &self.scheduler {
            Some(scheduler) => {
                scheduler.schedule(self.shared.config.delay());
                debug!(
                    target: "shapestore::save",
                    store = %self.shared.name,
                    delay_ms = self.shared.config.delay_ms,
                    "save scheduled"
                );
                Ok(())
            }
            None => self.shared.save().map(|_| ()),
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.shared.name)
            .field("config", &self.shared.config)
            .field("pending_save", &self.has_pending_save())
            .finish()
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        let Some(scheduler) = &self.scheduler else {
            return;
        };
        scheduler.shutdown();
        if scheduler.take_pending() {
            if let Err(e) = self.shared.save() {
                error!(target: "shapestore::save", store = %self.shared.name, error = %e, "final save failed");
            }
        }
    }
}

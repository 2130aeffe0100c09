//! Store builder for fluent configuration
//!
//! Collects the schema, default value, flags and handlers, validates them
//! once, and opens the store against a medium.

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::store::{ConflictHandler, InvalidHandler, Shared, Store};
use serde_json::Value;
use shapestore_core::{deep_clone, infer_type, KeyPath, Node, Type, Validation};
use shapestore_storage::{Medium, MemoryMedium};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Builder for [`Store`]
///
/// ```
/// use shapestore_core::json;
/// use shapestore_engine::Store;
/// use shapestore_storage::MemoryMedium;
/// use std::sync::Arc;
///
/// let store = Store::builder("prefs")
///     .default_value(json!({"theme": "light"}))
///     .path_separator("/")
///     .on_invalid(|paths| eprintln!("invalid: {:?}", paths))
///     .open(Arc::new(MemoryMedium::new()))
///     .unwrap();
///
/// assert_eq!(store.get("theme").unwrap(), Some(json!("light")));
/// ```
#[derive(Clone)]
pub struct StoreBuilder {
    name: String,
    schema: Option<Type>,
    default: Option<Value>,
    config: StoreConfig,
    on_invalid: Option<InvalidHandler>,
    on_conflict: Option<ConflictHandler>,
}

impl StoreBuilder {
    /// Create a builder for the store persisted under `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            default: None,
            config: StoreConfig::default(),
            on_invalid: None,
            on_conflict: None,
        }
    }

    /// Validate values against `schema`
    pub fn schema(mut self, schema: Type) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Seed value when nothing is stored
    ///
    /// Overrides the schema's default. Without a schema, the type inferred
    /// from this value is used for validation.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Seed value taken from a shared graph
    ///
    /// # Errors
    ///
    /// Fails with `CircularReference` if the graph reaches any container twice.
    pub fn default_from_graph(mut self, graph: &Node) -> StoreResult<Self> {
        self.default = Some(deep_clone(graph)?);
        Ok(self)
    }

    /// Replace all flags at once
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Save debounce; zero saves synchronously
    pub fn delay(mut self, delay: Duration) -> Self {
        self.config.delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Defer the initial load
    pub fn lazy_load(mut self, lazy: bool) -> Self {
        self.config.lazy_load = lazy;
        self
    }

    /// Reserved flag, carried in the config only
    pub fn strict_load(mut self, strict: bool) -> Self {
        self.config.strict_load = strict;
        self
    }

    /// Enable conflict detection before saving
    pub fn secure(mut self, secure: bool) -> Self {
        self.config.secure = secure;
        self
    }

    /// Repair invalid loads instead of rejecting them
    pub fn auto_fix(mut self, auto_fix: bool) -> Self {
        self.config.auto_fix = auto_fix;
        self
    }

    /// Separator for string selectors
    pub fn path_separator(mut self, separator: impl Into<String>) -> Self {
        self.config.path_separator = separator.into();
        self
    }

    /// Handler for invalid loads and rejected writes
    pub fn on_invalid(mut self, handler: impl Fn(&[KeyPath]) + Send + Sync + 'static) -> Self {
        self.on_invalid = Some(Arc::new(handler));
        self
    }

    /// Handler for save conflicts
    pub fn on_conflict(
        mut self,
        handler: impl Fn(Option<&str>, Option<&str>) + Send + Sync + 'static,
    ) -> Self {
        self.on_conflict = Some(Arc::new(handler));
        self
    }

    /// Open against `medium`, loading immediately unless `lazy_load` is set
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` for a bad flag, or a schema whose root has no default
    /// - `Core(InvalidDefaultValue)` when the default value fails the schema
    /// - any error from the initial load
    pub fn open(self, medium: Arc<dyn Medium>) -> StoreResult<Store> {
        self.config.validate()?;

        let validator = match (&self.schema, &self.default) {
            (Some(schema), Some(default)) => {
                if let Validation::Invalid(paths) = schema.validate_value(default) {
                    return Err(shapestore_core::Error::InvalidDefaultValue { paths }.into());
                }
                Some(schema.clone())
            }
            (Some(schema), None) => {
                if schema.default_value().is_none() {
                    return Err(StoreError::InvalidConfig(format!(
                        "{} schema for '{}' has no default value",
                        schema.kind_name(),
                        self.name
                    )));
                }
                Some(schema.clone())
            }
            (None, Some(default)) => Some(infer_type(Some(default))?),
            (None, None) => None,
        };
        let default = self
            .default
            .or_else(|| self.schema.as_ref().and_then(|s| s.default_value().cloned()));

        let lazy = self.config.lazy_load;
        let store = Store::start(Shared::new(
            self.name,
            medium,
            self.schema,
            default,
            validator,
            self.config,
            self.on_invalid,
            self.on_conflict,
        ))?;

        if lazy {
            debug!(target: "shapestore::store", store = %store.name(), "lazy load, skipping initial load");
        } else {
            store.load()?;
        }
        Ok(store)
    }

    /// Open against the process-wide [`MemoryMedium::ambient`]
    pub fn open_ambient(self) -> StoreResult<Store> {
        self.open(MemoryMedium::ambient())
    }
}

impl std::fmt::Debug for StoreBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreBuilder")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("default", &self.default)
            .field("config", &self.config)
            .field("on_invalid", &self.on_invalid.is_some())
            .field("on_conflict", &self.on_conflict.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_must_satisfy_schema() {
        let schema = Type::dictionary()
            .field("n", Type::number().build().unwrap())
            .build()
            .unwrap();
        let err = StoreBuilder::new("t")
            .schema(schema)
            .default_value(json!({"n": "text"}))
            .open(Arc::new(MemoryMedium::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Core(shapestore_core::Error::InvalidDefaultValue { .. })
        ));
    }

    #[test]
    fn test_schema_root_needs_default() {
        let schema = Type::nullable().null(false).undefined(true).build().unwrap();
        let err = StoreBuilder::new("t")
            .schema(schema)
            .open(Arc::new(MemoryMedium::new()))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_separator_rejected() {
        let err = StoreBuilder::new("t")
            .path_separator("")
            .open(Arc::new(MemoryMedium::new()))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_default_from_graph() {
        let graph = Node::object();
        graph.insert("a", Node::from(json!(1)));
        graph.insert("callback", Node::function(|v| v.clone()));
        let store = StoreBuilder::new("t")
            .default_from_graph(&graph)
            .unwrap()
            .open(Arc::new(MemoryMedium::new()))
            .unwrap();
        assert_eq!(store.value(), json!({"a": 1}));
    }

    #[test]
    fn test_default_from_cyclic_graph_fails() {
        let graph = Node::object();
        graph.insert("me", graph.clone());
        let err = StoreBuilder::new("t").default_from_graph(&graph).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Core(shapestore_core::Error::CircularReference)
        ));
    }

    #[test]
    fn test_flag_setters() {
        let builder = StoreBuilder::new("t")
            .delay(Duration::from_millis(25))
            .lazy_load(true)
            .strict_load(true)
            .secure(false)
            .auto_fix(false)
            .path_separator("/");
        assert_eq!(
            builder.config,
            StoreConfig {
                delay_ms: 25,
                lazy_load: true,
                strict_load: true,
                secure: false,
                auto_fix: false,
                path_separator: "/".to_string(),
            }
        );
    }

    #[test]
    fn test_lazy_open_does_not_load() {
        let medium = Arc::new(MemoryMedium::new());
        let store = StoreBuilder::new("t")
            .default_value(json!({"a": 1}))
            .lazy_load(true)
            .open(medium.clone())
            .unwrap();
        assert!(!store.is_loaded());
        assert!(medium.is_empty());

        assert!(store.load().unwrap());
        assert!(store.is_loaded());
        assert_eq!(medium.read("t").unwrap().as_deref(), Some(r#"{"a":1}"#));
    }
}

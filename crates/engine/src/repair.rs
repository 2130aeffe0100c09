//! Default substitution for invalid paths
//!
//! A failing path is repaired from a template: the schema when one was given,
//! otherwise the store's default value. If the template has a value at the
//! path it is copied in; otherwise the path is deleted.

use shapestore_core::{delete_by_path, get_by_path, set_by_path, test_path, KeyPath, Result, Type};
use serde_json::Value;

/// Where defaults come from
#[derive(Debug, Clone, Copy)]
pub(crate) enum Template<'a> {
    /// Sub-type defaults of an explicit schema
    Schema(&'a Type),
    /// Values found in the default value
    Example(&'a Value),
}

impl Template<'_> {
    /// Default at `path`, or `None` when the path should be deleted
    pub(crate) fn default_at(&self, path: &KeyPath) -> Option<Value> {
        match self {
            Template::Schema(schema) => schema
                .type_at_path(path)
                .ok()
                .and_then(Type::default_value)
                .cloned(),
            Template::Example(example) => {
                if !test_path(example, path) {
                    return None;
                }
                get_by_path(example, path).ok().flatten().cloned()
            }
        }
    }
}

/// Overwrite or delete `value` at every path in `paths`
pub(crate) fn repair(value: &mut Value, paths: &[KeyPath], template: Template<'_>) -> Result<()> {
    for path in paths {
        let replacement = template.default_at(path);
        if path.is_root() {
            *value = replacement.unwrap_or(Value::Null);
            continue;
        }
        match replacement {
            Some(default) => set_by_path(value, path, default)?,
            None => {
                delete_by_path(value, path)?;
            }
        }
    }
    Ok(())
}

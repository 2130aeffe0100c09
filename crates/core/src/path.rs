//! Key paths and path operations over JSON values
//!
//! This module defines how a location inside a stored value is addressed:
//! - KeyPath: Ordered sequence of string keys (e.g. `settings.theme.color`)
//! - Selector: Either a pre-split key sequence or a separator-joined string
//! - Path operations: get / set / delete / test at a key path
//!
//! Objects are indexed by key and arrays by decimal index (`items.0.name`).
//! There is no escaping: a key can never contain the separator.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// =============================================================================
// KeyPath
// =============================================================================

/// A path into a JSON value
///
/// The empty path addresses the root value itself.
///
/// # Examples
///
/// ```
/// use shapestore_core::path::KeyPath;
///
/// let root = KeyPath::root();
/// let color = KeyPath::root().key("theme").key("color");
///
/// assert!(root.is_ancestor_of(&color));
/// assert_eq!(color.to_path_string(), "theme.color");
/// assert_eq!(color.parent(), Some(KeyPath::root().key("theme")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Create the root path (empty path)
    pub fn root() -> Self {
        KeyPath {
            segments: Vec::new(),
        }
    }

    /// Create a path from a vector of keys
    pub fn from_segments(segments: Vec<String>) -> Self {
        KeyPath { segments }
    }

    /// Get the path keys
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Iterate over the path keys
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.segments.iter()
    }

    /// Get the number of keys in the path
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the root path (empty)
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check if this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a key (builder pattern)
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(key.into());
        self
    }

    /// Push a key (mutating)
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(key.into());
    }

    /// Get the parent path (None if root)
    pub fn parent(&self) -> Option<KeyPath> {
        self.split_last().map(|(_, parent)| parent)
    }

    /// Get the last key (None if root)
    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Split into the last key and the parent path (None if root)
    pub fn split_last(&self) -> Option<(&str, KeyPath)> {
        let (last, parent) = self.segments.split_last()?;
        Some((last.as_str(), KeyPath::from_segments(parent.to_vec())))
    }

    /// The path made of the first `len` keys
    pub fn prefix(&self, len: usize) -> KeyPath {
        let len = len.min(self.segments.len());
        KeyPath::from_segments(self.segments[..len].to_vec())
    }

    /// Concatenate a relative path onto this one
    ///
    /// Used to turn a failure reported relative to a sub-value back into
    /// an absolute path.
    pub fn join(&self, relative: &KeyPath) -> KeyPath {
        let mut segments = Vec::with_capacity(self.len() + relative.len());
        segments.extend_from_slice(&self.segments);
        segments.extend_from_slice(&relative.segments);
        KeyPath { segments }
    }

    /// Prepend a single key
    pub fn prefixed(mut self, key: &str) -> KeyPath {
        self.segments.insert(0, key.to_string());
        self
    }

    /// Check if this path is an ancestor of another (or equal)
    pub fn is_ancestor_of(&self, other: &KeyPath) -> bool {
        if self.segments.len() > other.segments.len() {
            return false;
        }
        self.segments
            .iter()
            .zip(other.segments.iter())
            .all(|(a, b)| a == b)
    }

    /// Check if this path is a descendant of another (or equal)
    pub fn is_descendant_of(&self, other: &KeyPath) -> bool {
        other.is_ancestor_of(self)
    }

    /// Convert to a string representation joined with `.`
    pub fn to_path_string(&self) -> String {
        self.segments.join(".")
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        KeyPath::from_segments(segments)
    }
}

impl From<Vec<&str>> for KeyPath {
    fn from(segments: Vec<&str>) -> Self {
        segments.into_iter().collect()
    }
}

impl From<&[&str]> for KeyPath {
    fn from(segments: &[&str]) -> Self {
        segments.iter().copied().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for KeyPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        KeyPath::from_segments(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a KeyPath {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Render a list of paths for messages, e.g. `[<root>, a.b]`
pub fn format_paths(paths: &[KeyPath]) -> String {
    let rendered: Vec<String> = paths
        .iter()
        .map(|p| {
            if p.is_root() {
                "<root>".to_string()
            } else {
                p.to_path_string()
            }
        })
        .collect();
    format!("[{}]", rendered.join(", "))
}

// =============================================================================
// Selector
// =============================================================================

/// How a caller names a location: a string split on the store's separator,
/// or keys that are already split
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Separator-joined keys, e.g. `"theme.color"`
    Text(String),
    /// Pre-split keys, used as-is
    Keys(KeyPath),
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        Selector::Text(s.to_string())
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Selector::Text(s)
    }
}

impl From<KeyPath> for Selector {
    fn from(path: KeyPath) -> Self {
        Selector::Keys(path)
    }
}

impl From<&KeyPath> for Selector {
    fn from(path: &KeyPath) -> Self {
        Selector::Keys(path.clone())
    }
}

impl From<Vec<&str>> for Selector {
    fn from(keys: Vec<&str>) -> Self {
        Selector::Keys(keys.into())
    }
}

impl From<Vec<String>> for Selector {
    fn from(keys: Vec<String>) -> Self {
        Selector::Keys(keys.into())
    }
}

impl<const N: usize> From<[&str; N]> for Selector {
    fn from(keys: [&str; N]) -> Self {
        Selector::Keys(keys.into_iter().collect())
    }
}

/// Resolve a selector into a key path
///
/// Pre-split keys are returned unchanged. A string is split on `separator`;
/// the empty string is the root path. An empty separator never splits.
///
/// # Examples
///
/// ```
/// use shapestore_core::path::{parse_path, KeyPath};
///
/// assert_eq!(parse_path("a.b", "."), KeyPath::from(vec!["a", "b"]));
/// assert_eq!(parse_path("a/b", "/"), KeyPath::from(vec!["a", "b"]));
/// assert_eq!(parse_path(vec!["a.b"], "."), KeyPath::from(vec!["a.b"]));
/// assert!(parse_path("", ".").is_root());
/// ```
pub fn parse_path(selector: impl Into<Selector>, separator: &str) -> KeyPath {
    match selector.into() {
        Selector::Keys(path) => path,
        Selector::Text(text) if text.is_empty() => KeyPath::root(),
        Selector::Text(text) if separator.is_empty() => KeyPath::root().key(text),
        Selector::Text(text) => text.split(separator).collect(),
    }
}

// =============================================================================
// Path Operations
// =============================================================================

/// Helper to get type name for error messages
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Most `null` slots [`set_by_path`] will insert to reach an index past the
/// end of an array
pub const MAX_ARRAY_GAP: usize = 1024;

/// Parse an array index key: plain decimal, no sign, no leading zeros
fn array_index(key: &str) -> Option<usize> {
    let canonical = !key.is_empty()
        && key.bytes().all(|b| b.is_ascii_digit())
        && (key.len() == 1 || !key.starts_with('0'));
    if canonical {
        key.parse().ok()
    } else {
        None
    }
}

fn child<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => array_index(key).and_then(|i| items.get(i)),
        _ => None,
    }
}

fn not_indexable(path: &KeyPath, depth: usize, found: &Value) -> Error {
    Error::invalid_path(
        path,
        format!(
            "cannot index into {} at '{}'",
            value_type_name(found),
            path.prefix(depth)
        ),
    )
}

fn missing(path: &KeyPath, depth: usize) -> Error {
    Error::invalid_path(path, format!("'{}' does not exist", path.prefix(depth)))
}

/// Get value at path
///
/// # Returns
///
/// * `Ok(Some(&Value))` - The value at the path
/// * `Ok(None)` - Every intermediate resolved but the final key is missing
/// * `Err(Error::InvalidPath)` - An intermediate is missing or not an object/array
///
/// # Examples
///
/// ```
/// use shapestore_core::path::{get_by_path, KeyPath};
/// use serde_json::json;
///
/// let value = json!({"user": {"name": "Alice", "tags": ["a", "b"]}});
///
/// let name = get_by_path(&value, &KeyPath::from(vec!["user", "name"])).unwrap();
/// assert_eq!(name, Some(&json!("Alice")));
///
/// let tag = get_by_path(&value, &KeyPath::from(vec!["user", "tags", "1"])).unwrap();
/// assert_eq!(tag, Some(&json!("b")));
///
/// assert!(get_by_path(&value, &KeyPath::from(vec!["user", "name", "x"])).is_err());
/// ```
pub fn get_by_path<'a>(root: &'a Value, path: &KeyPath) -> Result<Option<&'a Value>> {
    let mut current = Some(root);
    for (depth, key) in path.iter().enumerate() {
        let node = match current {
            Some(node @ (Value::Object(_) | Value::Array(_))) => node,
            Some(other) => return Err(not_indexable(path, depth, other)),
            None => return Err(missing(path, depth)),
        };
        current = child(node, key);
    }
    Ok(current)
}

/// Get mutable reference to value at path
///
/// Same resolution rules as [`get_by_path`].
pub fn get_by_path_mut<'a>(root: &'a mut Value, path: &KeyPath) -> Result<Option<&'a mut Value>> {
    let mut current = root;
    for (depth, key) in path.iter().enumerate() {
        let next = match current {
            Value::Object(map) => map.get_mut(key),
            Value::Array(items) => match array_index(key) {
                Some(idx) => items.get_mut(idx),
                None => None,
            },
            other => return Err(not_indexable(path, depth, other)),
        };
        match next {
            Some(node) => current = node,
            None if depth + 1 == path.len() => return Ok(None),
            None => return Err(missing(path, depth + 1)),
        }
    }
    Ok(Some(current))
}

/// Resolve the container holding the last key of a non-root path
fn parent_mut<'a, 'p>(root: &'a mut Value, path: &'p KeyPath) -> Result<(&'a mut Value, &'p str)> {
    let (last, parent_path) = path
        .split_last()
        .ok_or_else(|| Error::invalid_path(path, "the root cannot be addressed by key"))?;
    let depth = parent_path.len();
    match get_by_path_mut(root, &parent_path) {
        Ok(Some(parent)) => Ok((parent, last)),
        Ok(None) => Err(missing(path, depth)),
        Err(Error::InvalidPath { reason, .. }) => Err(Error::invalid_path(path, reason)),
        Err(other) => Err(other),
    }
}

/// Set value at path
///
/// Walks to the parent of the final key and assigns. Intermediate containers
/// are never created. Array slots past the end are filled with `null`, up to
/// [`MAX_ARRAY_GAP`] of them; a farther index is an invalid path.
/// Setting the root path is rejected: callers replace the root themselves.
///
/// # Examples
///
/// ```
/// use shapestore_core::path::{set_by_path, KeyPath};
/// use serde_json::json;
///
/// let mut value = json!({"user": {}});
/// set_by_path(&mut value, &KeyPath::from(vec!["user", "name"]), json!("Bob")).unwrap();
/// assert_eq!(value, json!({"user": {"name": "Bob"}}));
///
/// assert!(set_by_path(&mut value, &KeyPath::from(vec!["nope", "name"]), json!(1)).is_err());
/// ```
pub fn set_by_path(root: &mut Value, path: &KeyPath, value: Value) -> Result<()> {
    let (parent, key) = parent_mut(root, path)?;
    match parent {
        Value::Object(map) => {
            map.insert(key.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let idx = array_index(key).ok_or_else(|| {
                Error::invalid_path(path, format!("'{}' is not an array index", key))
            })?;
            let len = items.len();
            if idx < len {
                items[idx] = value;
            } else if idx - len <= MAX_ARRAY_GAP {
                items.resize(idx, Value::Null);
                items.push(value);
            } else {
                let reason = format!(
                    "index {} is more than {} past the end of the array",
                    idx, MAX_ARRAY_GAP
                );
                return Err(Error::invalid_path(path, reason));
            }
            Ok(())
        }
        other => Err(not_indexable(path, path.len() - 1, other)),
    }
}

/// Delete value at path
///
/// Removes the key from its parent object. Array elements are replaced by
/// `null` so that sibling indices stay stable.
///
/// # Returns
///
/// * `Ok(Some(value))` - The removed value
/// * `Ok(None)` - The final key did not exist
/// * `Err(Error::InvalidPath)` - Traversal failed, or the path is the root
pub fn delete_by_path(root: &mut Value, path: &KeyPath) -> Result<Option<Value>> {
    let (parent, key) = parent_mut(root, path)?;
    match parent {
        Value::Object(map) => Ok(map.shift_remove(key)),
        Value::Array(items) => Ok(array_index(key)
            .and_then(|idx| items.get_mut(idx))
            .map(std::mem::take)),
        other => Err(not_indexable(path, path.len() - 1, other)),
    }
}

/// Check whether a path can be resolved without indexing into a non-container
///
/// Every key but the last must land on an object or array; the final key may
/// be missing. Never fails: the root path always resolves.
pub fn test_path(root: &Value, path: &KeyPath) -> bool {
    match path.split_last() {
        None => true,
        Some((_, parent)) => matches!(
            get_by_path(root, &parent),
            Ok(Some(Value::Object(_) | Value::Array(_)))
        ),
    }
}

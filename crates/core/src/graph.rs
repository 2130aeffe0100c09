//! Shared value graphs and cycle-checked deep copy
//!
//! A [`Node`] is a live, mutable value graph: objects and arrays are shared
//! handles, so the same container can appear under several parents, or inside
//! itself. [`deep_clone`] turns a graph into an owned [`Value`] tree that is
//! safe to store, refusing graphs where one container is reached twice.
//!
//! Function leaves model host callbacks living inside a value; they have no
//! JSON form and are dropped from cloned output.

use crate::error::{Error, Result};
use serde_json::{Map, Number, Value};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Shared handle to an ordered object
pub type ObjectRef = Rc<RefCell<Vec<(String, Node)>>>;

/// Shared handle to an array
pub type ArrayRef = Rc<RefCell<Vec<Node>>>;

/// Opaque callable stored inside a graph
pub type FunctionRef = Rc<dyn Fn(&Value) -> Value>;

/// A node in a shared value graph
#[derive(Clone)]
pub enum Node {
    /// `null`
    Null,
    /// Boolean leaf
    Bool(bool),
    /// Numeric leaf
    Number(Number),
    /// String leaf
    String(String),
    /// Shared array
    Array(ArrayRef),
    /// Shared object; key order is insertion order
    Object(ObjectRef),
    /// Callable leaf, omitted when cloning
    Function(FunctionRef),
}

impl Node {
    /// Create a new, empty shared object
    pub fn object() -> Self {
        Node::Object(Rc::new(RefCell::new(Vec::new())))
    }

    /// Create a new, empty shared array
    pub fn array() -> Self {
        Node::Array(Rc::new(RefCell::new(Vec::new())))
    }

    /// Wrap a callable
    pub fn function(f: impl Fn(&Value) -> Value + 'static) -> Self {
        Node::Function(Rc::new(f))
    }

    /// Insert or replace a key on an object node
    ///
    /// Returns `false` (and does nothing) when this node is not an object.
    pub fn insert(&self, key: impl Into<String>, value: Node) -> bool {
        let Node::Object(entries) = self else {
            return false;
        };
        let key = key.into();
        let mut entries = entries.borrow_mut();
        let existing = entries.iter().position(|(k, _)| *k == key);
        match existing {
            Some(idx) => entries[idx].1 = value,
            None => entries.push((key, value)),
        }
        true
    }

    /// Append to an array node
    ///
    /// Returns `false` (and does nothing) when this node is not an array.
    pub fn push(&self, value: Node) -> bool {
        let Node::Array(items) = self else {
            return false;
        };
        items.borrow_mut().push(value);
        true
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Null => f.write_str("Null"),
            Node::Bool(b) => write!(f, "Bool({})", b),
            Node::Number(n) => write!(f, "Number({})", n),
            Node::String(s) => write!(f, "String({:?})", s),
            Node::Array(items) => write!(f, "Array(<{} items>)", items.borrow().len()),
            Node::Object(entries) => write!(f, "Object(<{} keys>)", entries.borrow().len()),
            Node::Function(_) => f.write_str("Function"),
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => Node::Number(n),
            Value::String(s) => Node::String(s),
            Value::Array(items) => Node::Array(Rc::new(RefCell::new(
                items.into_iter().map(Node::from).collect(),
            ))),
            Value::Object(map) => Node::Object(Rc::new(RefCell::new(
                map.into_iter().map(|(k, v)| (k, Node::from(v))).collect(),
            ))),
        }
    }
}

impl TryFrom<&Node> for Value {
    type Error = Error;

    fn try_from(node: &Node) -> Result<Self> {
        deep_clone(node)
    }
}

/// Deep-copy a graph into an owned value
///
/// Fails with [`Error::CircularReference`] if any object or array instance is
/// reached twice during this traversal. The visited set lives only for this
/// call. A top-level function clones to `null`.
///
/// # Examples
///
/// ```
/// use shapestore_core::graph::{deep_clone, Node};
/// use serde_json::json;
///
/// let settings = Node::object();
/// settings.insert("theme", Node::from(json!("dark")));
/// settings.insert("onChange", Node::function(|v| v.clone()));
/// assert_eq!(deep_clone(&settings).unwrap(), json!({"theme": "dark"}));
///
/// settings.insert("self", settings.clone());
/// assert!(deep_clone(&settings).is_err());
/// ```
pub fn deep_clone(node: &Node) -> Result<Value> {
    let mut seen = HashSet::new();
    Ok(clone_node(node, &mut seen)?.unwrap_or(Value::Null))
}

/// Returns `None` for nodes that have no value form (functions)
fn clone_node(node: &Node, seen: &mut HashSet<usize>) -> Result<Option<Value>> {
    let value = match node {
        Node::Null => Value::Null,
        Node::Bool(b) => Value::Bool(*b),
        Node::Number(n) => Value::Number(n.clone()),
        Node::String(s) => Value::String(s.clone()),
        Node::Function(_) => return Ok(None),
        Node::Array(items) => {
            visit(seen, Rc::as_ptr(items) as *const () as usize)?;
            let mut out = Vec::new();
            for item in items.borrow().iter() {
                if let Some(v) = clone_node(item, seen)? {
                    out.push(v);
                }
            }
            Value::Array(out)
        }
        Node::Object(entries) => {
            visit(seen, Rc::as_ptr(entries) as *const () as usize)?;
            let mut out = Map::new();
            for (key, child) in entries.borrow().iter() {
                if let Some(v) = clone_node(child, seen)? {
                    out.insert(key.clone(), v);
                }
            }
            Value::Object(out)
        }
    };
    Ok(Some(value))
}

fn visit(seen: &mut HashSet<usize>, identity: usize) -> Result<()> {
    if seen.insert(identity) {
        Ok(())
    } else {
        Err(Error::CircularReference)
    }
}

//! Structural types for stored values
//!
//! A [`Type`] is a schema node: it describes which values are acceptable and
//! carries a default value for repairing values that are not. The variant set
//! is closed:
//!
//! | Variant | Accepts | Default |
//! |---------|---------|---------|
//! | Any | everything | `null` |
//! | Boolean | `true` / `false` | `false` |
//! | String | strings within length bounds, optionally matching a pattern | `""` |
//! | Number | numbers within `[min, max]`, optionally integral | `0` |
//! | Nullable | `null` and/or an absent value | `null` if accepted, else absent |
//! | Dictionary | objects, optionally with a fixed field mapping | object of field defaults |
//! | List | arrays whose every element matches one element type | `[]` |
//! | Union | anything one of its members accepts | first member's default |
//!
//! # Absent values
//!
//! Validation takes `Option<&Value>`: `None` is a value that is not there at
//! all (a missing object field), which is distinct from `null`.
//!
//! # Failure paths
//!
//! [`Type::validate`] reports every failing location relative to the validated
//! value. Dictionaries report per-field paths; every other variant reports
//! only the root path. In particular a List with one bad element is reported
//! as a whole, not per element.
//!
//! # Construction
//!
//! Each variant has a builder. `build()` checks the options and then checks
//! that the default value passes the type's own validation.
//!
//! ```
//! use shapestore_core::schema::Type;
//! use serde_json::json;
//!
//! let settings = Type::dictionary()
//!     .field("version", Type::number().integer(true).min(0.0).default_value(json!(1)).build()?)
//!     .field("title", Type::string().max_length(64).build()?)
//!     .build()?;
//!
//! assert_eq!(settings.default_value(), Some(&json!({"version": 1, "title": ""})));
//! assert!(settings.validate_value(&json!({"version": 3, "title": "x"})).is_valid());
//! # Ok::<(), shapestore_core::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::path::KeyPath;
use regex::Regex;
use serde_json::{Map, Value};

// =============================================================================
// Validation outcome
// =============================================================================

/// Outcome of validating a value against a [`Type`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The value satisfies the type
    Valid,
    /// The value violates the type at these paths (never empty)
    Invalid(Vec<KeyPath>),
}

impl Validation {
    fn root() -> Self {
        Validation::Invalid(vec![KeyPath::root()])
    }

    fn check(ok: bool) -> Self {
        if ok {
            Validation::Valid
        } else {
            Validation::root()
        }
    }

    fn from_paths(paths: Vec<KeyPath>) -> Self {
        if paths.is_empty() {
            Validation::Valid
        } else {
            Validation::Invalid(paths)
        }
    }

    /// Whether the value satisfied the type
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }

    /// Failing paths (empty when valid)
    pub fn paths(&self) -> &[KeyPath] {
        match self {
            Validation::Valid => &[],
            Validation::Invalid(paths) => paths,
        }
    }

    /// Consume into the failing paths (empty when valid)
    pub fn into_paths(self) -> Vec<KeyPath> {
        match self {
            Validation::Valid => Vec::new(),
            Validation::Invalid(paths) => paths,
        }
    }
}

// =============================================================================
// Type
// =============================================================================

/// A schema node
#[derive(Debug, Clone)]
pub enum Type {
    /// No constraints
    Any(AnyType),
    /// Booleans only
    Boolean(BooleanType),
    /// Constrained strings
    String(StringType),
    /// Constrained numbers
    Number(NumberType),
    /// `null` and/or absent
    Nullable(NullableType),
    /// Objects, optionally with declared fields
    Dictionary(DictionaryType),
    /// Homogeneous arrays
    List(ListType),
    /// Alternatives
    Union(UnionType),
}

impl Type {
    /// Start building an [`AnyType`]
    pub fn any() -> AnyBuilder {
        AnyBuilder::default()
    }

    /// Start building a [`BooleanType`]
    pub fn boolean() -> BooleanBuilder {
        BooleanBuilder::default()
    }

    /// Start building a [`StringType`]
    pub fn string() -> StringBuilder {
        StringBuilder::default()
    }

    /// Start building a [`NumberType`]
    pub fn number() -> NumberBuilder {
        NumberBuilder::default()
    }

    /// Start building a [`NullableType`]
    pub fn nullable() -> NullableBuilder {
        NullableBuilder::default()
    }

    /// Start building a [`DictionaryType`]
    pub fn dictionary() -> DictionaryBuilder {
        DictionaryBuilder::default()
    }

    /// Start building a [`ListType`] over `element`
    pub fn list(element: Type) -> ListBuilder {
        ListBuilder {
            element,
            default: None,
        }
    }

    /// Start building a [`UnionType`] over `members`, tried in order
    pub fn union(members: Vec<Type>) -> UnionBuilder {
        UnionBuilder {
            members,
            default: None,
        }
    }

    /// Short name of the variant, for messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Type::Any(_) => "any",
            Type::Boolean(_) => "boolean",
            Type::String(_) => "string",
            Type::Number(_) => "number",
            Type::Nullable(_) => "nullable",
            Type::Dictionary(_) => "dictionary",
            Type::List(_) => "list",
            Type::Union(_) => "union",
        }
    }

    /// The default value; `None` means "absent"
    pub fn default_value(&self) -> Option<&Value> {
        match self {
            Type::Any(t) => t.default.as_ref(),
            Type::Boolean(t) => Some(&t.default),
            Type::String(t) => Some(&t.default),
            Type::Number(t) => Some(&t.default),
            Type::Nullable(t) => t.default.as_ref(),
            Type::Dictionary(t) => Some(&t.default),
            Type::List(t) => Some(&t.default),
            Type::Union(t) => t.default.as_ref(),
        }
    }

    /// Validate a possibly-absent value
    pub fn validate(&self, value: Option<&Value>) -> Validation {
        match self {
            Type::Any(_) => Validation::Valid,
            Type::Boolean(_) => Validation::check(matches!(value, Some(Value::Bool(_)))),
            Type::String(t) => Validation::check(t.accepts(value)),
            Type::Number(t) => Validation::check(t.accepts(value)),
            Type::Nullable(t) => Validation::check(match value {
                None => t.undefined,
                Some(Value::Null) => t.null,
                Some(_) => false,
            }),
            Type::Dictionary(t) => t.validate(value),
            Type::List(t) => Validation::check(match value {
                Some(Value::Array(items)) => items
                    .iter()
                    .all(|item| t.element.validate(Some(item)).is_valid()),
                _ => false,
            }),
            Type::Union(t) => {
                Validation::check(t.members.iter().any(|m| m.validate(value).is_valid()))
            }
        }
    }

    /// Validate a present value
    pub fn validate_value(&self, value: &Value) -> Validation {
        self.validate(Some(value))
    }

    /// Resolve the sub-type declared at `path`
    ///
    /// Only Dictionary field mappings can be descended into. Any other node,
    /// or a key the mapping does not declare, fails with `InvalidPath`.
    pub fn type_at_path(&self, path: &KeyPath) -> Result<&Type> {
        let mut current = self;
        for (depth, key) in path.iter().enumerate() {
            current = match current {
                Type::Dictionary(DictionaryType {
                    fields: Some(fields),
                    ..
                }) => fields
                    .iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, t)| t)
                    .ok_or_else(|| {
                        Error::invalid_path(
                            path,
                            format!("'{}' is not declared", path.prefix(depth + 1)),
                        )
                    })?,
                other => {
                    return Err(Error::invalid_path(
                        path,
                        format!(
                            "{} type at '{}' declares no fields",
                            other.kind_name(),
                            path.prefix(depth)
                        ),
                    ))
                }
            };
        }
        Ok(current)
    }

    /// Whether `path` names a declared sub-type
    pub fn test_type_path(&self, path: &KeyPath) -> bool {
        self.type_at_path(path).is_ok()
    }

    /// Reject the type if its default does not validate
    fn checked(self) -> Result<Type> {
        match self.validate(self.default_value()) {
            Validation::Valid => Ok(self),
            Validation::Invalid(paths) => Err(Error::InvalidDefaultValue { paths }),
        }
    }
}

// =============================================================================
// Variants
// =============================================================================

/// Accepts every value
#[derive(Debug, Clone)]
pub struct AnyType {
    default: Option<Value>,
}

/// Accepts booleans
#[derive(Debug, Clone)]
pub struct BooleanType {
    default: Value,
}

/// Accepts strings within bounds
#[derive(Debug, Clone)]
pub struct StringType {
    min_length: usize,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    default: Value,
}

impl StringType {
    /// Minimum length in characters
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Maximum length in characters, if bounded
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// Pattern the string must contain a match for
    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    fn accepts(&self, value: Option<&Value>) -> bool {
        let Some(Value::String(s)) = value else {
            return false;
        };
        let len = s.chars().count();
        len >= self.min_length
            && self.max_length.map_or(true, |max| len <= max)
            && self.pattern.as_ref().map_or(true, |re| re.is_match(s))
    }
}

/// Accepts numbers within bounds
#[derive(Debug, Clone)]
pub struct NumberType {
    min: f64,
    max: f64,
    integer: bool,
    default: Value,
}

impl NumberType {
    /// Inclusive lower bound
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Inclusive upper bound
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Whether fractional values are rejected
    pub fn integer(&self) -> bool {
        self.integer
    }

    fn accepts(&self, value: Option<&Value>) -> bool {
        let Some(n) = value.and_then(Value::as_f64) else {
            return false;
        };
        n >= self.min && n <= self.max && (!self.integer || n.fract() == 0.0)
    }
}

/// Accepts `null` and/or absence
#[derive(Debug, Clone)]
pub struct NullableType {
    null: bool,
    undefined: bool,
    default: Option<Value>,
}

impl NullableType {
    /// Whether `null` is accepted
    pub fn accepts_null(&self) -> bool {
        self.null
    }

    /// Whether an absent value is accepted
    pub fn accepts_absent(&self) -> bool {
        self.undefined
    }
}

/// Accepts objects; checks declared fields when a mapping is given
#[derive(Debug, Clone)]
pub struct DictionaryType {
    fields: Option<Vec<(String, Type)>>,
    default: Value,
}

impl DictionaryType {
    /// Declared fields in declaration order, or `None` for "any object"
    pub fn fields(&self) -> Option<&[(String, Type)]> {
        self.fields.as_deref()
    }

    /// Look up one declared field
    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields
            .as_ref()?
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    fn validate(&self, value: Option<&Value>) -> Validation {
        let Some(Value::Object(map)) = value else {
            return Validation::root();
        };
        let Some(fields) = &self.fields else {
            return Validation::Valid;
        };

        let mut paths: Vec<KeyPath> = map
            .keys()
            .filter(|key| !fields.iter().any(|(name, _)| name == *key))
            .map(|key| KeyPath::root().key(key.as_str()))
            .collect();

        for (name, field_type) in fields {
            for relative in field_type.validate(map.get(name)).into_paths() {
                paths.push(relative.prefixed(name));
            }
        }

        Validation::from_paths(paths)
    }
}

/// Accepts arrays of one element type
#[derive(Debug, Clone)]
pub struct ListType {
    element: Box<Type>,
    default: Value,
}

impl ListType {
    /// The element type
    pub fn element(&self) -> &Type {
        &self.element
    }
}

/// Accepts what any member accepts
#[derive(Debug, Clone)]
pub struct UnionType {
    members: Vec<Type>,
    default: Option<Value>,
}

impl UnionType {
    /// Members in the order they are tried
    pub fn members(&self) -> &[Type] {
        &self.members
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Builder for [`AnyType`]
#[derive(Debug, Default)]
pub struct AnyBuilder {
    default: Option<Value>,
}

impl AnyBuilder {
    /// Override the default (`null`)
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Finish the type
    pub fn build(self) -> Result<Type> {
        Type::Any(AnyType {
            default: Some(self.default.unwrap_or(Value::Null)),
        })
        .checked()
    }
}

/// Builder for [`BooleanType`]
#[derive(Debug, Default)]
pub struct BooleanBuilder {
    default: Option<Value>,
}

impl BooleanBuilder {
    /// Override the default (`false`)
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Finish the type
    pub fn build(self) -> Result<Type> {
        Type::Boolean(BooleanType {
            default: self.default.unwrap_or(Value::Bool(false)),
        })
        .checked()
    }
}

/// Builder for [`StringType`]
#[derive(Debug, Default)]
pub struct StringBuilder {
    min_length: usize,
    max_length: Option<usize>,
    pattern: Option<String>,
    default: Option<Value>,
}

impl StringBuilder {
    /// Minimum length in characters (default 0)
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = len;
        self
    }

    /// Maximum length in characters (default unbounded)
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Regular expression the string must contain a match for
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Override the default (`""`)
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Finish the type
    pub fn build(self) -> Result<Type> {
        if let Some(max) = self.max_length {
            if max < self.min_length {
                return Err(Error::InvalidSchemaOptions(format!(
                    "max_length {} is below min_length {}",
                    max, self.min_length
                )));
            }
        }
        let pattern = self
            .pattern
            .map(|p| {
                Regex::new(&p).map_err(|e| {
                    Error::InvalidSchemaOptions(format!("invalid pattern '{}': {}", p, e))
                })
            })
            .transpose()?;
        Type::String(StringType {
            min_length: self.min_length,
            max_length: self.max_length,
            pattern,
            default: self.default.unwrap_or_else(|| Value::String(String::new())),
        })
        .checked()
    }
}

/// Builder for [`NumberType`]
#[derive(Debug)]
pub struct NumberBuilder {
    min: f64,
    max: f64,
    integer: bool,
    default: Option<Value>,
}

impl Default for NumberBuilder {
    fn default() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            integer: false,
            default: None,
        }
    }
}

impl NumberBuilder {
    /// Inclusive lower bound (default unbounded)
    pub fn min(mut self, min: f64) -> Self {
        self.min = min;
        self
    }

    /// Inclusive upper bound (default unbounded)
    pub fn max(mut self, max: f64) -> Self {
        self.max = max;
        self
    }

    /// Reject values with a fractional part
    pub fn integer(mut self, integer: bool) -> Self {
        self.integer = integer;
        self
    }

    /// Override the default (`0`)
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Finish the type
    pub fn build(self) -> Result<Type> {
        if self.min.is_nan() || self.max.is_nan() || self.max < self.min {
            return Err(Error::InvalidSchemaOptions(format!(
                "number bounds [{}, {}] are empty",
                self.min, self.max
            )));
        }
        Type::Number(NumberType {
            min: self.min,
            max: self.max,
            integer: self.integer,
            default: self.default.unwrap_or_else(|| Value::from(0)),
        })
        .checked()
    }
}

/// Builder for [`NullableType`]
#[derive(Debug)]
pub struct NullableBuilder {
    null: bool,
    undefined: bool,
}

impl Default for NullableBuilder {
    fn default() -> Self {
        Self {
            null: true,
            undefined: true,
        }
    }
}

impl NullableBuilder {
    /// Accept `null` (default true)
    pub fn null(mut self, accept: bool) -> Self {
        self.null = accept;
        self
    }

    /// Accept an absent value (default true)
    pub fn undefined(mut self, accept: bool) -> Self {
        self.undefined = accept;
        self
    }

    /// Finish the type
    ///
    /// Fails with [`Error::InvalidSchemaOptions`] when both forms are disabled.
    pub fn build(self) -> Result<Type> {
        if !self.null && !self.undefined {
            return Err(Error::InvalidSchemaOptions(
                "nullable type must accept null or absence".to_string(),
            ));
        }
        Type::Nullable(NullableType {
            null: self.null,
            undefined: self.undefined,
            default: self.null.then_some(Value::Null),
        })
        .checked()
    }
}

/// Builder for [`DictionaryType`]
#[derive(Debug, Default)]
pub struct DictionaryBuilder {
    fields: Option<Vec<(String, Type)>>,
    default: Option<Value>,
}

impl DictionaryBuilder {
    /// Declare a field; redeclaring a name replaces it
    ///
    /// Declaring any field switches the dictionary from "any object" to a
    /// fixed mapping.
    pub fn field(mut self, name: impl Into<String>, field_type: Type) -> Self {
        let name = name.into();
        let fields = self.fields.get_or_insert_with(Vec::new);
        match fields.iter().position(|(n, _)| *n == name) {
            Some(idx) => fields[idx].1 = field_type,
            None => fields.push((name, field_type)),
        }
        self
    }

    /// Declare a fixed mapping from an iterator; an empty iterator declares
    /// a dictionary that accepts only `{}`
    pub fn fields<N: Into<String>>(mut self, fields: impl IntoIterator<Item = (N, Type)>) -> Self {
        self.fields.get_or_insert_with(Vec::new);
        for (name, field_type) in fields {
            self = self.field(name, field_type);
        }
        self
    }

    /// Override the default (object of field defaults, or `{}`)
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Finish the type
    pub fn build(self) -> Result<Type> {
        let default = match self.default {
            Some(value) => value,
            None => {
                let mut map = Map::new();
                for (name, field_type) in self.fields.iter().flatten() {
                    if let Some(value) = field_type.default_value() {
                        map.insert(name.clone(), value.clone());
                    }
                }
                Value::Object(map)
            }
        };
        Type::Dictionary(DictionaryType {
            fields: self.fields,
            default,
        })
        .checked()
    }
}

/// Builder for [`ListType`]
#[derive(Debug)]
pub struct ListBuilder {
    element: Type,
    default: Option<Value>,
}

impl ListBuilder {
    /// Override the default (`[]`)
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Finish the type
    pub fn build(self) -> Result<Type> {
        Type::List(ListType {
            element: Box::new(self.element),
            default: self.default.unwrap_or_else(|| Value::Array(Vec::new())),
        })
        .checked()
    }
}

/// Builder for [`UnionType`]
#[derive(Debug)]
pub struct UnionBuilder {
    members: Vec<Type>,
    default: Option<Value>,
}

impl UnionBuilder {
    /// Override the default (first member's default)
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Finish the type
    pub fn build(self) -> Result<Type> {
        let Some(first) = self.members.first() else {
            return Err(Error::InvalidSchemaOptions(
                "union needs at least one member".to_string(),
            ));
        };
        let default = match self.default {
            Some(value) => Some(value),
            None => first.default_value().cloned(),
        };
        Type::Union(UnionType {
            members: self.members,
            default,
        })
        .checked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(keys: &[&str]) -> KeyPath {
        KeyPath::from(keys)
    }

    fn sample_schema() -> Type {
        Type::dictionary()
            .field(
                "version",
                Type::number()
                    .integer(true)
                    .min(0.0)
                    .default_value(json!(1))
                    .build()
                    .unwrap(),
            )
            .field(
                "str",
                Type::string()
                    .default_value(json!("Hello, world!"))
                    .build()
                    .unwrap(),
            )
            .field("n", Type::number().build().unwrap())
            .build()
            .unwrap()
    }

    // =========================================================================
    // Scalars
    // =========================================================================

    #[test]
    fn test_any_accepts_everything() {
        let t = Type::any().build().unwrap();
        assert!(t.validate(None).is_valid());
        assert!(t.validate_value(&json!({"x": [1]})).is_valid());
        assert_eq!(t.default_value(), Some(&Value::Null));
    }

    #[test]
    fn test_boolean() {
        let t = Type::boolean().build().unwrap();
        assert!(t.validate_value(&json!(true)).is_valid());
        assert!(!t.validate_value(&json!(0)).is_valid());
        assert!(!t.validate(None).is_valid());
        assert_eq!(t.default_value(), Some(&json!(false)));
    }

    #[test]
    fn test_string_length_bounds() {
        let t = Type::string().min_length(2).max_length(3).default_value(json!("ab")).build().unwrap();
        assert!(!t.validate_value(&json!("a")).is_valid());
        assert!(t.validate_value(&json!("abc")).is_valid());
        assert!(!t.validate_value(&json!("abcd")).is_valid());
        assert!(t.validate_value(&json!("日本語")).is_valid());
        assert!(!t.validate_value(&json!(12)).is_valid());
    }

    #[test]
    fn test_string_pattern_is_unanchored() {
        let t = Type::string().pattern("[0-9]+").default_value(json!("v1")).build().unwrap();
        assert!(t.validate_value(&json!("abc123")).is_valid());
        assert!(!t.validate_value(&json!("abc")).is_valid());
    }

    #[test]
    fn test_string_bad_pattern() {
        let err = Type::string().pattern("(").build().unwrap_err();
        assert!(matches!(err, Error::InvalidSchemaOptions(_)));
    }

    #[test]
    fn test_string_inverted_bounds() {
        let err = Type::string().min_length(5).max_length(1).build().unwrap_err();
        assert!(matches!(err, Error::InvalidSchemaOptions(_)));
    }

    #[test]
    fn test_number_bounds_and_integer() {
        let t = Type::number().min(0.0).max(10.0).integer(true).build().unwrap();
        assert!(t.validate_value(&json!(0)).is_valid());
        assert!(t.validate_value(&json!(10.0)).is_valid());
        assert!(!t.validate_value(&json!(10.5)).is_valid());
        assert!(!t.validate_value(&json!(-1)).is_valid());
        assert!(!t.validate_value(&json!(2.5)).is_valid());
        assert!(!t.validate_value(&json!("3")).is_valid());
    }

    #[test]
    fn test_number_default_out_of_range() {
        let err = Type::number().min(1.0).build().unwrap_err();
        assert_eq!(
            err,
            Error::InvalidDefaultValue {
                paths: vec![KeyPath::root()]
            }
        );
    }

    #[test]
    fn test_nullable_flags() {
        let both = Type::nullable().build().unwrap();
        assert!(both.validate(None).is_valid());
        assert!(both.validate_value(&Value::Null).is_valid());
        assert!(!both.validate_value(&json!(0)).is_valid());

        let only_absent = Type::nullable().null(false).build().unwrap();
        assert!(only_absent.validate(None).is_valid());
        assert!(!only_absent.validate_value(&Value::Null).is_valid());
        assert_eq!(only_absent.default_value(), None);

        let only_null = Type::nullable().undefined(false).build().unwrap();
        assert!(!only_null.validate(None).is_valid());
        assert_eq!(only_null.default_value(), Some(&Value::Null));
    }

    #[test]
    fn test_nullable_requires_one_form() {
        let err = Type::nullable().null(false).undefined(false).build().unwrap_err();
        assert!(matches!(err, Error::InvalidSchemaOptions(_)));
    }

    // =========================================================================
    // Dictionary
    // =========================================================================

    #[test]
    fn test_dictionary_default_from_fields() {
        let t = sample_schema();
        assert_eq!(
            t.default_value(),
            Some(&json!({"version": 1, "str": "Hello, world!", "n": 0}))
        );
    }

    #[test]
    fn test_dictionary_without_mapping_accepts_any_object() {
        let t = Type::dictionary().build().unwrap();
        assert!(t.validate_value(&json!({"anything": [1, 2]})).is_valid());
        assert_eq!(t.validate_value(&json!([])).paths(), &[KeyPath::root()]);
        assert!(!t.validate(None).is_valid());
    }

    #[test]
    fn test_dictionary_reports_each_failure() {
        let t = sample_schema();
        let result = t.validate_value(&json!({"version": "x", "n": 2}));
        assert_eq!(result.paths(), &[p(&["version"]), p(&["str"])]);
    }

    #[test]
    fn test_dictionary_unknown_keys_first() {
        let t = sample_schema();
        let result =
            t.validate_value(&json!({"extra": 1, "version": 1, "str": "s", "n": "bad"}));
        assert_eq!(result.paths(), &[p(&["extra"]), p(&["n"])]);
    }

    #[test]
    fn test_dictionary_nested_prefixes() {
        let inner = Type::dictionary()
            .field("color", Type::string().build().unwrap())
            .build()
            .unwrap();
        let t = Type::dictionary().field("theme", inner).build().unwrap();
        let result = t.validate_value(&json!({"theme": {"color": 1, "size": 2}}));
        assert_eq!(result.paths(), &[p(&["theme", "size"]), p(&["theme", "color"])]);
    }

    #[test]
    fn test_dictionary_optional_field() {
        let t = Type::dictionary()
            .field("nick", Type::nullable().build().unwrap())
            .build()
            .unwrap();
        assert!(t.validate_value(&json!({})).is_valid());
        assert!(t.validate_value(&json!({"nick": null})).is_valid());
        assert_eq!(t.default_value(), Some(&json!({"nick": null})));
    }

    #[test]
    fn test_dictionary_empty_mapping() {
        let t = Type::dictionary()
            .fields(Vec::<(String, Type)>::new())
            .build()
            .unwrap();
        assert!(t.validate_value(&json!({})).is_valid());
        assert_eq!(t.validate_value(&json!({"a": 1})).paths(), &[p(&["a"])]);
    }

    #[test]
    fn test_dictionary_invalid_override_default() {
        let err = Type::dictionary()
            .field("n", Type::number().build().unwrap())
            .default_value(json!({"n": "no"}))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidDefaultValue {
                paths: vec![p(&["n"])]
            }
        );
    }

    // =========================================================================
    // List and Union
    // =========================================================================

    #[test]
    fn test_list_collapses_failures_to_root() {
        let t = Type::list(Type::number().build().unwrap()).build().unwrap();
        assert!(t.validate_value(&json!([1, 2, 3])).is_valid());
        assert_eq!(t.validate_value(&json!([1, "two"])).paths(), &[KeyPath::root()]);
        assert_eq!(t.validate_value(&json!({})).paths(), &[KeyPath::root()]);
    }

    #[test]
    fn test_nested_lists() {
        let row = Type::list(Type::number().build().unwrap()).build().unwrap();
        let grid = Type::list(row).build().unwrap();
        assert_eq!(grid.default_value(), Some(&json!([])));
        assert!(grid.validate_value(&json!([[1, 2], [], [3]])).is_valid());
        assert_eq!(grid.validate_value(&json!([[1], ["x"]])).paths(), &[KeyPath::root()]);
        assert_eq!(grid.validate_value(&json!([1])).paths(), &[KeyPath::root()]);
    }

    #[test]
    fn test_list_of_dictionaries_does_not_subpath() {
        let item = Type::dictionary()
            .field("id", Type::number().build().unwrap())
            .build()
            .unwrap();
        let t = Type::list(item).build().unwrap();
        let result = t.validate_value(&json!([{"id": 1}, {"id": "x"}]));
        assert_eq!(result.paths(), &[KeyPath::root()]);
    }

    #[test]
    fn test_union() {
        let t = Type::union(vec![
            Type::string().build().unwrap(),
            Type::number().build().unwrap(),
        ])
        .build()
        .unwrap();
        assert_eq!(t.default_value(), Some(&json!("")));
        assert!(t.validate_value(&json!("a")).is_valid());
        assert!(t.validate_value(&json!(3)).is_valid());
        assert!(!t.validate_value(&json!(true)).is_valid());
    }

    #[test]
    fn test_union_default_override() {
        let t = Type::union(vec![
            Type::string().build().unwrap(),
            Type::number().build().unwrap(),
        ])
        .default_value(json!(7))
        .build()
        .unwrap();
        assert_eq!(t.default_value(), Some(&json!(7)));
    }

    #[test]
    fn test_union_needs_members() {
        assert!(matches!(
            Type::union(Vec::new()).build(),
            Err(Error::InvalidSchemaOptions(_))
        ));
    }

    // =========================================================================
    // Type paths
    // =========================================================================

    #[test]
    fn test_type_at_path() {
        let t = sample_schema();
        assert_eq!(t.type_at_path(&KeyPath::root()).unwrap().kind_name(), "dictionary");
        assert_eq!(t.type_at_path(&p(&["str"])).unwrap().kind_name(), "string");
        assert!(t.test_type_path(&p(&["n"])));
        assert!(!t.test_type_path(&p(&["missing"])));
        assert!(!t.test_type_path(&p(&["n", "deeper"])));
    }

    #[test]
    fn test_type_path_only_through_declared_dictionaries() {
        let t = Type::dictionary()
            .field("free", Type::dictionary().build().unwrap())
            .field("list", Type::list(Type::any().build().unwrap()).build().unwrap())
            .build()
            .unwrap();
        assert!(t.test_type_path(&p(&["free"])));
        assert!(!t.test_type_path(&p(&["free", "x"])));
        assert!(!t.test_type_path(&p(&["list", "0"])));
        let err = t.type_at_path(&p(&["list", "0"])).unwrap_err();
        assert!(err.to_string().contains("declares no fields"));
    }
}

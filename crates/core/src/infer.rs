//! Type inference from example values
//!
//! Derives a permissive [`Type`] whose default is the example itself. Used
//! when a store is seeded with a default value but no explicit schema.

use crate::error::Result;
use crate::schema::Type;
use serde_json::Value;

/// Infer a type from a possibly-absent example
///
/// - booleans, strings, numbers: the matching variant, defaulting to the example
/// - arrays: a List over the Union of every element's inferred type
///   (an empty array becomes a List of Any), defaulting to the array
/// - objects: a Dictionary declaring one field per key, defaulting to the object
/// - `null`: Nullable accepting `null` only
/// - absent: Nullable accepting absence only
///
/// # Examples
///
/// ```
/// use shapestore_core::infer::infer_type;
/// use serde_json::json;
///
/// let example = json!({"volume": 3, "muted": false});
/// let t = infer_type(Some(&example)).unwrap();
///
/// assert_eq!(t.default_value(), Some(&example));
/// assert!(t.validate_value(&json!({"volume": 9, "muted": true})).is_valid());
/// assert!(!t.validate_value(&json!({"volume": "loud", "muted": true})).is_valid());
/// ```
pub fn infer_type(example: Option<&Value>) -> Result<Type> {
    let Some(value) = example else {
        return Type::nullable().null(false).undefined(true).build();
    };
    match value {
        Value::Null => Type::nullable().null(true).undefined(false).build(),
        Value::Bool(_) => Type::boolean().default_value(value.clone()).build(),
        Value::String(_) => Type::string().default_value(value.clone()).build(),
        Value::Number(_) => Type::number().default_value(value.clone()).build(),
        Value::Array(items) => {
            let element = if items.is_empty() {
                Type::any().build()?
            } else {
                let members = items
                    .iter()
                    .map(|item| infer_type(Some(item)))
                    .collect::<Result<Vec<_>>>()?;
                Type::union(members).build()?
            };
            Type::list(element).default_value(value.clone()).build()
        }
        Value::Object(map) => {
            let mut builder = Type::dictionary().fields(Vec::<(String, Type)>::new());
            for (key, field) in map {
                builder = builder.field(key.as_str(), infer_type(Some(field))?);
            }
            builder.default_value(value.clone()).build()
        }
    }
}

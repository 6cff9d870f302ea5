//! Structured access to event parameters.
//!
//! Params are a single [`serde_json::Value`]. Three shapes are meaningful:
//!
//! | Shape | Read by name | Write by name | Positional view |
//! |-------|--------------|---------------|-----------------|
//! | object | key lookup | insert | `[object]` |
//! | array | index lookup (`"0"`, `"1"`, ...) | set / append at `len` | elements |
//! | scalar | never found | [`EventError::InvalidState`] | `[scalar]` |
//!
//! A stored `null` reads as absent, so `param_or` falls back to its default.

use crate::EventError;
use serde_json::Value;

/// Returns `true` for `null`, `[]` and `{}`.
#[must_use]
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

pub(crate) fn lookup<'a>(params: &'a Value, name: &str) -> Option<&'a Value> {
    let found = match params {
        Value::Object(map) => map.get(name),
        Value::Array(items) => name.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    };
    found.filter(|value| !value.is_null())
}

pub(crate) fn assign(params: &mut Option<Value>, name: &str, value: Value) -> Result<(), EventError> {
    match params {
        Some(Value::Object(map)) => {
            map.insert(name.to_string(), value);
            Ok(())
        }
        Some(Value::Array(items)) => {
            let index = name.parse::<usize>().map_err(|_| {
                EventError::InvalidState(format!(
                    "params is a sequence; '{name}' is not an index"
                ))
            })?;
            let len = items.len();
            match index.cmp(&len) {
                std::cmp::Ordering::Less => items[index] = value,
                std::cmp::Ordering::Equal => items.push(value),
                std::cmp::Ordering::Greater => {
                    return Err(EventError::IndexOutOfRange { index, len });
                }
            }
            Ok(())
        }
        None | Some(Value::Null) => Err(EventError::InvalidState(
            "params not initialized; set a map or sequence first".into(),
        )),
        Some(other) => Err(EventError::InvalidState(format!(
            "params is a scalar ({}) and cannot hold '{name}'",
            kind(other)
        ))),
    }
}

pub(crate) fn positional(params: Option<&Value>) -> Vec<Value> {
    match params {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Wire-format helpers shared by every property class
//!
//! The remote service speaks two dialects. REST sends collections as plain
//! JSON arrays; SOAP wraps them in an object keyed by the element name and
//! collapses single-element lists to a bare object. Readers here accept
//! either shape, writers emit the one the transport expects.

use crate::error::{PropertyError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Transport dialect of the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Rest,
    Soap,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Rest => "rest",
            Transport::Soap => "soap",
        }
    }
}

impl FromStr for Transport {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Transport::Rest),
            "soap" => Ok(Transport::Soap),
            _ => Err(PropertyError::invalid(
                "transport",
                s,
                "expected 'rest' or 'soap'",
            )),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversion between a property class and its untyped wire object
pub trait WireFormat: Sized {
    /// Read the class out of a wire object, validating as it goes
    fn from_wire(value: &Value) -> Result<Self>;

    /// Build the wire object for the given transport
    fn to_wire(&self, transport: Transport) -> Value;
}

/// Borrow a wire value as an object
pub fn as_object<'a>(value: &'a Value, context: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| PropertyError::Malformed(format!("{} must be an object", context)))
}

/// Items of a collection in either dialect
///
/// Accepts: absent/null, a plain array, `{key: item}`, `{key: [items]}`,
/// `{}` and a single bare item.
pub fn list_items<'a>(value: Option<&'a Value>, key: &str) -> Vec<&'a Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(wrapper @ Value::Object(map)) => match map.get(key) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Null) => Vec::new(),
            Some(item) => vec![item],
            None if map.is_empty() => Vec::new(),
            None => vec![wrapper],
        },
        Some(other) => vec![other],
    }
}

/// Wrap a collection for the transport
pub fn wrap_list(transport: Transport, key: &str, mut items: Vec<Value>) -> Value {
    match transport {
        Transport::Rest => Value::Array(items),
        Transport::Soap => {
            let mut wrapper = Map::new();
            match items.len() {
                0 => {}
                1 => {
                    wrapper.insert(key.to_string(), items.remove(0));
                }
                _ => {
                    wrapper.insert(key.to_string(), Value::Array(items));
                }
            }
            Value::Object(wrapper)
        }
    }
}

/// Parse a boolean, accepting the stringly booleans SOAP returns
pub fn parse_bool(field: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(PropertyError::NotBoolean {
            field: field.to_string(),
            value: display_value(other),
        }),
    }
}

/// Boolean member of an object, `default` when absent or null
pub fn bool_field(obj: &Map<String, Value>, key: &str, default: bool) -> Result<bool> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(value) => parse_bool(key, value),
    }
}

/// String member of an object; numbers are accepted for ids
pub fn opt_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

pub fn required_string(obj: &Map<String, Value>, key: &str) -> Result<String> {
    opt_string(obj, key).ok_or_else(|| PropertyError::MissingField {
        field: key.to_string(),
    })
}

/// Reject empty or whitespace-only strings
pub fn non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PropertyError::EmptyValue {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Insert a string member when present
pub fn put_opt(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        map.insert(key.to_string(), Value::String(v.to_string()));
    }
}

/// Render a value for an error message without JSON quoting of strings
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

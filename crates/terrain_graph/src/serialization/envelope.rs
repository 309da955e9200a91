//! Typed envelopes: a value stored under `<Name>` next to its type tag under
//! `<Name>Type`.
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

pub(crate) const ID_KEY: &str = "$id";
pub(crate) const REF_KEY: &str = "$ref";

fn type_key(name: &str) -> String {
    format!("{name}Type")
}

/// Writes `value` under `name` and `tag` under `<name>Type`.
pub(crate) fn put(object: &mut Map<String, Value>, name: &str, tag: &str, value: Value) {
    object.insert(name.to_owned(), value);
    object.insert(type_key(name), Value::String(tag.to_owned()));
}

/// Builds a standalone `{<name>: value, <name>Type: tag}` object.
pub(crate) fn wrap(name: &str, tag: &str, value: Value) -> Map<String, Value> {
    let mut object = Map::new();
    put(&mut object, name, tag, value);
    object
}

/// Reads the tag and value of the envelope `name`.
pub(crate) fn take<'a>(object: &'a Map<String, Value>, name: &str) -> Result<(&'a str, &'a Value)> {
    let key = type_key(name);
    let tag = object
        .get(&key)
        .ok_or_else(|| missing(&key))?
        .as_str()
        .ok_or_else(|| Error::Serialization(format!("field '{key}' must be a string")))?;
    let value = field(object, name)?;
    Ok((tag, value))
}

pub(crate) fn field<'a>(object: &'a Map<String, Value>, name: &str) -> Result<&'a Value> {
    object.get(name).ok_or_else(|| missing(name))
}

/// Decodes a plain field, treating a missing key like `null`.
pub(crate) fn decode_field<T: DeserializeOwned>(
    object: &Map<String, Value>,
    name: &str,
) -> Result<T> {
    let value = object.get(name).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|e| Error::Serialization(format!("invalid field '{name}': {e}")))
}

pub(crate) fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::Serialization(format!("{what} must be an object")))
}

pub(crate) fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| Error::Serialization(format!("{what} must be an array")))
}

fn missing(name: &str) -> Error {
    Error::Serialization(format!("missing field '{name}'"))
}

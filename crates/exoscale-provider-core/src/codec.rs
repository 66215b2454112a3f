//! Helpers mapping host attributes to API records and back
//!
//! Absent optional attributes map to `None`, never to a zero value, so that
//! "not configured" survives the trip into request payloads.

use crate::error::{ProviderError, Result};
use crate::data::ResourceData;
use crate::value::Value;
use std::collections::BTreeMap;

pub fn opt_string(d: &ResourceData, key: &str) -> Option<String> {
    d.get_str(key).map(str::to_string)
}

pub fn opt_int(d: &ResourceData, key: &str) -> Option<i64> {
    d.get_int(key)
}

pub fn opt_bool(d: &ResourceData, key: &str) -> Option<bool> {
    d.get_bool(key)
}

/// A string attribute the schema marks required.
pub fn required_string(d: &ResourceData, key: &str) -> Result<String> {
    opt_string(d, key).ok_or_else(|| ProviderError::invalid(key, "attribute is required"))
}

pub fn required_int(d: &ResourceData, key: &str) -> Result<i64> {
    opt_int(d, key).ok_or_else(|| ProviderError::invalid(key, "attribute is required"))
}

/// Labels as an optional map, `None` when empty.
pub fn opt_labels(d: &ResourceData, key: &str) -> Option<BTreeMap<String, String>> {
    let labels = d.get_string_map(key);
    if labels.is_empty() { None } else { Some(labels) }
}

/// Optional string set, `None` when empty.
pub fn opt_string_set(d: &ResourceData, key: &str) -> Option<Vec<String>> {
    let items = d.get_string_set(key);
    if items.is_empty() { None } else { Some(items) }
}

/// The configured max-items-1 block of `key`, if any.
pub fn single_block(d: &ResourceData, key: &str) -> Option<Block> {
    d.get(key).and_then(block_of)
}

/// The first block of a block list value.
pub fn block_of(value: &Value) -> Option<Block> {
    value
        .as_list()
        .and_then(|items| items.first())
        .and_then(Value::as_map)
        .map(|m| Block(m.clone()))
}

/// Value of an optional labels map coming from the API.
pub fn labels_value(labels: Option<&BTreeMap<String, String>>) -> Value {
    match labels {
        Some(m) if !m.is_empty() => Value::string_map(m),
        _ => Value::Null,
    }
}

/// Value of an optional id/name list coming from the API.
pub fn string_set_value<I, S>(items: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let items: Vec<String> = items.into_iter().map(Into::into).collect();
    if items.is_empty() {
        Value::Null
    } else {
        Value::string_set(items)
    }
}

/// A nested block, read side and write side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block(pub BTreeMap<String, Value>);

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; `Null` values are skipped.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_null() {
            self.0.insert(key.to_string(), value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(Value::as_str).map(str::to_string)
    }

    /// A non-empty string.
    pub fn non_empty_str(&self, key: &str) -> Option<String> {
        self.str(key).filter(|s| !s.is_empty())
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn string_set(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(Value::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Wrap into the one-element list the host stores.
    pub fn into_value(self) -> Value {
        Value::List(vec![Value::Map(self.0)])
    }
}

/// Parse JSON text into canonical form (sorted keys, no whitespace).
/// Text that is not JSON is returned unchanged.
pub fn normalize_json(value: &Value) -> Value {
    match value {
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::String(s) => match serde_json::from_str::<serde_json::Value>(s) {
            Ok(json) => Value::String(json.to_string()),
            Err(_) => value.clone(),
        },
        other => other.clone(),
    }
}

/// Parse an attribute holding a JSON object.
pub fn json_object(d: &ResourceData, key: &str) -> Result<Option<serde_json::Value>> {
    let Some(text) = d.get_str(key).filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| ProviderError::invalid(key, format!("invalid JSON: {}", e)))?;
    if !json.is_object() {
        return Err(ProviderError::invalid(key, "expected a JSON object"));
    }
    Ok(Some(json))
}

/// Canonical JSON text of an API settings object, `Null` when absent or empty.
pub fn json_value(json: Option<&serde_json::Value>) -> Value {
    match json {
        None | Some(serde_json::Value::Null) => Value::Null,
        Some(serde_json::Value::Object(o)) if o.is_empty() => Value::Null,
        Some(j) => Value::String(j.to_string()),
    }
}

/// Split `HH:MM` into hour and minute.
pub fn parse_hh_mm(s: &str) -> Option<(i64, i64)> {
    let (h, m) = s.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let hour: i64 = h.parse().ok()?;
    let minute: i64 = m.parse().ok()?;
    if (0..24).contains(&hour) && (0..60).contains(&minute) {
        Some((hour, minute))
    } else {
        None
    }
}

pub fn format_hh_mm(hour: i64, minute: i64) -> String {
    format!("{:02}:{:02}", hour, minute)
}

//! Database settings checks
//!
//! The server publishes a JSON schema per settings block. User settings are
//! checked against it before anything is sent: unknown keys, type mismatches,
//! `enum` misses, `minimum`/`maximum` and `maxLength` breaches, and `pattern`
//! mismatches are rejected.

use exoscale_provider_core::ProviderError;
use regex::Regex;
use serde_json::{Map, Value as JsonValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl From<Violation> for ProviderError {
    fn from(v: Violation) -> Self {
        ProviderError::invalid(v.path, v.message)
    }
}

/// Check the settings object at `path` against `schema`.
pub(crate) fn check(path: &str, settings: &JsonValue, schema: &JsonValue) -> Result<(), Violation> {
    match settings {
        JsonValue::Object(fields) => check_object(path, fields, schema),
        other => Err(Violation::new(
            path,
            format!("expected an object, got {}", json_type(other)),
        )),
    }
}

fn check_object(path: &str, fields: &Map<String, JsonValue>, schema: &JsonValue) -> Result<(), Violation> {
    let properties = schema.get("properties").and_then(JsonValue::as_object);
    for (key, value) in fields {
        let field_path = format!("{}.{}", path, key);
        let Some(sub) = properties.and_then(|p| p.get(key)) else {
            return Err(Violation::new(&field_path, "unknown setting"));
        };
        check_value(&field_path, value, sub)?;
    }
    Ok(())
}

fn check_value(path: &str, value: &JsonValue, schema: &JsonValue) -> Result<(), Violation> {
    if let Some(declared) = schema.get("type") {
        let allowed = declared_types(declared);
        if !allowed.is_empty() && !allowed.iter().any(|t| type_matches(t, value)) {
            return Err(Violation::new(
                path,
                format!("expected {}, got {}", allowed.join(" or "), json_type(value)),
            ));
        }
    }
    if value.is_null() {
        return Ok(());
    }

    if let Some(options) = schema.get("enum").and_then(JsonValue::as_array) {
        if !options.contains(value) {
            let names: Vec<String> = options.iter().map(JsonValue::to_string).collect();
            return Err(Violation::new(
                path,
                format!("{} is not one of {}", value, names.join(", ")),
            ));
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = schema.get("minimum").and_then(JsonValue::as_f64) {
            if n < min {
                return Err(Violation::new(path, format!("{} is below the minimum of {}", value, min)));
            }
        }
        if let Some(max) = schema.get("maximum").and_then(JsonValue::as_f64) {
            if n > max {
                return Err(Violation::new(path, format!("{} is above the maximum of {}", value, max)));
            }
        }
    }

    if let Some(s) = value.as_str() {
        if let Some(max) = schema.get("maxLength").and_then(JsonValue::as_u64) {
            if s.chars().count() as u64 > max {
                return Err(Violation::new(path, format!("longer than {} characters", max)));
            }
        }
        if let Some(pattern) = schema.get("pattern").and_then(JsonValue::as_str) {
            match Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => {
                    return Err(Violation::new(
                        path,
                        format!("{:?} does not match {}", s, pattern),
                    ));
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping unusable pattern for {}: {}", path, e),
            }
        }
    }

    match value {
        JsonValue::Object(fields) if schema.get("properties").is_some() => {
            check_object(path, fields, schema)
        }
        JsonValue::Array(items) => match schema.get("items") {
            Some(item_schema) => items
                .iter()
                .enumerate()
                .try_for_each(|(i, item)| check_value(&format!("{}.{}", path, i), item, item_schema)),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

fn declared_types(declared: &JsonValue) -> Vec<&str> {
    match declared {
        JsonValue::String(t) => vec![t.as_str()],
        JsonValue::Array(types) => types.iter().filter_map(JsonValue::as_str).collect(),
        _ => Vec::new(),
    }
}

fn type_matches(declared: &str, value: &JsonValue) -> bool {
    match declared {
        "integer" => {
            value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        "number" => value.is_number(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(n) if n.is_f64() => "number",
        JsonValue::Number(_) => "integer",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

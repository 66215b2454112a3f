//! Persisted resource state
//!
//! [`PersistedState`] is what the host stores for each resource. Storage
//! itself belongs to the host.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State of a single resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Schema version the attributes were written with
    pub schema_version: u32,

    /// Remote identity
    pub id: String,

    /// Every tracked attribute, computed ones included
    pub attributes: BTreeMap<String, Value>,
}

impl PersistedState {
    pub fn new(schema_version: u32, id: impl Into<String>) -> Self {
        Self {
            schema_version,
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

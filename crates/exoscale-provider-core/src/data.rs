//! Attribute bag handed to resource handlers
//!
//! [`ResourceData`] keeps two layers: the prior state (what was stored after
//! the last apply) and the current values (configuration merged with the
//! plan, then overwritten by whatever the handler reads back). Change
//! tracking compares the two through the schema's normalization.

use crate::state::PersistedState;
use crate::schema::Schema;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle operation a timeout applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Create,
    Read,
    Update,
    Delete,
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Create => write!(f, "create"),
            OpKind::Read => write!(f, "read"),
            OpKind::Update => write!(f, "update"),
            OpKind::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: Arc<Schema>,
    id: Option<String>,
    prior: BTreeMap<String, Value>,
    current: BTreeMap<String, Value>,
    timeouts: BTreeMap<OpKind, Duration>,
    conn_info: BTreeMap<String, String>,
}

impl ResourceData {
    /// Data for a resource about to be created from `config`.
    pub fn from_config(schema: Arc<Schema>, config: BTreeMap<String, Value>) -> Self {
        let mut current = schema.coerce(config);
        schema.apply_defaults(&mut current);
        Self {
            schema,
            id: None,
            prior: BTreeMap::new(),
            current,
            timeouts: BTreeMap::new(),
            conn_info: BTreeMap::new(),
        }
    }

    /// Data for an existing resource, with no pending change.
    pub fn from_state(schema: Arc<Schema>, id: impl Into<String>, state: BTreeMap<String, Value>) -> Self {
        let state = schema.coerce(state);
        Self {
            schema,
            id: Some(id.into()),
            prior: state.clone(),
            current: state,
            timeouts: BTreeMap::new(),
            conn_info: BTreeMap::new(),
        }
    }

    /// Data for an in-place update from `prior` state to `planned` values.
    pub fn for_update(
        schema: Arc<Schema>,
        id: impl Into<String>,
        prior: BTreeMap<String, Value>,
        planned: BTreeMap<String, Value>,
    ) -> Self {
        let prior = schema.coerce(prior);
        let mut current = schema.coerce(planned);
        schema.apply_defaults(&mut current);
        Self {
            schema,
            id: Some(id.into()),
            prior,
            current,
            timeouts: BTreeMap::new(),
            conn_info: BTreeMap::new(),
        }
    }

    /// Empty data for an import of `id`.
    pub fn for_import(schema: Arc<Schema>, id: impl Into<String>) -> Self {
        Self::from_state(schema, id, BTreeMap::new())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Mark the resource as gone.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Whether no prior state exists.
    pub fn is_new_resource(&self) -> bool {
        self.prior.is_empty()
    }

    /// The current value of `key`, `None` when unset or null.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.current.get(key).filter(|v| !v.is_null())
    }

    /// The prior value of `key`, `None` when unset or null.
    pub fn get_prior(&self, key: &str) -> Option<&Value> {
        self.prior.get(key).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_int)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_string_set(&self, key: &str) -> Vec<String> {
        string_items(self.get(key))
    }

    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        string_items(self.get(key))
    }

    pub fn get_string_map(&self, key: &str) -> BTreeMap<String, String> {
        self.get(key)
            .and_then(Value::as_map)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `key` holds a non-empty value.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).map(|v| !v.is_empty()).unwrap_or(false)
    }

    /// Whether `key` differs from the prior state after normalization.
    pub fn has_change(&self, key: &str) -> bool {
        let (old, new) = self.change(key);
        match self.schema.get(key) {
            Some(attr) => attr.normalized(&old) != attr.normalized(&new),
            None => old != new,
        }
    }

    /// Whether any of `keys` changed.
    pub fn has_changes(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.has_change(k))
    }

    /// `(old, new)` for `key`.
    pub fn change(&self, key: &str) -> (Value, Value) {
        (
            self.prior.get(key).cloned().unwrap_or_default(),
            self.current.get(key).cloned().unwrap_or_default(),
        )
    }

    /// Set-typed `(removed, added)` members of a string set.
    pub fn set_difference(&self, key: &str) -> (Vec<String>, Vec<String>) {
        let (old, new) = self.change(key);
        let old = string_items(Some(&old));
        let new = string_items(Some(&new));
        let removed = old.iter().filter(|v| !new.contains(v)).cloned().collect();
        let added = new.iter().filter(|v| !old.contains(v)).cloned().collect();
        (removed, added)
    }

    /// Write `value` for a schema attribute. Keys the schema does not
    /// declare are ignored.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        let Some(attr) = self.schema.get(key) else {
            tracing::warn!("Ignoring write to undeclared attribute: {}", key);
            return;
        };
        let value = attr.coerce(value.into());
        self.current.insert(key.to_string(), value);
    }

    /// Write an optional remote value; `None` falls back to the schema default.
    pub fn set_optional<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        match value {
            Some(v) => self.set(key, v),
            None => {
                let fallback = self
                    .schema
                    .get(key)
                    .and_then(|a| a.default.clone())
                    .unwrap_or_default();
                self.set(key, fallback);
            }
        }
    }

    pub fn timeout(&self, op: OpKind) -> Option<Duration> {
        self.timeouts.get(&op).copied()
    }

    pub fn set_timeout(&mut self, op: OpKind, timeout: Duration) {
        self.timeouts.insert(op, timeout);
    }

    pub fn set_timeouts(&mut self, timeouts: BTreeMap<OpKind, Duration>) {
        self.timeouts = timeouts;
    }

    /// Connection details the host may hand to provisioners.
    pub fn set_conn_info(&mut self, info: BTreeMap<String, String>) {
        self.conn_info = info;
    }

    pub fn conn_info(&self) -> &BTreeMap<String, String> {
        &self.conn_info
    }

    /// Current attribute values, nulls included.
    pub fn state(&self) -> &BTreeMap<String, Value> {
        &self.current
    }

    /// Snapshot to hand back to the host. `None` once the id is cleared.
    pub fn to_persisted(&self) -> Option<PersistedState> {
        self.id().map(|id| PersistedState {
            schema_version: self.schema.version,
            id: id.to_string(),
            attributes: self.current.clone(),
        })
    }
}

fn string_items(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

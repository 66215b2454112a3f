//! Diff engine
//!
//! [`compute_diff`] classifies every schema attribute between the prior
//! state and the proposed configuration. [`PhasePlan`] orders the calls of a
//! multi-step update into Stop, Mutate and Start phases.

use crate::schema::Schema;
use crate::value::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    NoOp,
    InPlace,
    ForceNew,
    /// Known only after apply.
    Computed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDiff {
    pub old: Value,
    pub new: Value,
    pub kind: DiffKind,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceDiff {
    attributes: BTreeMap<String, AttributeDiff>,
    creating: bool,
}

/// Compare `prior` state (absent for a new resource) with `config`.
pub fn compute_diff(
    schema: &Schema,
    prior: Option<&BTreeMap<String, Value>>,
    config: &BTreeMap<String, Value>,
) -> ResourceDiff {
    let mut proposed = schema.coerce(config.clone());
    schema.apply_defaults(&mut proposed);
    let prior = prior.map(|p| schema.coerce(p.clone()));

    let mut attributes = BTreeMap::new();
    for (name, attr) in schema.iter() {
        let old = prior
            .as_ref()
            .and_then(|p| p.get(name).cloned())
            .unwrap_or_default();
        let configured = proposed.get(name).cloned().unwrap_or_default();

        let diff = if attr.is_computed_only() || (attr.computed && configured.is_null()) {
            AttributeDiff {
                new: old.clone(),
                old,
                kind: DiffKind::Computed,
            }
        } else if attr.normalized(&old) == attr.normalized(&configured) {
            AttributeDiff {
                old,
                new: configured,
                kind: DiffKind::NoOp,
            }
        } else if attr.force_new && prior.is_some() {
            AttributeDiff {
                old,
                new: configured,
                kind: DiffKind::ForceNew,
            }
        } else {
            AttributeDiff {
                old,
                new: configured,
                kind: DiffKind::InPlace,
            }
        };
        attributes.insert(name.clone(), diff);
    }

    ResourceDiff {
        attributes,
        creating: prior.is_none(),
    }
}

impl ResourceDiff {
    pub fn is_create(&self) -> bool {
        self.creating
    }

    pub fn get(&self, key: &str) -> Option<&AttributeDiff> {
        self.attributes.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeDiff)> {
        self.attributes.iter()
    }

    /// Any attribute forces destroy-and-recreate.
    pub fn requires_replace(&self) -> bool {
        self.attributes
            .values()
            .any(|a| a.kind == DiffKind::ForceNew)
    }

    /// Any attribute needs an API call. Computed values alone do not count.
    pub fn has_changes(&self) -> bool {
        self.attributes
            .values()
            .any(|a| matches!(a.kind, DiffKind::InPlace | DiffKind::ForceNew))
    }

    /// Keys that force a replacement.
    pub fn replace_paths(&self) -> Vec<String> {
        self.attributes
            .iter()
            .filter(|(_, a)| a.kind == DiffKind::ForceNew)
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// The prior value of `key` as the customize hook sees it.
    pub fn old(&self, key: &str) -> Option<&Value> {
        self.get(key).map(|a| &a.old).filter(|v| !v.is_null())
    }

    /// The planned value of `key`.
    pub fn new_value(&self, key: &str) -> Option<&Value> {
        self.get(key).map(|a| &a.new).filter(|v| !v.is_null())
    }

    /// Override the planned value of `key`.
    pub fn set_new(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        let entry = self
            .attributes
            .entry(key.to_string())
            .or_insert_with(|| AttributeDiff {
                old: Value::Null,
                new: Value::Null,
                kind: DiffKind::NoOp,
            });
        entry.new = value;
        if entry.kind != DiffKind::ForceNew {
            entry.kind = if entry.old == entry.new {
                DiffKind::NoOp
            } else {
                DiffKind::InPlace
            };
        }
    }

    /// Require replacement because of `key`.
    pub fn force_new(&mut self, key: &str) {
        if self.creating {
            return;
        }
        if let Some(entry) = self.attributes.get_mut(key) {
            entry.kind = DiffKind::ForceNew;
        }
    }

    /// Mark `key` as unknown until apply.
    pub fn set_new_computed(&mut self, key: &str) {
        if let Some(entry) = self.attributes.get_mut(key) {
            entry.new = Value::Null;
            if entry.kind != DiffKind::ForceNew {
                entry.kind = DiffKind::Computed;
            }
        }
    }

    /// The attribute values the plan expects after apply.
    pub fn planned_state(&self) -> BTreeMap<String, Value> {
        self.attributes
            .iter()
            .map(|(k, a)| (k.clone(), a.new.clone()))
            .collect()
    }
}

/// Execution phase of a multi-step update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Stop,
    Mutate,
    Start,
}

/// Steps grouped by phase. Phases always run Stop, Mutate, Start; steps
/// within a phase keep their insertion order.
#[derive(Debug, Clone)]
pub struct PhasePlan<S> {
    steps: Vec<(Phase, S)>,
}

impl<S> Default for PhasePlan<S> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<S> PhasePlan<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, phase: Phase, step: S) {
        self.steps.push((phase, step));
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Steps in execution order.
    pub fn into_ordered(self) -> Vec<(Phase, S)> {
        let mut steps = self.steps;
        // stable: keeps insertion order inside a phase
        steps.sort_by_key(|(phase, _)| *phase);
        steps
    }
}

//! Plan and apply types
//!
//! A [`Plan`] lists one [`PlanAction`] per resource address. Applying it
//! yields an [`ApplyResult`] carrying the new persisted state of every
//! address touched.

use crate::data::OpKind;
use crate::state::PersistedState;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Desired state of one resource, as handed over by the host
#[derive(Debug, Clone, Default)]
pub struct ResourceRequest {
    /// Logical address, e.g. `exoscale_compute_instance.web`
    pub address: String,

    pub resource_type: String,

    /// Stored state, absent for a resource not yet created
    pub prior: Option<PersistedState>,

    /// Desired configuration; `None` requests deletion
    pub config: Option<BTreeMap<String, Value>>,

    pub timeouts: BTreeMap<OpKind, Duration>,
}

impl ResourceRequest {
    pub fn new(address: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            resource_type: resource_type.into(),
            ..Default::default()
        }
    }

    pub fn with_prior(mut self, prior: PersistedState) -> Self {
        self.prior = Some(prior);
        self
    }

    pub fn with_config(mut self, config: BTreeMap<String, Value>) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_timeout(mut self, op: OpKind, timeout: Duration) -> Self {
        self.timeouts.insert(op, timeout);
        self
    }
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource in place
    Update,
    /// Destroy and recreate
    Replace,
    /// Delete a resource
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Replace => write!(f, "replace"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Planned action for a single resource
#[derive(Debug, Clone)]
pub struct PlanAction {
    pub address: String,

    pub resource_type: String,

    pub action_type: ActionType,

    pub prior: Option<PersistedState>,

    /// Configuration the action applies
    pub config: BTreeMap<String, Value>,

    /// Values expected after apply; computed ones are null until known
    pub planned: BTreeMap<String, Value>,

    /// Attributes forcing a replacement
    pub replace_paths: Vec<String>,

    pub timeouts: BTreeMap<OpKind, Duration>,

    pub description: String,
}

/// Plan containing all actions to be applied
#[derive(Debug, Clone)]
pub struct Plan {
    pub actions: Vec<PlanAction>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<PlanAction>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            has_changes: false,
        }
    }

    pub fn action(&self, address: &str) -> Option<&PlanAction> {
        self.actions.iter().find(|a| a.address == address)
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&PlanAction> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            replace: self.actions_by_type(ActionType::Replace).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to replace, {} to delete, {} unchanged",
            self.create, self.update, self.replace, self.delete, self.no_change
        )
    }
}

/// Result of a single action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub address: String,

    pub action_type: ActionType,

    pub success: bool,

    /// Success message
    pub message: String,

    /// Error message if failed
    pub error: Option<String>,
}

/// Result of applying a plan
#[derive(Debug, Clone, Default)]
pub struct ApplyResult {
    pub succeeded: Vec<ActionResult>,

    pub failed: Vec<ActionResult>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,

    /// New state per address; `None` once the resource is gone
    pub states: BTreeMap<String, Option<PersistedState>>,
}

impl ApplyResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn add_success(&mut self, action: &PlanAction, message: impl Into<String>) {
        self.succeeded.push(ActionResult {
            address: action.address.clone(),
            action_type: action.action_type,
            success: true,
            message: message.into(),
            error: None,
        });
    }

    pub fn add_failure(&mut self, action: &PlanAction, error: impl Into<String>) {
        self.failed.push(ActionResult {
            address: action.address.clone(),
            action_type: action.action_type,
            success: false,
            message: String::new(),
            error: Some(error.into()),
        });
    }
}

use super::Reference;
use serde::{Deserialize, Serialize};

/// State reported by an asynchronous operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationState {
    Pending,
    Success,
    Failure,
    Timeout,
}

impl OperationState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OperationState::Pending)
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationState::Pending => write!(f, "pending"),
            OperationState::Success => write!(f, "success"),
            OperationState::Failure => write!(f, "failure"),
            OperationState::Timeout => write!(f, "timeout"),
        }
    }
}

/// Handle to an asynchronous API operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Operation {
    pub id: String,
    pub state: OperationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Operation {
    /// Id of the object the operation acted upon.
    pub fn reference_id(&self) -> Option<&str> {
        self.reference.as_ref().map(|r| r.id.as_str())
    }
}

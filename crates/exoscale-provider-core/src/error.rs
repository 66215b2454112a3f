//! Provider error types
//!
//! Handlers return [`ProviderError`]; the host receives [`Diagnostic`]s.
//! [`found`] is the not-found classifier used by every Read and Delete.

use exoscale_api::ApiError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Attribute validation failure. `path` names the offending attribute.
    #[error("invalid value for {path}: {message}")]
    InvalidInput { path: String, message: String },

    #[error("resource not found: {0}")]
    NotFound(String),

    /// Rejected call or failed operation. `status` is 0 for operation failures.
    #[error("API error: {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Api,
    Transport,
    Timeout,
    Cancelled,
    Internal,
}

impl ProviderError {
    pub fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::InvalidInput {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::InvalidInput { .. } => ErrorKind::InvalidInput,
            ProviderError::NotFound(_) => ErrorKind::NotFound,
            ProviderError::Api { .. } => ErrorKind::Api,
            ProviderError::Transport(_) => ErrorKind::Transport,
            ProviderError::Timeout(_) => ErrorKind::Timeout,
            ProviderError::Cancelled => ErrorKind::Cancelled,
            ProviderError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the remote object is gone. Transport and API failures never are.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let attribute = match self {
            ProviderError::InvalidInput { path, .. } => Some(path.clone()),
            _ => None,
        };
        let summary = match self.kind() {
            ErrorKind::InvalidInput => "Invalid attribute value",
            ErrorKind::NotFound => "Resource not found",
            ErrorKind::Api => "API request failed",
            ErrorKind::Transport => "Unable to reach the API",
            ErrorKind::Timeout => "Operation timed out",
            ErrorKind::Cancelled => "Operation cancelled",
            ErrorKind::Internal => "Internal provider error",
        };
        Diagnostic {
            severity: Severity::Error,
            summary: summary.to_string(),
            detail: self.to_string(),
            attribute,
        }
    }
}

impl From<ApiError> for ProviderError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(what) => ProviderError::NotFound(what),
            ApiError::Api { status, message } => ProviderError::Api { status, message },
            ApiError::Transport(msg) => ProviderError::Transport(msg),
            ApiError::Timeout => ProviderError::Timeout("deadline exceeded".to_string()),
            ApiError::Cancelled => ProviderError::Cancelled,
            ApiError::Decode(msg) => ProviderError::Internal(format!("decode: {}", msg)),
            ApiError::InvalidRequest(msg) => ProviderError::invalid("request", msg),
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Turn a not-found failure into `Ok(None)`; other errors pass through.
pub fn found<T, E>(result: std::result::Result<T, E>) -> Result<Option<T>>
where
    E: Into<ProviderError>,
{
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            let err = err.into();
            if err.is_not_found() {
                Ok(None)
            } else {
                Err(err)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Diagnostic reported to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Attribute path the diagnostic is bound to, e.g. `healthcheck.0.uri`.
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(attribute: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: "Invalid attribute value".to_string(),
            detail: detail.into(),
            attribute: Some(attribute.into()),
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

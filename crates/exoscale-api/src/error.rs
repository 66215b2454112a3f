//! Exoscale API error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The remote object does not exist (HTTP 404).
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The API rejected the call. `message` is the remote error text.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("operation deadline exceeded")]
    Timeout,

    #[error("operation cancelled")]
    Cancelled,

    #[error("unable to decode API response: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Whether this error means the remote object no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(ApiError::NotFound("instance abc".to_string()).is_not_found());
        assert!(
            !ApiError::Api {
                status: 409,
                message: "conflict".to_string()
            }
            .is_not_found()
        );
        assert!(!ApiError::Transport("connection reset".to_string()).is_not_found());
        assert!(!ApiError::Timeout.is_not_found());
    }
}

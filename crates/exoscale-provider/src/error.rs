//! Provider setup errors

use exoscale_api::ApiError;
use exoscale_provider_config::ConfigError;
use thiserror::Error;

/// Failures while building a [`crate::Provider`]
#[derive(Error, Debug)]
pub enum InitError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API client error: {0}")]
    Client(#[from] ApiError),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

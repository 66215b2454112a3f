//! Tracing setup
//!
//! The host talks to the provider over stdout, so logs always go to stderr.
//! The filter comes from `EXOSCALE_LOG`, then `RUST_LOG`, then `info`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "EXOSCALE_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Build the filter from the environment.
pub fn env_filter() -> EnvFilter {
    for var in [LOG_ENV, "RUST_LOG"] {
        if let Ok(directives) = std::env::var(var) {
            match EnvFilter::try_new(&directives) {
                Ok(filter) => return filter,
                Err(e) => eprintln!("ignoring invalid {}={:?}: {}", var, directives, e),
            }
        }
    }
    EnvFilter::new(DEFAULT_DIRECTIVE)
}

/// Install the global subscriber. Fails if one is already installed.
pub fn try_init_logging() -> Result<(), crate::error::InitError> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter())
        .with_ansi(false)
        .try_init()
        .map_err(|e| crate::error::InitError::Logging(e.to_string()))
}

/// Install the global subscriber, ignoring a second initialization.
pub fn init_logging() {
    if try_init_logging().is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

//! Operation waiter (exponential backoff)
//!
//! Polls asynchronous API operations until they reach a terminal state.
//! Every poll and every sleep runs under the request context, so the
//! caller's deadline and cancellation stop the wait immediately.

use crate::error::{ProviderError, Result};
use exoscale_api::types::{Operation, OperationState};
use exoscale_api::{Context, ExoscaleApi};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Backoff between polls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitConfig {
    /// First delay (milliseconds)
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    /// Delay cap (milliseconds)
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    /// Exponential multiplier
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_initial_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    10000
}
fn default_multiplier() -> f64 {
    1.5
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            multiplier: default_multiplier(),
        }
    }
}

impl WaitConfig {
    /// Delay before poll number `attempt + 1`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        Duration::from_millis((delay as u64).min(self.max_delay_ms))
    }
}

/// Wait for `op` to succeed and return its final state.
pub async fn wait_for_operation(
    ctx: &Context,
    api: &dyn ExoscaleApi,
    op: Operation,
    config: &WaitConfig,
) -> Result<Operation> {
    let mut current = op;
    let mut attempt = 0;
    loop {
        match current.state {
            OperationState::Success => return Ok(current),
            OperationState::Failure => {
                let mut message = current
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("operation {} failed", current.id));
                if let Some(reason) = &current.reason {
                    message = format!("{} ({})", message, reason);
                }
                return Err(ProviderError::Api { status: 0, message });
            }
            OperationState::Timeout => {
                return Err(ProviderError::Timeout(format!(
                    "operation {} timed out remotely",
                    current.id
                )));
            }
            OperationState::Pending => {}
        }

        ctx.sleep(config.delay_for_attempt(attempt)).await?;
        attempt = attempt.saturating_add(1);
        tracing::debug!("Polling operation {} (attempt {})", current.id, attempt);
        current = api.get_operation(ctx, &current.id).await?;
    }
}

/// Poll `check` until it yields a value.
///
/// For resources that report a state field instead of an operation handle.
pub async fn wait_until<T, F, Fut>(
    ctx: &Context,
    config: &WaitConfig,
    description: &str,
    mut check: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let mut attempt = 0;
    loop {
        if let Some(value) = check().await? {
            return Ok(value);
        }
        tracing::debug!("Waiting for {} (attempt {})", description, attempt + 1);
        ctx.sleep(config.delay_for_attempt(attempt)).await.map_err(|e| {
            match ProviderError::from(e) {
                ProviderError::Timeout(_) => {
                    ProviderError::Timeout(format!("gave up waiting for {}", description))
                }
                other => other,
            }
        })?;
        attempt = attempt.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_calculation() {
        let config = WaitConfig {
            initial_delay_ms: 1000,
            max_delay_ms: 10000,
            multiplier: 2.0,
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(8000));
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(10000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_polls_until_ready() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let ctx = Context::background();
        let value = wait_until(&ctx, &WaitConfig::default(), "thing", || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                Ok(if n >= 2 { Some(n) } else { None })
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_honors_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        let result: Result<()> = wait_until(&ctx, &WaitConfig::default(), "never", || async {
            Ok(None)
        })
        .await;
        assert!(matches!(result, Err(ProviderError::Timeout(_))));
    }
}

//! Request-scoped context
//!
//! Every API call and every waiter poll runs under a [`Context`]. The context
//! pins the call to a zone, bounds it with an optional deadline and carries a
//! cancellation token shared with the host. Derived contexts never outlive
//! their parent: deadlines only shrink and cancellation propagates downwards.

use crate::error::{ApiError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct Context {
    zone: Option<String>,
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// A context with no zone, no deadline and a fresh cancellation token.
    pub fn background() -> Self {
        Self {
            zone: None,
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    /// A context cancelled together with `token`.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            zone: None,
            deadline: None,
            cancel: token,
        }
    }

    /// Derive a context pinned to `zone`.
    pub fn with_zone(&self, zone: impl Into<String>) -> Self {
        Self {
            zone: Some(zone.into()),
            deadline: self.deadline,
            cancel: self.cancel.child_token(),
        }
    }

    /// Derive a context whose deadline is at most `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        };
        Self {
            zone: self.zone.clone(),
            deadline: Some(deadline),
            cancel: self.cancel.child_token(),
        }
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    /// The zone, or an error when the caller forgot to install one.
    pub fn require_zone(&self) -> Result<&str> {
        self.zone()
            .ok_or_else(|| ApiError::InvalidRequest("no zone installed on context".to_string()))
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Check the context before starting new work.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ApiError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(ApiError::Timeout);
            }
        }
        Ok(())
    }

    /// Run `fut` bounded by this context's deadline and cancellation.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ApiError::Cancelled),
            _ = expired => Err(ApiError::Timeout),
            result = fut => result,
        }
    }

    /// Sleep for `duration`, waking early on deadline or cancellation.
    pub async fn sleep(&self, duration: Duration) -> Result<()> {
        self.run(async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_zone_keeps_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_secs(30));
        let zoned = ctx.with_zone("ch-gva-2");
        assert_eq!(zoned.zone(), Some("ch-gva-2"));
        assert_eq!(zoned.deadline(), ctx.deadline());
        assert!(Context::background().require_zone().is_err());
    }

    #[test]
    fn test_with_timeout_never_extends_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        let longer = ctx.with_timeout(Duration::from_secs(60));
        assert_eq!(longer.deadline(), ctx.deadline());

        let shorter = ctx.with_timeout(Duration::from_millis(10));
        assert!(shorter.deadline() < ctx.deadline());
    }

    #[tokio::test]
    async fn test_cancellation_propagates_to_children() {
        let parent = Context::background();
        let child = parent.with_zone("de-fra-1");
        parent.cancel();
        assert!(child.is_cancelled());
        let result = child.sleep(Duration::from_secs(60)).await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_times_out() {
        let ctx = Context::background().with_timeout(Duration::from_secs(1));
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ApiError::Timeout)));
    }

    #[tokio::test]
    async fn test_run_passes_through_result() {
        let ctx = Context::background();
        let value = ctx.run(async { Ok(42) }).await.unwrap();
        assert_eq!(value, 42);
    }
}

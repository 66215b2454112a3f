//! State upgrade framework
//!
//! A [`StateUpgrader`] migrates a raw persisted map from `version` to
//! `version + 1`. [`upgrade_chain`] runs every upgrader between the stored
//! version and the schema's current one.

use crate::error::{ProviderError, Result};
use crate::resource::ProviderMeta;
use crate::state::PersistedState;
use async_trait::async_trait;
use exoscale_api::Context;
use std::fmt;
use std::sync::Arc;

/// A single version step. Implementations must be idempotent: state already
/// in the target shape comes back unchanged.
#[async_trait]
pub trait UpgradeState: Send + Sync {
    async fn upgrade(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        state: PersistedState,
    ) -> Result<PersistedState>;
}

#[derive(Clone)]
pub struct StateUpgrader {
    /// Version this upgrader reads
    pub version: u32,
    pub upgrade: Arc<dyn UpgradeState>,
}

impl StateUpgrader {
    pub fn new(version: u32, upgrade: impl UpgradeState + 'static) -> Self {
        Self {
            version,
            upgrade: Arc::new(upgrade),
        }
    }
}

impl fmt::Debug for StateUpgrader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateUpgrader")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Bring `state` up to `target` by chaining `upgraders`.
pub async fn upgrade_chain(
    ctx: &Context,
    meta: &ProviderMeta,
    upgraders: &[StateUpgrader],
    target: u32,
    mut state: PersistedState,
) -> Result<PersistedState> {
    if state.schema_version > target {
        return Err(ProviderError::Internal(format!(
            "state version {} is newer than supported version {}",
            state.schema_version, target
        )));
    }

    while state.schema_version < target {
        let from = state.schema_version;
        let step = upgraders
            .iter()
            .find(|u| u.version == from)
            .ok_or_else(|| {
                ProviderError::Internal(format!("no state upgrader from version {}", from))
            })?;

        tracing::debug!("Upgrading state of {} from version {}", state.id, from);
        state = step.upgrade.upgrade(ctx, meta, state).await?;
        state.schema_version = from + 1;
    }

    Ok(state)
}

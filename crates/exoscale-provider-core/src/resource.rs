//! Resource handler abstraction
//!
//! Every resource kind implements [`ResourceHandler`]. Handlers share a
//! [`ProviderMeta`] holding the API client, waiter settings and a clock.

use crate::data::ResourceData;
use crate::diff::ResourceDiff;
use crate::error::{Diagnostic, ProviderError, Result};
use crate::schema::Schema;
use crate::upgrade::StateUpgrader;
use crate::value::Value;
use crate::waiter::WaitConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use exoscale_api::{Context, ExoscaleApi};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default per-operation timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Zone used for resources that are not regional
pub const DEFAULT_ZONE: &str = "ch-gva-2";

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// State shared by every handler
#[derive(Clone)]
pub struct ProviderMeta {
    pub api: Arc<dyn ExoscaleApi>,
    pub wait: WaitConfig,
    pub default_zone: String,
    pub default_timeout: Duration,
    pub clock: Arc<dyn Clock>,
}

impl ProviderMeta {
    pub fn new(api: Arc<dyn ExoscaleApi>) -> Self {
        Self {
            api,
            wait: WaitConfig::default(),
            default_zone: DEFAULT_ZONE.to_string(),
            default_timeout: DEFAULT_TIMEOUT,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_wait(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_default_zone(mut self, zone: impl Into<String>) -> Self {
        self.default_zone = zone.into();
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

impl fmt::Debug for ProviderMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderMeta")
            .field("wait", &self.wait)
            .field("default_zone", &self.default_zone)
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}

/// Import identifier: `<id>`, `<id>@<zone>`, `<parent>/<id>` or
/// `<parent>/<id>@<zone>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportId {
    pub parent: Option<String>,
    pub id: String,
    pub zone: Option<String>,
}

impl ImportId {
    pub fn parse(raw: &str) -> Result<Self> {
        let (rest, zone) = match raw.rsplit_once('@') {
            Some((rest, zone)) => (rest, Some(zone)),
            None => (raw, None),
        };
        if zone.is_some_and(str::is_empty) {
            return Err(ProviderError::invalid("id", format!("empty zone in {:?}", raw)));
        }

        let (parent, id) = match rest.split_once('/') {
            Some((parent, id)) => (Some(parent), id),
            None => (None, rest),
        };
        if id.is_empty() || parent.is_some_and(str::is_empty) {
            return Err(ProviderError::invalid(
                "id",
                format!("malformed import id {:?}", raw),
            ));
        }

        Ok(Self {
            parent: parent.map(str::to_string),
            id: id.to_string(),
            zone: zone.map(str::to_string),
        })
    }

    pub fn require_zone(&self) -> Result<&str> {
        self.zone.as_deref().ok_or_else(|| {
            ProviderError::invalid("id", format!("expected {}@<zone>", self.id))
        })
    }

    pub fn require_parent(&self) -> Result<&str> {
        self.parent.as_deref().ok_or_else(|| {
            ProviderError::invalid("id", format!("expected <parent>/{}", self.id))
        })
    }
}

/// Handler for one resource kind
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Resource type name, e.g. `exoscale_compute_instance`
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Arc<Schema>;

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()>;

    /// Refresh `d` from the remote side. Clears the id when the object is gone.
    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()>;

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()>;

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()>;

    /// Populate enough attributes for a subsequent Read.
    async fn import(&self, ctx: &Context, id: &str, meta: &ProviderMeta) -> Result<ResourceData>;

    /// Plan-time hook run after the diff is computed.
    async fn customize_diff(
        &self,
        _ctx: &Context,
        _diff: &mut ResourceDiff,
        _meta: &ProviderMeta,
    ) -> Result<()> {
        Ok(())
    }

    /// Plan-time validation of the configuration.
    fn validate(&self, config: &BTreeMap<String, Value>) -> Vec<Diagnostic> {
        self.schema().validate(config)
    }

    fn upgraders(&self) -> Vec<StateUpgrader> {
        Vec::new()
    }
}

//! Exoscale provider
//!
//! [`Provider`] owns every resource handler and drives them for the host.
//! Each operation runs under its own context: the zone comes from the
//! resource's `zone` attribute (or the provider default) and the deadline
//! from the resource's timeout for that operation (or the provider default).

use crate::error::InitError;
use crate::resources;
use exoscale_api::{Client, ClientConfig, Context};
use exoscale_provider_config::ProviderConfig;
use exoscale_provider_core::{
    ActionType, ApplyResult, Diagnostic, OpKind, PersistedState, Plan, PlanAction,
    ProviderError, ProviderMeta, ResourceData, ResourceHandler, ResourceRequest, Result,
    Value, compute_diff, upgrade_chain,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

pub struct Provider {
    handlers: BTreeMap<&'static str, Arc<dyn ResourceHandler>>,
    meta: ProviderMeta,
}

impl Provider {
    pub fn new(meta: ProviderMeta) -> Self {
        let handlers = resources::all()
            .into_iter()
            .map(|h| (h.type_name(), h))
            .collect();
        Self { handlers, meta }
    }

    /// Build a provider talking to the HTTP API.
    pub fn from_config(config: &ProviderConfig) -> std::result::Result<Self, InitError> {
        config.validate()?;

        let mut client_config = ClientConfig::new(
            config.key.clone().unwrap_or_default(),
            config.secret.clone().unwrap_or_default(),
        )
        .with_environment(&config.environment);
        if let Some(endpoint) = &config.endpoint {
            client_config = client_config.with_endpoint(endpoint);
        }
        let client = Client::new(client_config)?;

        let meta = ProviderMeta::new(Arc::new(client))
            .with_wait(config.wait.clone())
            .with_default_zone(&config.default_zone)
            .with_default_timeout(config.timeout());
        tracing::info!(
            "Exoscale provider ready (default zone {}, timeout {:?})",
            meta.default_zone,
            meta.default_timeout
        );
        Ok(Self::new(meta))
    }

    pub fn meta(&self) -> &ProviderMeta {
        &self.meta
    }

    pub fn handler(&self, type_name: &str) -> Result<&Arc<dyn ResourceHandler>> {
        self.handlers.get(type_name).ok_or_else(|| {
            ProviderError::invalid("type", format!("unknown resource type {:?}", type_name))
        })
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    pub fn validate(&self, type_name: &str, config: &BTreeMap<String, Value>) -> Vec<Diagnostic> {
        match self.handler(type_name) {
            Ok(handler) => handler.validate(config),
            Err(e) => vec![e.to_diagnostic()],
        }
    }

    fn context(&self, ctx: &Context, zone: Option<&str>, op: Option<(OpKind, &ResourceData)>) -> Context {
        let zone = zone
            .filter(|z| !z.is_empty())
            .unwrap_or(self.meta.default_zone.as_str());
        let timeout = op
            .and_then(|(op, d)| d.timeout(op))
            .unwrap_or(self.meta.default_timeout);
        ctx.with_zone(zone).with_timeout(timeout)
    }

    fn op_context(&self, ctx: &Context, d: &ResourceData, op: OpKind) -> Context {
        self.context(ctx, d.get_str("zone"), Some((op, d)))
    }

    pub async fn create(&self, ctx: &Context, type_name: &str, d: &mut ResourceData) -> Result<()> {
        let handler = self.handler(type_name)?;
        let ctx = self.op_context(ctx, d, OpKind::Create);
        handler.create(&ctx, d, &self.meta).await
    }

    pub async fn read(&self, ctx: &Context, type_name: &str, d: &mut ResourceData) -> Result<()> {
        let handler = self.handler(type_name)?;
        let ctx = self.op_context(ctx, d, OpKind::Read);
        handler.read(&ctx, d, &self.meta).await
    }

    pub async fn update(&self, ctx: &Context, type_name: &str, d: &mut ResourceData) -> Result<()> {
        let handler = self.handler(type_name)?;
        let ctx = self.op_context(ctx, d, OpKind::Update);
        handler.update(&ctx, d, &self.meta).await
    }

    pub async fn delete(&self, ctx: &Context, type_name: &str, d: &mut ResourceData) -> Result<()> {
        let handler = self.handler(type_name)?;
        let ctx = self.op_context(ctx, d, OpKind::Delete);
        handler.delete(&ctx, d, &self.meta).await
    }

    /// Bring stored state up to the handler's schema version.
    pub async fn upgrade_state(
        &self,
        ctx: &Context,
        type_name: &str,
        state: PersistedState,
    ) -> Result<PersistedState> {
        let handler = self.handler(type_name)?;
        let target = handler.schema().version;
        if state.schema_version == target {
            return Ok(state);
        }
        tracing::info!(
            "Upgrading {} state {} from version {} to {}",
            type_name,
            state.id,
            state.schema_version,
            target
        );
        let ctx = self.context(ctx, state.get_str("zone"), None);
        upgrade_chain(&ctx, &self.meta, &handler.upgraders(), target, state).await
    }

    /// Import an existing object and read its full state.
    pub async fn import(&self, ctx: &Context, type_name: &str, id: &str) -> Result<PersistedState> {
        let handler = self.handler(type_name)?;
        let import_ctx = self.context(ctx, None, None);
        let mut d = handler.import(&import_ctx, id, &self.meta).await?;
        self.read(ctx, type_name, &mut d).await?;
        d.to_persisted()
            .ok_or_else(|| ProviderError::NotFound(format!("{} {}", type_name, id)))
    }

    /// Plan one action per request. Prior states are upgraded first.
    pub async fn plan(&self, ctx: &Context, requests: Vec<ResourceRequest>) -> Result<Plan> {
        let mut actions = Vec::with_capacity(requests.len());
        for req in requests {
            if let Some(action) = self.plan_one(ctx, req).await? {
                actions.push(action);
            }
        }
        let plan = Plan::new(actions);
        tracing::info!("Plan: {}", plan.summary());
        Ok(plan)
    }

    async fn plan_one(&self, ctx: &Context, req: ResourceRequest) -> Result<Option<PlanAction>> {
        let handler = self.handler(&req.resource_type)?;
        let schema = handler.schema();

        let prior = match req.prior {
            Some(state) => Some(self.upgrade_state(ctx, &req.resource_type, state).await?),
            None => None,
        };

        let Some(config) = req.config else {
            let Some(prior) = prior else {
                return Ok(None);
            };
            return Ok(Some(PlanAction {
                description: format!("delete {}", req.address),
                address: req.address,
                resource_type: req.resource_type,
                action_type: ActionType::Delete,
                prior: Some(prior),
                config: BTreeMap::new(),
                planned: BTreeMap::new(),
                replace_paths: Vec::new(),
                timeouts: req.timeouts,
            }));
        };

        if let Some(diag) = handler.validate(&config).into_iter().find(Diagnostic::is_error) {
            return Err(ProviderError::invalid(
                diag.attribute.unwrap_or_default(),
                diag.detail,
            ));
        }

        let mut diff = compute_diff(&schema, prior.as_ref().map(|p| &p.attributes), &config);
        let zone = config
            .get("zone")
            .and_then(Value::as_str)
            .or_else(|| prior.as_ref().and_then(|p| p.get_str("zone")));
        let plan_ctx = self.context(ctx, zone, None);
        handler
            .customize_diff(&plan_ctx, &mut diff, &self.meta)
            .await?;

        let action_type = if prior.is_none() {
            ActionType::Create
        } else if diff.requires_replace() {
            ActionType::Replace
        } else if diff.has_changes() {
            ActionType::Update
        } else {
            ActionType::NoOp
        };
        let replace_paths = diff.replace_paths();
        let description = if replace_paths.is_empty() {
            format!("{} {}", action_type, req.address)
        } else {
            format!(
                "{} {} (forced by {})",
                action_type,
                req.address,
                replace_paths.join(", ")
            )
        };
        tracing::debug!("{}", description);

        Ok(Some(PlanAction {
            address: req.address,
            resource_type: req.resource_type,
            action_type,
            prior,
            config,
            planned: diff.planned_state(),
            replace_paths,
            timeouts: req.timeouts,
            description,
        }))
    }

    /// Apply every action in order. A failed action is recorded and the
    /// remaining ones still run.
    pub async fn apply(&self, ctx: &Context, plan: &Plan) -> ApplyResult {
        let mut result = ApplyResult::new();
        let start = Instant::now();

        for action in &plan.actions {
            if action.action_type == ActionType::NoOp {
                result
                    .states
                    .insert(action.address.clone(), action.prior.clone());
                continue;
            }

            tracing::info!("Applying: {}", action.description);
            let outcome = self.apply_one(ctx, action, &mut result).await;
            match outcome {
                Ok(state) => {
                    let message = match &state {
                        Some(s) => format!("{} {} ({})", action.action_type, action.address, s.id),
                        None => format!("{} {}", action.action_type, action.address),
                    };
                    result.states.insert(action.address.clone(), state);
                    result.add_success(action, message);
                }
                Err(e) => {
                    tracing::warn!("{} failed: {}", action.address, e);
                    result.add_failure(action, e.to_string());
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }

    /// Run one action and return the new state of its address.
    async fn apply_one(
        &self,
        ctx: &Context,
        action: &PlanAction,
        result: &mut ApplyResult,
    ) -> Result<Option<PersistedState>> {
        let handler = self.handler(&action.resource_type)?;
        let schema = handler.schema();

        match action.action_type {
            ActionType::NoOp => Ok(action.prior.clone()),
            ActionType::Create => {
                let mut d = ResourceData::from_config(schema, action.config.clone());
                d.set_timeouts(action.timeouts.clone());
                self.create(ctx, &action.resource_type, &mut d).await?;
                Ok(d.to_persisted())
            }
            ActionType::Update => {
                let prior = required_prior(action)?;
                let mut d = ResourceData::for_update(
                    schema,
                    &prior.id,
                    prior.attributes.clone(),
                    action.planned.clone(),
                );
                d.set_timeouts(action.timeouts.clone());
                self.update(ctx, &action.resource_type, &mut d).await?;
                Ok(d.to_persisted())
            }
            ActionType::Replace => {
                let prior = required_prior(action)?;
                let mut old = ResourceData::from_state(schema.clone(), &prior.id, prior.attributes.clone());
                old.set_timeouts(action.timeouts.clone());
                self.delete(ctx, &action.resource_type, &mut old).await?;
                result.states.insert(action.address.clone(), None);

                let mut d = ResourceData::from_config(schema, action.config.clone());
                d.set_timeouts(action.timeouts.clone());
                self.create(ctx, &action.resource_type, &mut d).await?;
                Ok(d.to_persisted())
            }
            ActionType::Delete => {
                let prior = required_prior(action)?;
                let mut d = ResourceData::from_state(schema, &prior.id, prior.attributes.clone());
                d.set_timeouts(action.timeouts.clone());
                self.delete(ctx, &action.resource_type, &mut d).await?;
                Ok(None)
            }
        }
    }
}

fn required_prior(action: &PlanAction) -> Result<&PersistedState> {
    action.prior.as_ref().ok_or_else(|| {
        ProviderError::Internal(format!("{} action for {} has no prior state", action.action_type, action.address))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::resource_tests::meta;

    fn ssh_key_config() -> BTreeMap<String, Value> {
        [
            ("name", Value::from("deploy")),
            (
                "public_key",
                Value::from("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIEk3yG1 deploy@host"),
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[test]
    fn test_every_handler_is_registered() {
        let provider = Provider::new(meta());
        let types: Vec<&str> = provider.resource_types().collect();
        assert_eq!(types.len(), 17);
        assert!(types.contains(&"exoscale_compute_instance"));
        assert!(types.contains(&"exoscale_sks_kubeconfig"));
        assert!(types.contains(&"exoscale_database"));
    }

    #[test]
    fn test_unknown_type() {
        let provider = Provider::new(meta());
        let diags = provider.validate("exoscale_mainframe", &BTreeMap::new());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute.as_deref(), Some("type"));
    }

    #[test]
    fn test_context_prefers_resource_zone_and_timeout() {
        let provider = Provider::new(meta().with_default_zone("de-fra-1"));
        let handler = provider.handler("exoscale_private_network").unwrap();
        let config: BTreeMap<String, Value> = [("name".to_string(), Value::from("backend"))]
            .into_iter()
            .collect();
        let mut d = ResourceData::from_config(handler.schema(), config);

        let ctx = provider.op_context(&Context::background(), &d, OpKind::Create);
        assert_eq!(ctx.zone(), Some("de-fra-1"));

        d.set("zone", "at-vie-1");
        d.set_timeout(OpKind::Create, std::time::Duration::from_secs(5));
        let ctx = provider.op_context(&Context::background(), &d, OpKind::Create);
        assert_eq!(ctx.zone(), Some("at-vie-1"));
        assert!(ctx.remaining().unwrap() <= std::time::Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_plan_create_and_delete() {
        let provider = Provider::new(meta());
        let prior = PersistedState::new(0, "deploy")
            .with_attribute("name", "old")
            .with_attribute("public_key", "ssh-ed25519 AAAA old@host");
        let plan = provider
            .plan(
                &Context::background(),
                vec![
                    ResourceRequest::new("exoscale_ssh_key.new", "exoscale_ssh_key")
                        .with_config(ssh_key_config()),
                    ResourceRequest::new("exoscale_ssh_key.old", "exoscale_ssh_key")
                        .with_prior(prior),
                    ResourceRequest::new("exoscale_ssh_key.none", "exoscale_ssh_key"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(plan.actions.len(), 2);
        assert_eq!(
            plan.action("exoscale_ssh_key.new").unwrap().action_type,
            ActionType::Create
        );
        assert_eq!(
            plan.action("exoscale_ssh_key.old").unwrap().action_type,
            ActionType::Delete
        );
        assert!(plan.has_changes);
    }

    #[tokio::test]
    async fn test_plan_rejects_invalid_config() {
        let provider = Provider::new(meta());
        let err = provider
            .plan(
                &Context::background(),
                vec![ResourceRequest::new("exoscale_ssh_key.bad", "exoscale_ssh_key")
                    .with_config(BTreeMap::new())],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput { .. }));
    }
}

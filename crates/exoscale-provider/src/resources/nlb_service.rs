//! `exoscale_nlb_service`
//!
//! Services live inside their load balancer and are addressed through it.
//! The update call takes the full service definition.

use super::{delete_and_wait, gone, require_id, wait, wait_created, zone_attr};
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::{HealthcheckMode, NlbHealthcheck, NlbServiceRequest, Reference};
use exoscale_provider_core::codec::{
    Block, block_of, opt_string, required_int, required_string, single_block,
};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    Diagnostic, ImportId, ProviderError, ProviderMeta, ResourceData, ResourceHandler, Result,
    Schema, Value, found, validation,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const TYPE_NAME: &str = "exoscale_nlb_service";

/// Attributes sent by the update call
const MUTABLE: &[&str] = &[
    "name",
    "description",
    "protocol",
    "port",
    "target_port",
    "strategy",
    "healthcheck",
];

pub struct NlbServiceResource {
    schema: Arc<Schema>,
}

impl NlbServiceResource {
    pub fn new() -> Self {
        let healthcheck = Schema::new()
            .attr(
                "mode",
                Attribute::string()
                    .optional()
                    .default("tcp")
                    .validate_with(validation::one_of(&["tcp", "http", "https"])),
            )
            .attr(
                "port",
                Attribute::int().required().validate_with(validation::port),
            )
            .attr("uri", Attribute::string().optional())
            .attr(
                "interval",
                Attribute::int()
                    .optional()
                    .default(10_i64)
                    .validate_with(validation::int_at_least(1)),
            )
            .attr(
                "timeout",
                Attribute::int()
                    .optional()
                    .default(5_i64)
                    .validate_with(validation::int_at_least(1)),
            )
            .attr(
                "retries",
                Attribute::int()
                    .optional()
                    .default(1_i64)
                    .validate_with(validation::int_between(1, 20)),
            )
            .attr("tls_sni", Attribute::string().optional());

        let schema = Schema::new()
            .attr(
                "nlb_id",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::uuid),
            )
            .attr("zone", zone_attr())
            .attr(
                "name",
                Attribute::string()
                    .required()
                    .validate_with(validation::non_empty),
            )
            .attr("description", Attribute::string().optional())
            .attr(
                "protocol",
                Attribute::string()
                    .optional()
                    .default("tcp")
                    .validate_with(validation::one_of(&["tcp", "udp"])),
            )
            .attr(
                "port",
                Attribute::int().required().validate_with(validation::port),
            )
            .attr(
                "target_port",
                Attribute::int().required().validate_with(validation::port),
            )
            .attr(
                "strategy",
                Attribute::string()
                    .optional()
                    .default("round-robin")
                    .validate_with(validation::one_of(&["round-robin", "source-hash"])),
            )
            .attr(
                "instance_pool_id",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::uuid),
            )
            .attr("healthcheck", Attribute::block(healthcheck).required())
            .attr("state", Attribute::string().computed());
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for NlbServiceResource {
    fn default() -> Self {
        Self::new()
    }
}

fn check_healthcheck(block: &Block) -> std::result::Result<HealthcheckMode, (String, String)> {
    let raw_mode = block.str("mode").unwrap_or_else(|| "tcp".to_string());
    let mode = HealthcheckMode::parse(&raw_mode).ok_or_else(|| {
        (
            "healthcheck.0.mode".to_string(),
            format!("{:?} must be one of tcp, http or https", raw_mode),
        )
    })?;
    if mode != HealthcheckMode::Tcp && block.non_empty_str("uri").is_none() {
        return Err((
            "healthcheck.0.uri".to_string(),
            format!("required for {} healthchecks", mode.as_str()),
        ));
    }
    if mode != HealthcheckMode::Https && block.non_empty_str("tls_sni").is_some() {
        return Err((
            "healthcheck.0.tls_sni".to_string(),
            "only valid for https healthchecks".to_string(),
        ));
    }
    Ok(mode)
}

fn seconds(block: &Block, key: &str) -> Option<Duration> {
    block
        .int(key)
        .filter(|s| *s >= 0)
        .map(|s| Duration::from_secs(s as u64))
}

fn service_request(d: &ResourceData) -> Result<NlbServiceRequest> {
    let block = single_block(d, "healthcheck")
        .ok_or_else(|| ProviderError::invalid("healthcheck", "attribute is required"))?;
    let mode = check_healthcheck(&block).map_err(|(path, msg)| ProviderError::invalid(path, msg))?;

    Ok(NlbServiceRequest {
        name: required_string(d, "name")?,
        description: opt_string(d, "description"),
        protocol: opt_string(d, "protocol").unwrap_or_else(|| "tcp".to_string()),
        port: required_int(d, "port")?,
        target_port: required_int(d, "target_port")?,
        strategy: opt_string(d, "strategy").unwrap_or_else(|| "round-robin".to_string()),
        healthcheck: NlbHealthcheck {
            mode,
            port: block.int("port").ok_or_else(|| {
                ProviderError::invalid("healthcheck.0.port", "attribute is required")
            })?,
            uri: (mode != HealthcheckMode::Tcp)
                .then(|| block.non_empty_str("uri"))
                .flatten(),
            interval: seconds(&block, "interval"),
            timeout: seconds(&block, "timeout"),
            retries: block.int("retries"),
            tls_sni: (mode == HealthcheckMode::Https)
                .then(|| block.non_empty_str("tls_sni"))
                .flatten(),
        },
        instance_pool: Reference::new(required_string(d, "instance_pool_id")?),
    })
}

fn healthcheck_value(hc: NlbHealthcheck) -> Value {
    Block::new()
        .with("mode", hc.mode.as_str())
        .with("port", hc.port)
        .with("uri", hc.uri)
        .with("interval", hc.interval.map(|d| d.as_secs() as i64))
        .with("timeout", hc.timeout.map(|d| d.as_secs() as i64))
        .with("retries", hc.retries)
        .with("tls_sni", hc.tls_sni)
        .into_value()
}

#[async_trait]
impl ResourceHandler for NlbServiceResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn validate(&self, config: &BTreeMap<String, Value>) -> Vec<Diagnostic> {
        let mut diags = self.schema.validate(config);
        if let Some(block) = config.get("healthcheck").and_then(block_of) {
            if let Err((path, msg)) = check_healthcheck(&block) {
                diags.push(Diagnostic::error(path, msg));
            }
        }
        diags
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let nlb_id = required_string(d, "nlb_id")?;
        let req = service_request(d)?;
        tracing::info!("Adding service {} to network load balancer: {}", req.name, nlb_id);

        let op = meta
            .api
            .add_service_to_load_balancer(ctx, &nlb_id, &req)
            .await?;
        let id = wait_created(ctx, meta, op).await?;
        d.set_id(id);

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let nlb_id = required_string(d, "nlb_id")?;
        let Some(service) = found(meta.api.get_load_balancer_service(ctx, &nlb_id, &id).await)?
        else {
            gone(d, "NLB service");
            return Ok(());
        };

        d.set("name", service.name);
        d.set("description", service.description);
        d.set("protocol", service.protocol);
        d.set("port", service.port);
        d.set("target_port", service.target_port);
        d.set("strategy", service.strategy);
        d.set("instance_pool_id", service.instance_pool.id);
        d.set("healthcheck", healthcheck_value(service.healthcheck));
        d.set("state", service.state);
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let nlb_id = required_string(d, "nlb_id")?;

        if d.has_changes(MUTABLE) {
            let req = service_request(d)?;
            tracing::info!("Updating NLB service: {}", id);
            let op = meta
                .api
                .update_load_balancer_service(ctx, &nlb_id, &id, &req)
                .await?;
            wait(ctx, meta, op).await?;
        }

        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let nlb_id = required_string(d, "nlb_id")?;
        tracing::info!("Deleting NLB service: {}", id);
        delete_and_wait(
            ctx,
            meta,
            meta.api.delete_load_balancer_service(ctx, &nlb_id, &id).await,
        )
        .await
    }

    /// `<nlb-id>/<service-id>@<zone>`
    async fn import(&self, _ctx: &Context, id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        let id = ImportId::parse(id)?;
        let nlb_id = id.require_parent()?.to_string();
        let zone = id.require_zone()?.to_string();
        let mut d = ResourceData::for_import(self.schema(), &id.id);
        d.set("nlb_id", nlb_id);
        d.set("zone", zone);
        Ok(d)
    }
}

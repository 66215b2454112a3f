//! `exoscale_elastic_ip`
//!
//! The optional healthcheck block turns the address into a managed one.
//! Its cross-field rules are checked at plan time and again before any
//! write; removing the block resets the remote healthcheck.

use super::{
    delete_and_wait, gone, import_regional, labels_attr, require_id, wait, wait_created,
    zone_attr,
};
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::{
    AddressFamily, CreateElasticIpRequest, ElasticIpHealthcheck, HealthcheckMode,
    UpdateElasticIpRequest,
};
use exoscale_provider_core::codec::{
    Block, block_of, labels_value, opt_labels, opt_string, single_block,
};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    Diagnostic, ProviderError, ProviderMeta, ResourceData, ResourceDiff, ResourceHandler, Result,
    Schema, Value, found, validation,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub const TYPE_NAME: &str = "exoscale_elastic_ip";

pub struct ElasticIpResource {
    schema: Arc<Schema>,
}

impl ElasticIpResource {
    pub fn new() -> Self {
        let healthcheck = Schema::new()
            .attr(
                "mode",
                Attribute::string()
                    .required()
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
                    .validate_with(validation::int_between(5, 300)),
            )
            .attr(
                "timeout",
                Attribute::int()
                    .optional()
                    .default(3_i64)
                    .validate_with(validation::int_between(2, 60)),
            )
            .attr(
                "strikes_ok",
                Attribute::int()
                    .optional()
                    .default(2_i64)
                    .validate_with(validation::int_between(1, 20)),
            )
            .attr(
                "strikes_fail",
                Attribute::int()
                    .optional()
                    .default(3_i64)
                    .validate_with(validation::int_between(1, 20)),
            )
            .attr("tls_sni", Attribute::string().optional())
            .attr(
                "tls_skip_verify",
                Attribute::bool().optional().default(false),
            );

        let schema = Schema::new()
            .attr("zone", zone_attr())
            .attr(
                "address_family",
                Attribute::string()
                    .optional()
                    .default("inet4")
                    .force_new()
                    .validate_with(validation::ip_family),
            )
            .attr("description", Attribute::string().optional())
            .attr("reverse_dns", Attribute::string().optional())
            .attr("labels", labels_attr())
            .attr("healthcheck", Attribute::block(healthcheck).optional())
            .attr("ip_address", Attribute::string().computed())
            .attr("cidr", Attribute::string().computed());
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for ElasticIpResource {
    fn default() -> Self {
        Self::new()
    }
}

/// Check the mode-dependent healthcheck rules. Errors carry the offending
/// attribute path.
fn check_healthcheck(block: &Block) -> std::result::Result<HealthcheckMode, (String, String)> {
    let raw_mode = block.str("mode").unwrap_or_default();
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
    if mode != HealthcheckMode::Https {
        if block.non_empty_str("tls_sni").is_some() {
            return Err((
                "healthcheck.0.tls_sni".to_string(),
                "only valid for https healthchecks".to_string(),
            ));
        }
        if block.bool("tls_skip_verify") == Some(true) {
            return Err((
                "healthcheck.0.tls_skip_verify".to_string(),
                "only valid for https healthchecks".to_string(),
            ));
        }
    }
    Ok(mode)
}

fn seconds(block: &Block, key: &str) -> Option<Duration> {
    block
        .int(key)
        .filter(|s| *s >= 0)
        .map(|s| Duration::from_secs(s as u64))
}

/// The configured healthcheck, validated.
fn healthcheck(d: &ResourceData) -> Result<Option<ElasticIpHealthcheck>> {
    let Some(block) = single_block(d, "healthcheck") else {
        return Ok(None);
    };
    let mode = check_healthcheck(&block).map_err(|(path, msg)| ProviderError::invalid(path, msg))?;
    let https = mode == HealthcheckMode::Https;

    Ok(Some(ElasticIpHealthcheck {
        mode,
        port: block
            .int("port")
            .ok_or_else(|| ProviderError::invalid("healthcheck.0.port", "attribute is required"))?,
        uri: (mode != HealthcheckMode::Tcp)
            .then(|| block.non_empty_str("uri"))
            .flatten(),
        interval: seconds(&block, "interval"),
        timeout: seconds(&block, "timeout"),
        strikes_ok: block.int("strikes_ok"),
        strikes_fail: block.int("strikes_fail"),
        tls_sni: https.then(|| block.non_empty_str("tls_sni")).flatten(),
        tls_skip_verify: https.then(|| block.bool("tls_skip_verify").unwrap_or(false)),
    }))
}

fn without_nulls(block: &Block) -> Block {
    Block(
        block
            .0
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}

/// A tcp healthcheck never carries a `uri`, so a configured one is dropped
/// from the plan instead of showing up as drift against the remote.
fn drop_tcp_uri(diff: &mut ResourceDiff) {
    let Some(mut planned) = diff.new_value("healthcheck").and_then(block_of) else {
        return;
    };
    if planned.str("mode").as_deref() != Some(HealthcheckMode::Tcp.as_str())
        || planned.get("uri").is_none()
    {
        return;
    }
    planned.0.remove("uri");

    let prior = diff.old("healthcheck").cloned();
    let unchanged = prior
        .as_ref()
        .and_then(block_of)
        .is_some_and(|old| without_nulls(&old) == without_nulls(&planned));
    match prior {
        Some(old) if unchanged => diff.set_new("healthcheck", old),
        _ => diff.set_new("healthcheck", planned.into_value()),
    }
}

fn healthcheck_value(hc: Option<ElasticIpHealthcheck>) -> Value {
    let Some(hc) = hc else {
        return Value::Null;
    };
    Block::new()
        .with("mode", hc.mode.as_str())
        .with("port", hc.port)
        .with("uri", hc.uri)
        .with("interval", hc.interval.map(|d| d.as_secs() as i64))
        .with("timeout", hc.timeout.map(|d| d.as_secs() as i64))
        .with("strikes_ok", hc.strikes_ok)
        .with("strikes_fail", hc.strikes_fail)
        .with("tls_sni", hc.tls_sni)
        .with("tls_skip_verify", hc.tls_skip_verify)
        .into_value()
}

async fn apply_reverse_dns(
    ctx: &Context,
    meta: &ProviderMeta,
    id: &str,
    domain: Option<&str>,
) -> Result<()> {
    match domain.filter(|s| !s.is_empty()) {
        Some(domain) => {
            tracing::debug!("Setting reverse DNS of elastic IP {} to {}", id, domain);
            let op = meta
                .api
                .update_reverse_dns_elastic_ip(ctx, id, domain)
                .await?;
            wait(ctx, meta, op).await?;
        }
        None => {
            tracing::debug!("Clearing reverse DNS of elastic IP {}", id);
            delete_and_wait(
                ctx,
                meta,
                meta.api.delete_reverse_dns_elastic_ip(ctx, id).await,
            )
            .await?;
        }
    }
    Ok(())
}

#[async_trait]
impl ResourceHandler for ElasticIpResource {
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

    async fn customize_diff(
        &self,
        _ctx: &Context,
        diff: &mut ResourceDiff,
        _meta: &ProviderMeta,
    ) -> Result<()> {
        drop_tcp_uri(diff);
        Ok(())
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let family = opt_string(d, "address_family").unwrap_or_else(|| "inet4".to_string());
        let req = CreateElasticIpRequest {
            address_family: Some(AddressFamily::parse(&family).ok_or_else(|| {
                ProviderError::invalid("address_family", format!("unknown family {:?}", family))
            })?),
            description: opt_string(d, "description"),
            healthcheck: healthcheck(d)?,
            labels: opt_labels(d, "labels"),
        };
        tracing::info!("Creating {} elastic IP", family);

        let op = meta.api.create_elastic_ip(ctx, &req).await?;
        let id = wait_created(ctx, meta, op).await?;
        d.set_id(id.clone());

        if let Some(domain) = opt_string(d, "reverse_dns").filter(|s| !s.is_empty()) {
            apply_reverse_dns(ctx, meta, &id, Some(&domain)).await?;
        }

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let Some(eip) = found(meta.api.get_elastic_ip(ctx, &id).await)? else {
            gone(d, "Elastic IP");
            return Ok(());
        };
        let reverse_dns = found(meta.api.get_reverse_dns_elastic_ip(ctx, &id).await)?
            .and_then(|r| r.domain_name);

        d.set_optional("address_family", eip.address_family.map(|f| f.as_str()));
        d.set("description", eip.description);
        d.set("reverse_dns", reverse_dns);
        d.set("labels", labels_value(eip.labels.as_ref()));
        d.set("healthcheck", healthcheck_value(eip.healthcheck));
        d.set("ip_address", eip.ip);
        d.set("cidr", eip.cidr);
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;

        let mut req = UpdateElasticIpRequest::default();
        let mut reset_healthcheck = false;
        if d.has_change("description") {
            req.description = Some(opt_string(d, "description").unwrap_or_default());
        }
        if d.has_change("labels") {
            req.labels = Some(d.get_string_map("labels"));
        }
        if d.has_change("healthcheck") {
            match healthcheck(d)? {
                Some(hc) => req.healthcheck = Some(hc),
                None => reset_healthcheck = true,
            }
        }

        if !req.is_empty() {
            tracing::info!("Updating elastic IP: {}", id);
            let op = meta.api.update_elastic_ip(ctx, &id, &req).await?;
            wait(ctx, meta, op).await?;
        }
        if reset_healthcheck {
            tracing::info!("Removing healthcheck of elastic IP: {}", id);
            let op = meta.api.reset_elastic_ip_field(ctx, &id, "healthcheck").await?;
            wait(ctx, meta, op).await?;
        }
        if d.has_change("reverse_dns") {
            apply_reverse_dns(ctx, meta, &id, d.get_str("reverse_dns")).await?;
        }

        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        tracing::info!("Deleting elastic IP: {}", id);
        delete_and_wait(ctx, meta, meta.api.delete_elastic_ip(ctx, &id).await).await
    }

    async fn import(&self, _ctx: &Context, id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        import_regional(self.schema(), id)
    }
}

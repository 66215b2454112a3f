//! `exoscale_sks_kubeconfig`
//!
//! A generated kubeconfig has no remote handle. Its identity is the list of
//! embedded certificate serials; Read only re-inspects the stored document
//! and Delete forgets it. The plan-time hook forces a new kubeconfig once a
//! certificate gets within `early_renewal_seconds` of its expiry.

use super::{require_id, zone_attr};
use crate::kubeconfig::KubeconfigDocument;
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::SksKubeconfigRequest;
use exoscale_provider_core::codec::{opt_int, required_string};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    ProviderError, ProviderMeta, ResourceData, ResourceDiff, ResourceHandler, Result, Schema,
    Value, validation,
};
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_sks_kubeconfig";

pub struct SksKubeconfigResource {
    schema: Arc<Schema>,
}

impl SksKubeconfigResource {
    pub fn new() -> Self {
        let schema = Schema::new()
            .attr(
                "cluster_id",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::uuid),
            )
            .attr("zone", zone_attr())
            .attr(
                "user",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::non_empty),
            )
            .attr(
                "groups",
                Attribute::string_list().required().force_new(),
            )
            .attr(
                "ttl_seconds",
                Attribute::int()
                    .optional()
                    .default(0_i64)
                    .force_new()
                    .validate_with(validation::int_at_least(0))
                    .describe("Certificate lifetime, 0 for the server default"),
            )
            .attr(
                "early_renewal_seconds",
                Attribute::int()
                    .optional()
                    .default(0_i64)
                    .validate_with(validation::int_at_least(0)),
            )
            .attr("kubeconfig", Attribute::string().computed().sensitive())
            .attr("ready_for_renewal", Attribute::bool().computed());
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for SksKubeconfigResource {
    fn default() -> Self {
        Self::new()
    }
}

fn early_renewal(value: Option<&Value>) -> i64 {
    value.and_then(Value::as_int).unwrap_or(0)
}

#[async_trait]
impl ResourceHandler for SksKubeconfigResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let cluster_id = required_string(d, "cluster_id")?;
        let req = SksKubeconfigRequest {
            user: required_string(d, "user")?,
            groups: d.get_string_list("groups"),
            ttl: opt_int(d, "ttl_seconds").filter(|ttl| *ttl > 0),
        };
        tracing::info!(
            "Generating kubeconfig for {} on SKS cluster: {}",
            req.user,
            cluster_id
        );

        let generated = meta
            .api
            .generate_sks_cluster_kubeconfig(ctx, &cluster_id, &req)
            .await?;
        let doc = KubeconfigDocument::decode(&generated.kubeconfig)?;
        if doc.certificates().is_empty() {
            return Err(ProviderError::Internal(
                "generated kubeconfig embeds no certificate".to_string(),
            ));
        }

        d.set_id(doc.identity());
        d.set("kubeconfig", doc.as_str());
        self.read(ctx, d, meta).await
    }

    async fn read(&self, _ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let Some(text) = d.get_str("kubeconfig").map(str::to_string) else {
            return Ok(());
        };
        let doc = KubeconfigDocument::parse(&text)?;
        let ready = doc.ready_for_renewal(meta.now(), early_renewal(d.get("early_renewal_seconds")));
        d.set("ready_for_renewal", ready);
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        self.read(ctx, d, meta).await
    }

    async fn delete(&self, _ctx: &Context, d: &mut ResourceData, _meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        tracing::info!("Forgetting kubeconfig: {}", id);
        Ok(())
    }

    async fn import(&self, _ctx: &Context, _id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        Err(ProviderError::invalid(
            "id",
            "kubeconfigs cannot be imported",
        ))
    }

    async fn customize_diff(
        &self,
        _ctx: &Context,
        diff: &mut ResourceDiff,
        meta: &ProviderMeta,
    ) -> Result<()> {
        if diff.is_create() {
            return Ok(());
        }
        let Some(text) = diff.old("kubeconfig").and_then(Value::as_str) else {
            return Ok(());
        };
        let doc = KubeconfigDocument::parse(text)?;
        let early = early_renewal(diff.new_value("early_renewal_seconds"));
        if doc.ready_for_renewal(meta.now(), early) {
            tracing::info!(
                "Kubeconfig certificates expire before {}, planning renewal",
                meta.now() + chrono::Duration::seconds(early)
            );
            diff.set_new("ready_for_renewal", true);
            diff.force_new("ready_for_renewal");
        }
        Ok(())
    }
}

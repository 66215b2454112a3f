//! `exoscale_nlb`

use super::{
    delete_and_wait, gone, import_regional, labels_attr, require_id, wait, wait_created,
    zone_attr,
};
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::NlbRequest;
use exoscale_provider_core::codec::{labels_value, opt_labels, opt_string, required_string, string_set_value};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    ProviderMeta, ResourceData, ResourceHandler, Result, Schema, found, validation,
};
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_nlb";

pub struct NlbResource {
    schema: Arc<Schema>,
}

impl NlbResource {
    pub fn new() -> Self {
        let schema = Schema::new()
            .attr("zone", zone_attr())
            .attr(
                "name",
                Attribute::string()
                    .required()
                    .validate_with(validation::non_empty),
            )
            .attr("description", Attribute::string().optional())
            .attr("labels", labels_attr())
            .attr("ip_address", Attribute::string().computed())
            .attr("state", Attribute::string().computed())
            .attr("services", Attribute::string_set().computed())
            .attr("created_at", Attribute::string().computed());
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for NlbResource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceHandler for NlbResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let req = NlbRequest {
            name: Some(required_string(d, "name")?),
            description: opt_string(d, "description"),
            labels: opt_labels(d, "labels"),
        };
        tracing::info!("Creating network load balancer: {}", req.name.as_deref().unwrap_or_default());

        let op = meta.api.create_load_balancer(ctx, &req).await?;
        let id = wait_created(ctx, meta, op).await?;
        d.set_id(id);

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let Some(nlb) = found(meta.api.get_load_balancer(ctx, &id).await)? else {
            gone(d, "Network load balancer");
            return Ok(());
        };

        d.set("name", nlb.name);
        d.set("description", nlb.description);
        d.set("labels", labels_value(nlb.labels.as_ref()));
        d.set("ip_address", nlb.ip);
        d.set("state", nlb.state);
        d.set(
            "services",
            string_set_value(nlb.services.unwrap_or_default().into_iter().map(|s| s.id)),
        );
        d.set("created_at", nlb.created_at);
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;

        let mut req = NlbRequest::default();
        if d.has_change("name") {
            req.name = Some(required_string(d, "name")?);
        }
        if d.has_change("description") {
            req.description = Some(opt_string(d, "description").unwrap_or_default());
        }
        if d.has_change("labels") {
            req.labels = Some(d.get_string_map("labels"));
        }
        if req != NlbRequest::default() {
            tracing::info!("Updating network load balancer: {}", id);
            let op = meta.api.update_load_balancer(ctx, &id, &req).await?;
            wait(ctx, meta, op).await?;
        }

        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        tracing::info!("Deleting network load balancer: {}", id);
        delete_and_wait(ctx, meta, meta.api.delete_load_balancer(ctx, &id).await).await
    }

    async fn import(&self, _ctx: &Context, id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        import_regional(self.schema(), id)
    }
}

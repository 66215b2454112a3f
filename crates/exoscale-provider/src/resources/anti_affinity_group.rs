//! `exoscale_anti_affinity_group`

use super::{delete_and_wait, gone, import_regional, require_id, wait_created, zone_attr};
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::{CreateAntiAffinityGroupRequest, reference_ids};
use exoscale_provider_core::codec::{opt_string, required_string, string_set_value};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    ProviderMeta, ResourceData, ResourceHandler, Result, Schema, found, validation,
};
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_anti_affinity_group";

pub struct AntiAffinityGroupResource {
    schema: Arc<Schema>,
}

impl AntiAffinityGroupResource {
    pub fn new() -> Self {
        let schema = Schema::new()
            .attr("zone", zone_attr())
            .attr(
                "name",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::non_empty),
            )
            .attr("description", Attribute::string().optional().force_new())
            .attr(
                "instances",
                Attribute::string_set()
                    .computed()
                    .describe("IDs of the instances in the group"),
            );
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for AntiAffinityGroupResource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceHandler for AntiAffinityGroupResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let req = CreateAntiAffinityGroupRequest {
            name: required_string(d, "name")?,
            description: opt_string(d, "description"),
        };
        tracing::info!("Creating anti-affinity group: {}", req.name);

        let op = meta.api.create_anti_affinity_group(ctx, &req).await?;
        let id = wait_created(ctx, meta, op).await?;
        d.set_id(id);

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let Some(group) = found(meta.api.get_anti_affinity_group(ctx, &id).await)? else {
            gone(d, "Anti-affinity group");
            return Ok(());
        };

        d.set("name", group.name);
        d.set("description", group.description);
        d.set("instances", string_set_value(reference_ids(&group.instances)));
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        // every configurable attribute forces a new group
        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        tracing::info!("Deleting anti-affinity group: {}", id);
        delete_and_wait(ctx, meta, meta.api.delete_anti_affinity_group(ctx, &id).await).await
    }

    async fn import(&self, _ctx: &Context, id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        import_regional(self.schema(), id)
    }
}

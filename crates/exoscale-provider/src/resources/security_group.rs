//! `exoscale_security_group`
//!
//! Security groups are global. Rules are separate resources; only the
//! external sources are managed here, reconciled by set difference.

use super::{delete_and_wait, gone, reconcile_set, require_id, wait, wait_created};
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::CreateSecurityGroupRequest;
use exoscale_provider_core::codec::{opt_string, required_string, string_set_value};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    ImportId, ProviderMeta, ResourceData, ResourceHandler, Result, Schema, found, validation,
};
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_security_group";

pub struct SecurityGroupResource {
    schema: Arc<Schema>,
}

impl SecurityGroupResource {
    pub fn new() -> Self {
        let schema = Schema::new()
            .attr(
                "name",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::non_empty),
            )
            .attr("description", Attribute::string().optional().force_new())
            .attr(
                "external_sources",
                Attribute::string_set()
                    .optional()
                    .validate_with(validation::cidr)
                    .describe("CIDR networks allowed as rule sources"),
            );
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for SecurityGroupResource {
    fn default() -> Self {
        Self::new()
    }
}

async fn sync_external_sources(
    ctx: &Context,
    meta: &ProviderMeta,
    id: &str,
    removed: Vec<String>,
    added: Vec<String>,
) -> Result<()> {
    reconcile_set(
        removed,
        added,
        |cidr| async move {
            tracing::debug!("Removing external source {} from security group {}", cidr, id);
            let op = meta
                .api
                .remove_external_source_from_security_group(ctx, id, &cidr)
                .await?;
            wait(ctx, meta, op).await.map(|_| ())
        },
        |cidr| async move {
            tracing::debug!("Adding external source {} to security group {}", cidr, id);
            let op = meta
                .api
                .add_external_source_to_security_group(ctx, id, &cidr)
                .await?;
            wait(ctx, meta, op).await.map(|_| ())
        },
    )
    .await
}

#[async_trait]
impl ResourceHandler for SecurityGroupResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let req = CreateSecurityGroupRequest {
            name: required_string(d, "name")?,
            description: opt_string(d, "description"),
        };
        tracing::info!("Creating security group: {}", req.name);

        let op = meta.api.create_security_group(ctx, &req).await?;
        let id = wait_created(ctx, meta, op).await?;
        d.set_id(id.clone());

        let sources = d.get_string_set("external_sources");
        sync_external_sources(ctx, meta, &id, Vec::new(), sources).await?;

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let Some(group) = found(meta.api.get_security_group(ctx, &id).await)? else {
            gone(d, "Security group");
            return Ok(());
        };

        d.set("name", group.name);
        d.set("description", group.description);
        d.set(
            "external_sources",
            string_set_value(group.external_sources.unwrap_or_default()),
        );
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        if d.has_change("external_sources") {
            let (removed, added) = d.set_difference("external_sources");
            tracing::info!("Updating external sources of security group: {}", id);
            sync_external_sources(ctx, meta, &id, removed, added).await?;
        }
        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        tracing::info!("Deleting security group: {}", id);
        delete_and_wait(ctx, meta, meta.api.delete_security_group(ctx, &id).await).await
    }

    async fn import(&self, _ctx: &Context, id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        let id = ImportId::parse(id)?;
        Ok(ResourceData::for_import(self.schema(), id.id))
    }
}

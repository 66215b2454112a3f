//! `exoscale_ssh_key`
//!
//! SSH keys are global and identified by name. The public key itself is
//! never returned by the API, so Read keeps the stored value.

use super::{delete_and_wait, gone, require_id, wait};
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::RegisterSshKeyRequest;
use exoscale_provider_core::codec::required_string;
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    ImportId, ProviderMeta, ResourceData, ResourceHandler, Result, Schema, found, validation,
};
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_ssh_key";

pub struct SshKeyResource {
    schema: Arc<Schema>,
}

impl SshKeyResource {
    pub fn new() -> Self {
        let schema = Schema::new()
            .attr(
                "name",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::non_empty),
            )
            .attr(
                "public_key",
                Attribute::string()
                    .required()
                    .force_new()
                    .normalize_with(|v| match v.as_str() {
                        Some(s) => s.trim().into(),
                        None => v.clone(),
                    }),
            )
            .attr("fingerprint", Attribute::string().computed());
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for SshKeyResource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceHandler for SshKeyResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let req = RegisterSshKeyRequest {
            name: required_string(d, "name")?,
            public_key: required_string(d, "public_key")?,
        };
        tracing::info!("Registering SSH key: {}", req.name);

        let op = meta.api.register_ssh_key(ctx, &req).await?;
        wait(ctx, meta, op).await?;
        d.set_id(req.name);

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let name = require_id(d)?;
        let Some(key) = found(meta.api.get_ssh_key(ctx, &name).await)? else {
            gone(d, "SSH key");
            return Ok(());
        };

        d.set("name", key.name);
        d.set("fingerprint", key.fingerprint);
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let name = require_id(d)?;
        tracing::info!("Deleting SSH key: {}", name);
        delete_and_wait(ctx, meta, meta.api.delete_ssh_key(ctx, &name).await).await
    }

    async fn import(&self, _ctx: &Context, id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        let id = ImportId::parse(id)?;
        Ok(ResourceData::for_import(self.schema(), id.id))
    }
}

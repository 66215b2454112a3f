//! `exoscale_dns_domain`
//!
//! Schema version 1 identifies domains by UUID. Version 0 stored the domain
//! name as the id; [`DomainIdUpgrade`] remaps it.

use super::{delete_and_wait, gone, require_id};
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::DnsDomain;
use exoscale_provider_core::codec::required_string;
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    ImportId, PersistedState, ProviderError, ProviderMeta, ResourceData, ResourceHandler, Result,
    Schema, StateUpgrader, UpgradeState, found, validation,
};
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_dns_domain";

pub struct DnsDomainResource {
    schema: Arc<Schema>,
}

impl DnsDomainResource {
    pub fn new() -> Self {
        let schema = Schema::new()
            .version(1)
            .attr(
                "name",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::dns_name),
            )
            .attr("created_at", Attribute::string().computed());
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for DnsDomainResource {
    fn default() -> Self {
        Self::new()
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// Look a domain up by its name.
pub(crate) async fn find_domain(
    ctx: &Context,
    meta: &ProviderMeta,
    name: &str,
) -> Result<Option<DnsDomain>> {
    let domains = meta.api.list_dns_domains(ctx).await?;
    Ok(domains
        .into_iter()
        .find(|d| same_name(&d.unicode_name, name)))
}

/// Version 0 to 1: replace a domain-name id by the domain's UUID.
pub struct DomainIdUpgrade;

#[async_trait]
impl UpgradeState for DomainIdUpgrade {
    async fn upgrade(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        mut state: PersistedState,
    ) -> Result<PersistedState> {
        if validation::is_uuid(&state.id) {
            return Ok(state);
        }

        let name = state.get_str("name").unwrap_or(state.id.as_str()).to_string();
        let domain = find_domain(ctx, meta, &name)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("DNS domain {}", name)))?;
        tracing::debug!("Remapping DNS domain {} to {}", state.id, domain.id);
        state.id = domain.id;
        Ok(state)
    }
}

#[async_trait]
impl ResourceHandler for DnsDomainResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let name = required_string(d, "name")?;
        tracing::info!("Creating DNS domain: {}", name);

        let domain = meta.api.create_dns_domain(ctx, &name).await?;
        d.set_id(domain.id);

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let Some(domain) = found(meta.api.get_dns_domain(ctx, &id).await)? else {
            gone(d, "DNS domain");
            return Ok(());
        };

        d.set("name", domain.unicode_name);
        d.set("created_at", domain.created_at);
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        tracing::info!("Deleting DNS domain: {}", id);
        delete_and_wait(ctx, meta, meta.api.delete_dns_domain(ctx, &id).await).await
    }

    /// Accepts the domain UUID or, for older configurations, its name.
    async fn import(&self, ctx: &Context, id: &str, meta: &ProviderMeta) -> Result<ResourceData> {
        let id = ImportId::parse(id)?;
        if validation::is_uuid(&id.id) {
            return Ok(ResourceData::for_import(self.schema(), id.id));
        }

        let domain = find_domain(ctx, meta, &id.id)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("DNS domain {}", id.id)))?;
        Ok(ResourceData::for_import(self.schema(), domain.id))
    }

    fn upgraders(&self) -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, DomainIdUpgrade)]
    }
}

//! `exoscale_dns_domain_record`
//!
//! Records are scoped to their domain, referenced by UUID since schema
//! version 1. [`RecordIdUpgrade`] remaps version 0 states that stored the
//! domain name and a legacy numeric record id.

use super::dns_domain::find_domain;
use super::{delete_and_wait, gone, require_id, wait, wait_created};
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::{CreateDnsDomainRecordRequest, UpdateDnsDomainRecordRequest};
use exoscale_provider_core::codec::{opt_int, required_string};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    ImportId, PersistedState, ProviderError, ProviderMeta, ResourceData, ResourceHandler, Result,
    Schema, StateUpgrader, UpgradeState, Value, found, validation,
};
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_dns_domain_record";

const RECORD_TYPES: &[&str] = &[
    "A", "AAAA", "ALIAS", "CAA", "CNAME", "HINFO", "MX", "NAPTR", "NS", "POOL", "SPF", "SRV",
    "SSHFP", "TXT", "URL",
];

const DEFAULT_TTL: i64 = 3600;

pub struct DnsDomainRecordResource {
    schema: Arc<Schema>,
}

impl DnsDomainRecordResource {
    pub fn new() -> Self {
        let schema = Schema::new()
            .version(1)
            .attr(
                "domain",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::uuid)
                    .describe("UUID of the parent domain"),
            )
            .attr(
                "name",
                Attribute::string()
                    .required()
                    .describe("Record name relative to the domain, empty for the apex"),
            )
            .attr(
                "record_type",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::one_of(RECORD_TYPES)),
            )
            .attr(
                "content",
                Attribute::string()
                    .required()
                    .validate_with(validation::non_empty),
            )
            .attr(
                "ttl",
                Attribute::int()
                    .optional()
                    .default(DEFAULT_TTL)
                    .validate_with(validation::int_at_least(0)),
            )
            .attr(
                "prio",
                Attribute::int()
                    .optional()
                    .computed()
                    .validate_with(validation::int_at_least(0)),
            )
            .attr("hostname", Attribute::string().computed());
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for DnsDomainRecordResource {
    fn default() -> Self {
        Self::new()
    }
}

fn hostname(name: &str, domain: &str) -> String {
    if name.is_empty() {
        domain.to_string()
    } else {
        format!("{}.{}", name, domain)
    }
}

/// Version 0 to 1: remap the domain to its UUID, then a non-UUID record id
/// to the record with the same name, type and content.
pub struct RecordIdUpgrade;

#[async_trait]
impl UpgradeState for RecordIdUpgrade {
    async fn upgrade(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        mut state: PersistedState,
    ) -> Result<PersistedState> {
        let Some(domain) = state.get_str("domain").map(str::to_string) else {
            return Ok(state);
        };

        let domain_id = if validation::is_uuid(&domain) {
            domain
        } else {
            match find_domain(ctx, meta, &domain).await? {
                Some(remote) => {
                    state
                        .attributes
                        .insert("domain".to_string(), Value::from(remote.id.as_str()));
                    remote.id
                }
                None => return Err(ProviderError::NotFound(format!("DNS domain {}", domain))),
            }
        };

        if validation::is_uuid(&state.id) {
            return Ok(state);
        }

        let name = state.get_str("name").unwrap_or_default().to_string();
        let record_type = state.get_str("record_type").unwrap_or_default().to_string();
        let content = state.get_str("content").unwrap_or_default().to_string();
        let records = meta.api.list_dns_domain_records(ctx, &domain_id).await?;
        let record = records
            .into_iter()
            .find(|r| r.name == name && r.record_type == record_type && r.content == content)
            .ok_or_else(|| {
                ProviderError::NotFound(format!(
                    "DNS record {} {} {:?} in domain {}",
                    name, record_type, content, domain_id
                ))
            })?;
        tracing::debug!("Remapping DNS record {} to {}", state.id, record.id);
        state.id = record.id;
        Ok(state)
    }
}

#[async_trait]
impl ResourceHandler for DnsDomainRecordResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let domain_id = required_string(d, "domain")?;
        let req = CreateDnsDomainRecordRequest {
            name: d.get_str("name").unwrap_or_default().to_string(),
            record_type: required_string(d, "record_type")?,
            content: required_string(d, "content")?,
            ttl: opt_int(d, "ttl"),
            priority: opt_int(d, "prio"),
        };
        tracing::info!(
            "Creating {} record {:?} in DNS domain: {}",
            req.record_type,
            req.name,
            domain_id
        );

        let op = meta
            .api
            .create_dns_domain_record(ctx, &domain_id, &req)
            .await?;
        let id = wait_created(ctx, meta, op).await?;
        d.set_id(id);

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let domain_id = required_string(d, "domain")?;
        let Some(domain) = found(meta.api.get_dns_domain(ctx, &domain_id).await)? else {
            gone(d, "DNS record");
            return Ok(());
        };
        let Some(record) = found(meta.api.get_dns_domain_record(ctx, &domain_id, &id).await)?
        else {
            gone(d, "DNS record");
            return Ok(());
        };

        d.set("hostname", hostname(&record.name, &domain.unicode_name));
        d.set("name", record.name);
        d.set("record_type", record.record_type);
        d.set("content", record.content);
        d.set_optional("ttl", record.ttl);
        d.set("prio", record.priority);
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let domain_id = required_string(d, "domain")?;

        let mut req = UpdateDnsDomainRecordRequest::default();
        if d.has_change("name") {
            req.name = Some(d.get_str("name").unwrap_or_default().to_string());
        }
        if d.has_change("content") {
            req.content = Some(required_string(d, "content")?);
        }
        if d.has_change("ttl") {
            req.ttl = Some(opt_int(d, "ttl").unwrap_or(DEFAULT_TTL));
        }
        if d.has_change("prio") {
            req.priority = opt_int(d, "prio");
        }

        if !req.is_empty() {
            tracing::info!("Updating DNS record: {}", id);
            let op = meta
                .api
                .update_dns_domain_record(ctx, &domain_id, &id, &req)
                .await?;
            wait(ctx, meta, op).await?;
        }

        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let domain_id = required_string(d, "domain")?;
        tracing::info!("Deleting DNS record: {}", id);
        delete_and_wait(
            ctx,
            meta,
            meta.api.delete_dns_domain_record(ctx, &domain_id, &id).await,
        )
        .await
    }

    async fn import(&self, _ctx: &Context, id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        let id = ImportId::parse(id)?;
        let domain_id = id.require_parent()?.to_string();
        let mut d = ResourceData::for_import(self.schema(), &id.id);
        d.set("domain", domain_id);
        Ok(d)
    }

    fn upgraders(&self) -> Vec<StateUpgrader> {
        vec![StateUpgrader::new(0, RecordIdUpgrade)]
    }
}

//! Resource handlers
//!
//! One module per resource kind. Every handler follows the same shape:
//! Create issues the API calls and waits, then delegates to Read; Read
//! projects the remote object or clears the id when it is gone; Delete treats
//! not-found as success.

pub mod anti_affinity_group;
pub mod compute_instance;
pub mod database;
pub mod dns_domain;
pub mod dns_domain_record;
pub mod elastic_ip;
pub mod iam_access_key;
pub mod instance_pool;
pub mod nlb;
pub mod nlb_service;
pub mod private_network;
pub mod security_group;
pub mod security_group_rule;
pub mod sks_cluster;
pub mod sks_kubeconfig;
pub mod sks_nodepool;
pub mod ssh_key;

use exoscale_api::types::{InstanceType, Operation};
use exoscale_api::{ApiError, Context};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    ImportId, ProviderError, ProviderMeta, ResourceData, ResourceHandler, Result, Schema,
    found, validation, wait_for_operation,
};
use futures_util::future::try_join_all;
use std::future::Future;
use std::sync::Arc;

/// Every handler the provider registers.
pub fn all() -> Vec<Arc<dyn ResourceHandler>> {
    vec![
        Arc::new(anti_affinity_group::AntiAffinityGroupResource::new()),
        Arc::new(compute_instance::ComputeInstanceResource::new()),
        Arc::new(database::DatabaseResource::new()),
        Arc::new(dns_domain::DnsDomainResource::new()),
        Arc::new(dns_domain_record::DnsDomainRecordResource::new()),
        Arc::new(elastic_ip::ElasticIpResource::new()),
        Arc::new(iam_access_key::IamAccessKeyResource::new()),
        Arc::new(instance_pool::InstancePoolResource::new()),
        Arc::new(nlb::NlbResource::new()),
        Arc::new(nlb_service::NlbServiceResource::new()),
        Arc::new(private_network::PrivateNetworkResource::new()),
        Arc::new(security_group::SecurityGroupResource::new()),
        Arc::new(security_group_rule::SecurityGroupRuleResource::new()),
        Arc::new(sks_cluster::SksClusterResource::new()),
        Arc::new(sks_kubeconfig::SksKubeconfigResource::new()),
        Arc::new(sks_nodepool::SksNodepoolResource::new()),
        Arc::new(ssh_key::SshKeyResource::new()),
    ]
}

pub(crate) fn zone_attr() -> Attribute {
    Attribute::string()
        .required()
        .force_new()
        .validate_with(validation::non_empty)
        .describe("Zone the resource lives in")
}

pub(crate) fn labels_attr() -> Attribute {
    Attribute::string_map().optional()
}

/// Wait for `op` with the provider's backoff settings.
pub(crate) async fn wait(ctx: &Context, meta: &ProviderMeta, op: Operation) -> Result<Operation> {
    wait_for_operation(ctx, meta.api.as_ref(), op, &meta.wait).await
}

/// Wait for a create operation and return the id of the new object.
pub(crate) async fn wait_created(ctx: &Context, meta: &ProviderMeta, op: Operation) -> Result<String> {
    let op = wait(ctx, meta, op).await?;
    op.reference_id()
        .map(str::to_string)
        .ok_or_else(|| ProviderError::Internal(format!("operation {} has no reference", op.id)))
}

pub(crate) fn require_id(d: &ResourceData) -> Result<String> {
    d.id()
        .map(str::to_string)
        .ok_or_else(|| ProviderError::Internal("resource has no id".to_string()))
}

/// Forget a resource that no longer exists remotely.
pub(crate) fn gone(d: &mut ResourceData, kind: &str) {
    tracing::warn!(
        "{} {} not found, removing from state",
        kind,
        d.id().unwrap_or_default()
    );
    d.clear_id();
}

/// Issue a delete call and wait for it. Not-found counts as success.
pub(crate) async fn delete_and_wait(
    ctx: &Context,
    meta: &ProviderMeta,
    call: std::result::Result<Operation, ApiError>,
) -> Result<()> {
    if let Some(op) = found(call)? {
        match wait(ctx, meta, op).await {
            Err(e) if e.is_not_found() => {}
            other => {
                other?;
            }
        }
    }
    Ok(())
}

/// Detach every removed member, then attach every added one. Calls inside
/// each half run concurrently; the first failure aborts.
pub(crate) async fn reconcile_set<D, DF, A, AF>(
    removed: Vec<String>,
    added: Vec<String>,
    detach: D,
    attach: A,
) -> Result<()>
where
    D: Fn(String) -> DF,
    DF: Future<Output = Result<()>>,
    A: Fn(String) -> AF,
    AF: Future<Output = Result<()>>,
{
    try_join_all(removed.into_iter().map(detach)).await?;
    try_join_all(added.into_iter().map(attach)).await?;
    Ok(())
}

/// Data for a regional resource imported as `<id>@<zone>`.
pub(crate) fn import_regional(schema: Arc<Schema>, raw: &str) -> Result<ResourceData> {
    let id = ImportId::parse(raw)?;
    let zone = id.require_zone()?.to_string();
    let mut d = ResourceData::for_import(schema, &id.id);
    d.set("zone", zone);
    Ok(d)
}

/// Resolve a `<family>.<size>` name against the catalog.
pub(crate) async fn resolve_instance_type(
    ctx: &Context,
    meta: &ProviderMeta,
    key: &str,
    name: &str,
) -> Result<InstanceType> {
    let wanted = name.to_lowercase();
    let types = meta.api.list_instance_types(ctx).await?;
    types
        .into_iter()
        .find(|t| t.name() == wanted)
        .ok_or_else(|| ProviderError::invalid(key, format!("unknown instance type {:?}", name)))
}

/// Host-side name of the instance type with catalog id `id`.
pub(crate) async fn instance_type_name(
    ctx: &Context,
    meta: &ProviderMeta,
    id: &str,
) -> Result<Option<String>> {
    let types = meta.api.list_instance_types(ctx).await?;
    Ok(types.into_iter().find(|t| t.id == id).map(|t| t.name()))
}

/// Instance type names compare case-insensitively.
pub(crate) fn lowercase(value: &exoscale_provider_core::Value) -> exoscale_provider_core::Value {
    match value.as_str() {
        Some(s) => s.to_lowercase().into(),
        None => value.clone(),
    }
}

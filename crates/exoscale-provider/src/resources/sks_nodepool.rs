//! `exoscale_sks_nodepool`
//!
//! Nodepools are scoped to their cluster. A size change is a scale call;
//! every other change goes out in a single update payload.

use super::{
    delete_and_wait, gone, instance_type_name, labels_attr, require_id, resolve_instance_type,
    wait, wait_created, zone_attr,
};
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::{
    CreateSksNodepoolRequest, KubeletImageGc, PublicIpAssignment, Reference, SksNodepoolTaint,
    UpdateSksNodepoolRequest, reference_ids, references,
};
use exoscale_provider_core::codec::{
    Block, labels_value, opt_labels, opt_string, required_int, required_string, single_block,
    string_set_value,
};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    ImportId, ProviderError, ProviderMeta, ResourceData, ResourceHandler, Result, Schema, Value,
    found, validation,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_sks_nodepool";

const STORAGE_LVM_ADDON: &str = "storage-lvm";
const DEFAULT_DISK_SIZE: i64 = 50;
const DEFAULT_PREFIX: &str = "pool";

pub struct SksNodepoolResource {
    schema: Arc<Schema>,
}

fn taint_notation(value: &Value) -> std::result::Result<(), String> {
    match value.as_str() {
        Some(s) if split_taint(s).is_none() => {
            Err(format!("{:?} is not of the form <value>:<effect>", s))
        }
        _ => Ok(()),
    }
}

fn split_taint(s: &str) -> Option<(&str, &str)> {
    let (value, effect) = s.split_once(':')?;
    if value.is_empty() || effect.is_empty() || effect.contains(':') {
        return None;
    }
    Some((value, effect))
}

impl SksNodepoolResource {
    pub fn new() -> Self {
        let kubelet_image_gc = Schema::new()
            .attr(
                "high_threshold",
                Attribute::int()
                    .optional()
                    .validate_with(validation::int_between(0, 100)),
            )
            .attr(
                "low_threshold",
                Attribute::int()
                    .optional()
                    .validate_with(validation::int_between(0, 100)),
            )
            .attr("min_age", Attribute::string().optional());

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
                "name",
                Attribute::string()
                    .required()
                    .validate_with(validation::non_empty),
            )
            .attr("description", Attribute::string().optional())
            .attr(
                "instance_type",
                Attribute::string()
                    .required()
                    .validate_with(validation::instance_type)
                    .normalize_with(super::lowercase),
            )
            .attr(
                "disk_size",
                Attribute::int()
                    .optional()
                    .default(DEFAULT_DISK_SIZE)
                    .validate_with(validation::int_at_least(20)),
            )
            .attr(
                "size",
                Attribute::int()
                    .required()
                    .validate_with(validation::int_at_least(0)),
            )
            .attr("template_id", Attribute::string().computed())
            .attr("version", Attribute::string().computed())
            .attr(
                "instance_prefix",
                Attribute::string().optional().default(DEFAULT_PREFIX),
            )
            .attr(
                "storage_lvm",
                Attribute::bool().optional().default(false).force_new(),
            )
            .attr("ipv6", Attribute::bool().optional().default(false))
            .attr(
                "taints",
                Attribute::string_map()
                    .optional()
                    .validate_with(taint_notation)
                    .describe("Kubernetes taints as key => <value>:<effect>"),
            )
            .attr("labels", labels_attr())
            .attr(
                "anti_affinity_group_ids",
                Attribute::string_set()
                    .optional()
                    .validate_with(validation::uuid),
            )
            .attr(
                "security_group_ids",
                Attribute::string_set()
                    .optional()
                    .validate_with(validation::uuid),
            )
            .attr(
                "private_network_ids",
                Attribute::string_set()
                    .optional()
                    .validate_with(validation::uuid),
            )
            .attr(
                "deploy_target_id",
                Attribute::string()
                    .optional()
                    .validate_with(validation::uuid),
            )
            .attr(
                "kubelet_image_gc",
                Attribute::block(kubelet_image_gc).optional(),
            )
            .attr("instance_pool_id", Attribute::string().computed())
            .attr("state", Attribute::string().computed())
            .attr("created_at", Attribute::string().computed());
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for SksNodepoolResource {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_taints(raw: &BTreeMap<String, String>) -> Result<BTreeMap<String, SksNodepoolTaint>> {
    raw.iter()
        .map(|(key, notation)| {
            let (value, effect) = split_taint(notation).ok_or_else(|| {
                ProviderError::invalid(
                    format!("taints.{}", key),
                    format!("{:?} is not of the form <value>:<effect>", notation),
                )
            })?;
            Ok((
                key.clone(),
                SksNodepoolTaint {
                    value: value.to_string(),
                    effect: effect.to_string(),
                },
            ))
        })
        .collect()
}

fn taints_value(taints: Option<&BTreeMap<String, SksNodepoolTaint>>) -> Value {
    let notation: BTreeMap<String, String> = taints
        .map(|t| {
            t.iter()
                .map(|(k, t)| (k.clone(), format!("{}:{}", t.value, t.effect)))
                .collect()
        })
        .unwrap_or_default();
    labels_value(Some(&notation))
}

fn kubelet_image_gc(d: &ResourceData) -> Option<KubeletImageGc> {
    single_block(d, "kubelet_image_gc").map(|b| KubeletImageGc {
        high_threshold: b.int("high_threshold"),
        low_threshold: b.int("low_threshold"),
        min_age: b.non_empty_str("min_age"),
    })
}

fn kubelet_image_gc_value(gc: Option<KubeletImageGc>) -> Value {
    match gc {
        Some(gc) if gc != KubeletImageGc::default() => Block::new()
            .with("high_threshold", gc.high_threshold)
            .with("low_threshold", gc.low_threshold)
            .with("min_age", gc.min_age)
            .into_value(),
        _ => Value::Null,
    }
}

async fn nodepool_update(
    ctx: &Context,
    d: &ResourceData,
    meta: &ProviderMeta,
) -> Result<UpdateSksNodepoolRequest> {
    let mut req = UpdateSksNodepoolRequest::default();
    if d.has_change("name") {
        req.name = Some(required_string(d, "name")?);
    }
    if d.has_change("description") {
        req.description = Some(opt_string(d, "description").unwrap_or_default());
    }
    if d.has_change("instance_type") {
        let name = required_string(d, "instance_type")?;
        let instance_type = resolve_instance_type(ctx, meta, "instance_type", &name).await?;
        req.instance_type = Some(Reference::new(instance_type.id));
    }
    if d.has_change("disk_size") {
        req.disk_size = d.get_int("disk_size");
    }
    if d.has_change("taints") {
        req.taints = Some(parse_taints(&d.get_string_map("taints"))?);
    }
    if d.has_change("labels") {
        req.labels = Some(d.get_string_map("labels"));
    }
    if d.has_change("anti_affinity_group_ids") {
        req.anti_affinity_groups = Some(reference_list(d, "anti_affinity_group_ids"));
    }
    if d.has_change("security_group_ids") {
        req.security_groups = Some(reference_list(d, "security_group_ids"));
    }
    if d.has_change("private_network_ids") {
        req.private_networks = Some(reference_list(d, "private_network_ids"));
    }
    if d.has_change("deploy_target_id") {
        req.deploy_target = opt_string(d, "deploy_target_id").map(Reference::new);
    }
    if d.has_change("instance_prefix") {
        req.instance_prefix = opt_string(d, "instance_prefix");
    }
    if d.has_change("kubelet_image_gc") {
        req.kubelet_image_gc = Some(kubelet_image_gc(d).unwrap_or_default());
    }
    if d.has_change("ipv6") {
        req.public_ip_assignment = Some(PublicIpAssignment::from_ipv6(
            d.get_bool("ipv6").unwrap_or(false),
        ));
    }
    Ok(req)
}

/// Full reference list of a set attribute; empty clears the remote side.
fn reference_list(d: &ResourceData, key: &str) -> Vec<Reference> {
    d.get_string_set(key).into_iter().map(Reference::new).collect()
}

#[async_trait]
impl ResourceHandler for SksNodepoolResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let cluster_id = required_string(d, "cluster_id")?;
        let type_name = required_string(d, "instance_type")?;
        let instance_type = resolve_instance_type(ctx, meta, "instance_type", &type_name).await?;
        let taints = d.get_string_map("taints");

        let req = CreateSksNodepoolRequest {
            name: required_string(d, "name")?,
            description: opt_string(d, "description"),
            instance_type: Some(Reference::new(instance_type.id)),
            disk_size: d.get_int("disk_size").unwrap_or(DEFAULT_DISK_SIZE),
            size: required_int(d, "size")?,
            addons: d
                .get_bool("storage_lvm")
                .filter(|lvm| *lvm)
                .map(|_| vec![STORAGE_LVM_ADDON.to_string()]),
            taints: if taints.is_empty() {
                None
            } else {
                Some(parse_taints(&taints)?)
            },
            labels: opt_labels(d, "labels"),
            anti_affinity_groups: references(&d.get_string_set("anti_affinity_group_ids")),
            security_groups: references(&d.get_string_set("security_group_ids")),
            private_networks: references(&d.get_string_set("private_network_ids")),
            deploy_target: opt_string(d, "deploy_target_id").map(Reference::new),
            instance_prefix: opt_string(d, "instance_prefix"),
            kubelet_image_gc: kubelet_image_gc(d),
            public_ip_assignment: d.get_bool("ipv6").map(PublicIpAssignment::from_ipv6),
        };
        tracing::info!("Creating SKS nodepool {} in cluster {}", req.name, cluster_id);

        let op = meta.api.create_sks_nodepool(ctx, &cluster_id, &req).await?;
        let id = wait_created(ctx, meta, op).await?;
        d.set_id(id);

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let cluster_id = required_string(d, "cluster_id")?;
        let Some(np) = found(meta.api.get_sks_nodepool(ctx, &cluster_id, &id).await)? else {
            gone(d, "SKS nodepool");
            return Ok(());
        };

        if let Some(name) = instance_type_name(ctx, meta, &np.instance_type.id).await? {
            d.set("instance_type", name);
        }
        let addons = np.addons.unwrap_or_default();

        d.set("name", np.name);
        d.set("description", np.description);
        d.set("disk_size", np.disk_size);
        d.set("size", np.size);
        d.set("template_id", np.template.map(|r| r.id));
        d.set("version", np.version);
        d.set_optional("instance_prefix", np.instance_prefix);
        d.set(
            "storage_lvm",
            addons.iter().any(|a| a == STORAGE_LVM_ADDON),
        );
        d.set(
            "ipv6",
            np.public_ip_assignment
                .is_some_and(PublicIpAssignment::ipv6_enabled),
        );
        d.set("taints", taints_value(np.taints.as_ref()));
        d.set("labels", labels_value(np.labels.as_ref()));
        d.set(
            "anti_affinity_group_ids",
            string_set_value(reference_ids(&np.anti_affinity_groups)),
        );
        d.set(
            "security_group_ids",
            string_set_value(reference_ids(&np.security_groups)),
        );
        d.set(
            "private_network_ids",
            string_set_value(reference_ids(&np.private_networks)),
        );
        d.set("deploy_target_id", np.deploy_target.map(|r| r.id));
        d.set("kubelet_image_gc", kubelet_image_gc_value(np.kubelet_image_gc));
        d.set("instance_pool_id", np.instance_pool.map(|r| r.id));
        d.set("state", np.state);
        d.set("created_at", np.created_at);
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let cluster_id = required_string(d, "cluster_id")?;

        let req = nodepool_update(ctx, d, meta).await?;
        if !req.is_empty() {
            tracing::info!("Updating SKS nodepool: {}", id);
            let op = meta
                .api
                .update_sks_nodepool(ctx, &cluster_id, &id, &req)
                .await?;
            wait(ctx, meta, op).await?;
        }

        if d.has_change("size") {
            let size = required_int(d, "size")?;
            tracing::info!("Scaling SKS nodepool {} to {}", id, size);
            let op = meta
                .api
                .scale_sks_nodepool(ctx, &cluster_id, &id, size)
                .await?;
            wait(ctx, meta, op).await?;
        }

        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let cluster_id = required_string(d, "cluster_id")?;
        tracing::info!("Deleting SKS nodepool: {}", id);
        delete_and_wait(
            ctx,
            meta,
            meta.api.delete_sks_nodepool(ctx, &cluster_id, &id).await,
        )
        .await
    }

    /// `<cluster-id>/<nodepool-id>@<zone>`
    async fn import(&self, _ctx: &Context, id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        let id = ImportId::parse(id)?;
        let cluster_id = id.require_parent()?.to_string();
        let zone = id.require_zone()?.to_string();
        let mut d = ResourceData::for_import(self.schema(), &id.id);
        d.set("cluster_id", cluster_id);
        d.set("zone", zone);
        Ok(d)
    }
}

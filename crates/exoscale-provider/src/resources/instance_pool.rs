//! `exoscale_instance_pool`
//!
//! Size changes go through the scale call. Everything else mutable is sent
//! in one partial update; an optional field the user removed is reset to its
//! server default instead.

use super::compute_instance::{decode_user_data, encode_user_data};
use super::{
    delete_and_wait, gone, import_regional, instance_type_name, labels_attr, require_id,
    resolve_instance_type, wait, wait_created, zone_attr,
};
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::{
    CreateInstancePoolRequest, PublicIpAssignment, Reference, SshKeyRef,
    UpdateInstancePoolRequest, reference_ids, references,
};
use exoscale_provider_core::codec::{
    labels_value, opt_int, opt_labels, opt_string, required_int, required_string, string_set_value,
};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    ProviderMeta, ResourceData, ResourceHandler, Result, Schema, found, validation,
};
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_instance_pool";

const DEFAULT_PREFIX: &str = "pool";

pub struct InstancePoolResource {
    schema: Arc<Schema>,
}

impl InstancePoolResource {
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
            .attr(
                "template_id",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::uuid),
            )
            .attr(
                "instance_type",
                Attribute::string()
                    .required()
                    .validate_with(validation::instance_type)
                    .normalize_with(super::lowercase),
            )
            .attr(
                "size",
                Attribute::int()
                    .required()
                    .validate_with(validation::int_at_least(0)),
            )
            .attr(
                "disk_size",
                Attribute::int()
                    .optional()
                    .computed()
                    .validate_with(validation::int_at_least(10)),
            )
            .attr("key_pair", Attribute::string().optional())
            .attr("user_data", Attribute::string().optional())
            .attr("labels", labels_attr())
            .attr(
                "instance_prefix",
                Attribute::string().optional().default(DEFAULT_PREFIX),
            )
            .attr("ipv6", Attribute::bool().optional().default(false))
            .attr(
                "deploy_target_id",
                Attribute::string()
                    .optional()
                    .validate_with(validation::uuid),
            )
            .attr(
                "affinity_group_ids",
                Attribute::string_set()
                    .optional()
                    .force_new()
                    .validate_with(validation::uuid),
            )
            .attr(
                "security_group_ids",
                Attribute::string_set()
                    .optional()
                    .validate_with(validation::uuid),
            )
            .attr(
                "elastic_ip_ids",
                Attribute::string_set()
                    .optional()
                    .validate_with(validation::uuid),
            )
            .attr(
                "network_ids",
                Attribute::string_set()
                    .optional()
                    .validate_with(validation::uuid),
            )
            .attr("instances", Attribute::string_set().computed())
            .attr("state", Attribute::string().computed());
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for InstancePoolResource {
    fn default() -> Self {
        Self::new()
    }
}

/// Pool fields the update call leaves alone when absent, keyed by attribute,
/// with the wire name used to reset them.
const RESETTABLE: &[(&str, &str)] = &[
    ("description", "description"),
    ("key_pair", "ssh-key"),
    ("user_data", "user-data"),
    ("labels", "labels"),
    ("deploy_target_id", "deploy-target"),
    ("security_group_ids", "security-groups"),
    ("elastic_ip_ids", "elastic-ips"),
    ("network_ids", "private-networks"),
];

/// Split the changed attributes into a partial update and the fields to reset.
async fn pool_update(
    ctx: &Context,
    d: &ResourceData,
    meta: &ProviderMeta,
) -> Result<(UpdateInstancePoolRequest, Vec<&'static str>)> {
    let mut req = UpdateInstancePoolRequest::default();
    let mut resets = Vec::new();

    for (key, field) in RESETTABLE {
        if d.has_change(key) && !d.has(key) {
            resets.push(*field);
        }
    }

    if d.has_change("name") {
        req.name = Some(required_string(d, "name")?);
    }
    if d.has_change("instance_type") {
        let name = required_string(d, "instance_type")?;
        let instance_type = resolve_instance_type(ctx, meta, "instance_type", &name).await?;
        req.instance_type = Some(Reference::new(instance_type.id));
    }
    if d.has_change("disk_size") {
        req.disk_size = opt_int(d, "disk_size");
    }
    if d.has_change("ipv6") {
        req.public_ip_assignment = d.get_bool("ipv6").map(PublicIpAssignment::from_ipv6);
    }
    if d.has_change("instance_prefix") {
        req.instance_prefix = opt_string(d, "instance_prefix");
    }
    if d.has("description") && d.has_change("description") {
        req.description = opt_string(d, "description");
    }
    if d.has("key_pair") && d.has_change("key_pair") {
        req.ssh_key = opt_string(d, "key_pair").map(|name| SshKeyRef { name });
    }
    if d.has("user_data") && d.has_change("user_data") {
        req.user_data = Some(encode_user_data(d.get_str("user_data").unwrap_or_default())?);
    }
    if d.has("labels") && d.has_change("labels") {
        req.labels = opt_labels(d, "labels");
    }
    if d.has("deploy_target_id") && d.has_change("deploy_target_id") {
        req.deploy_target = opt_string(d, "deploy_target_id").map(Reference::new);
    }
    if d.has("security_group_ids") && d.has_change("security_group_ids") {
        req.security_groups = references(&d.get_string_set("security_group_ids"));
    }
    if d.has("elastic_ip_ids") && d.has_change("elastic_ip_ids") {
        req.elastic_ips = references(&d.get_string_set("elastic_ip_ids"));
    }
    if d.has("network_ids") && d.has_change("network_ids") {
        req.private_networks = references(&d.get_string_set("network_ids"));
    }

    Ok((req, resets))
}

#[async_trait]
impl ResourceHandler for InstancePoolResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let type_name = required_string(d, "instance_type")?;
        let instance_type = resolve_instance_type(ctx, meta, "instance_type", &type_name).await?;
        let user_data = opt_string(d, "user_data")
            .filter(|s| !s.is_empty())
            .map(|s| encode_user_data(&s))
            .transpose()?;

        let req = CreateInstancePoolRequest {
            name: required_string(d, "name")?,
            description: opt_string(d, "description"),
            instance_type: Some(Reference::new(instance_type.id)),
            template: Some(Reference::new(required_string(d, "template_id")?)),
            size: required_int(d, "size")?,
            disk_size: opt_int(d, "disk_size"),
            ssh_key: opt_string(d, "key_pair").map(|name| SshKeyRef { name }),
            user_data,
            labels: opt_labels(d, "labels"),
            anti_affinity_groups: references(&d.get_string_set("affinity_group_ids")),
            security_groups: references(&d.get_string_set("security_group_ids")),
            elastic_ips: references(&d.get_string_set("elastic_ip_ids")),
            private_networks: references(&d.get_string_set("network_ids")),
            public_ip_assignment: d.get_bool("ipv6").map(PublicIpAssignment::from_ipv6),
            instance_prefix: opt_string(d, "instance_prefix"),
            deploy_target: opt_string(d, "deploy_target_id").map(Reference::new),
        };
        tracing::info!("Creating instance pool: {}", req.name);

        let op = meta.api.create_instance_pool(ctx, &req).await?;
        let id = wait_created(ctx, meta, op).await?;
        d.set_id(id);

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let Some(pool) = found(meta.api.get_instance_pool(ctx, &id).await)? else {
            gone(d, "Instance pool");
            return Ok(());
        };

        if let Some(name) = instance_type_name(ctx, meta, &pool.instance_type.id).await? {
            d.set("instance_type", name);
        }
        d.set("name", pool.name);
        d.set("description", pool.description);
        d.set("template_id", pool.template.id);
        d.set("size", pool.size);
        d.set("disk_size", pool.disk_size);
        d.set("key_pair", pool.ssh_key.map(|k| k.name));
        d.set("user_data", pool.user_data.as_deref().map(decode_user_data));
        d.set("labels", labels_value(pool.labels.as_ref()));
        d.set_optional("instance_prefix", pool.instance_prefix);
        d.set(
            "ipv6",
            pool.public_ip_assignment
                .is_some_and(PublicIpAssignment::ipv6_enabled),
        );
        d.set("deploy_target_id", pool.deploy_target.map(|r| r.id));
        d.set(
            "affinity_group_ids",
            string_set_value(reference_ids(&pool.anti_affinity_groups)),
        );
        d.set(
            "security_group_ids",
            string_set_value(reference_ids(&pool.security_groups)),
        );
        d.set(
            "elastic_ip_ids",
            string_set_value(reference_ids(&pool.elastic_ips)),
        );
        d.set(
            "network_ids",
            string_set_value(reference_ids(&pool.private_networks)),
        );
        d.set("instances", string_set_value(reference_ids(&pool.instances)));
        d.set("state", pool.state);
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;

        let (req, resets) = pool_update(ctx, d, meta).await?;
        if !req.is_empty() {
            tracing::info!("Updating instance pool: {}", id);
            let op = meta.api.update_instance_pool(ctx, &id, &req).await?;
            wait(ctx, meta, op).await?;
        }
        for field in resets {
            tracing::debug!("Resetting {} of instance pool {}", field, id);
            let op = meta.api.reset_instance_pool_field(ctx, &id, field).await?;
            wait(ctx, meta, op).await?;
        }

        if d.has_change("size") {
            let size = required_int(d, "size")?;
            tracing::info!("Scaling instance pool {} to {}", id, size);
            let op = meta.api.scale_instance_pool(ctx, &id, size).await?;
            wait(ctx, meta, op).await?;
        }

        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        tracing::info!("Deleting instance pool: {}", id);
        delete_and_wait(ctx, meta, meta.api.delete_instance_pool(ctx, &id).await).await
    }

    async fn import(&self, _ctx: &Context, id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        import_regional(self.schema(), id)
    }
}

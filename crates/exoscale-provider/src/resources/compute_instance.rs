//! `exoscale_compute_instance`
//!
//! Update runs in a fixed order: the plain update call, then the attached
//! sets and reverse DNS, then the stop/resize/scale/start cycle, then Read.
//! Disk resizes and scaling need a stopped instance; the cycle is laid out
//! as a [`PhasePlan`] so the calls always run stop, mutate, start.

use super::{
    delete_and_wait, gone, import_regional, instance_type_name, labels_attr, reconcile_set,
    require_id, resolve_instance_type, wait, wait_created, zone_attr,
};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use exoscale_api::Context;
use exoscale_api::types::{
    CreateInstanceRequest, InstanceState, PublicIpAssignment, Reference, SshKeyRef,
    UpdateInstanceRequest, reference_ids, references,
};
use exoscale_provider_core::codec::{labels_value, opt_labels, opt_string, required_string, string_set_value};
use exoscale_provider_core::diff::{Phase, PhasePlan};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    ProviderError, ProviderMeta, ResourceData, ResourceHandler, Result, Schema, Value, found,
    validation,
};
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_compute_instance";

/// Encoded user data limit
const MAX_USER_DATA: usize = 32 * 1024;

const DEFAULT_DISK_SIZE: i64 = 10;

const STARTED: &str = "started";
const STOPPED: &str = "stopped";

pub struct ComputeInstanceResource {
    schema: Arc<Schema>,
}

fn user_data_size(value: &Value) -> std::result::Result<(), String> {
    match value.as_str() {
        Some(s) if encoded_len(s.len()) > MAX_USER_DATA => Err(format!(
            "user data is {} bytes once encoded, the limit is {}",
            encoded_len(s.len()),
            MAX_USER_DATA
        )),
        _ => Ok(()),
    }
}

fn encoded_len(raw: usize) -> usize {
    raw.div_ceil(3) * 4
}

impl ComputeInstanceResource {
    pub fn new() -> Self {
        let schema = Schema::new()
            .attr("zone", zone_attr())
            .attr(
                "name",
                Attribute::string()
                    .required()
                    .validate_with(validation::non_empty),
            )
            .attr(
                "type",
                Attribute::string()
                    .required()
                    .validate_with(validation::instance_type)
                    .normalize_with(super::lowercase)
                    .describe("Instance type as <family>.<size>"),
            )
            .attr(
                "template_id",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::uuid),
            )
            .attr(
                "disk_size",
                Attribute::int()
                    .optional()
                    .default(DEFAULT_DISK_SIZE)
                    .validate_with(validation::int_at_least(DEFAULT_DISK_SIZE))
                    .describe("Disk size in GiB; can only grow"),
            )
            .attr(
                "ipv6",
                Attribute::bool().optional().default(false).force_new(),
            )
            .attr("ssh_key", Attribute::string().optional().force_new())
            .attr(
                "user_data",
                Attribute::string()
                    .optional()
                    .validate_with(user_data_size)
                    .describe("cloud-init configuration, plain text"),
            )
            .attr("labels", labels_attr())
            .attr(
                "anti_affinity_group_ids",
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
                "private_network_ids",
                Attribute::string_set()
                    .optional()
                    .validate_with(validation::uuid),
            )
            .attr(
                "deploy_target_id",
                Attribute::string()
                    .optional()
                    .force_new()
                    .validate_with(validation::uuid),
            )
            .attr(
                "state",
                Attribute::string()
                    .optional()
                    .computed()
                    .validate_with(validation::one_of(&[STARTED, STOPPED])),
            )
            .attr("reverse_dns", Attribute::string().optional())
            .attr("public_ip_address", Attribute::string().computed())
            .attr("ipv6_address", Attribute::string().computed())
            .attr("created_at", Attribute::string().computed());
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for ComputeInstanceResource {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn encode_user_data(raw: &str) -> Result<String> {
    let encoded = STANDARD.encode(raw.as_bytes());
    if encoded.len() > MAX_USER_DATA {
        return Err(ProviderError::invalid(
            "user_data",
            format!(
                "user data is {} bytes once encoded, the limit is {}",
                encoded.len(),
                MAX_USER_DATA
            ),
        ));
    }
    Ok(encoded)
}

/// Plain text of wire user data. Data that is not base64 text is kept as is.
pub(super) fn decode_user_data(wire: &str) -> String {
    STANDARD
        .decode(wire.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| wire.to_string())
}

fn host_state(state: InstanceState) -> String {
    match state {
        InstanceState::Running => STARTED.to_string(),
        InstanceState::Stopped => STOPPED.to_string(),
        other => other.to_string(),
    }
}

/// One call of the stop/resize/start cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Stop,
    ResizeDisk(i64),
    Scale(String),
    Start,
}

/// Lay out the lifecycle calls for an instance currently `running` (or not).
fn lifecycle_steps(
    running: bool,
    desired: Option<&str>,
    disk_size: Option<i64>,
    instance_type_id: Option<String>,
) -> PhasePlan<Step> {
    let resizing = disk_size.is_some() || instance_type_id.is_some();
    let stop = running && (resizing || desired == Some(STOPPED));
    let start = match desired {
        Some(STOPPED) => false,
        Some(STARTED) => stop || !running,
        // Unmanaged state: bring it back up only if we stopped it.
        _ => stop,
    };

    let mut plan = PhasePlan::new();
    if start {
        plan.push(Phase::Start, Step::Start);
    }
    if let Some(size) = disk_size {
        plan.push(Phase::Mutate, Step::ResizeDisk(size));
    }
    if let Some(type_id) = instance_type_id {
        plan.push(Phase::Mutate, Step::Scale(type_id));
    }
    if stop {
        plan.push(Phase::Stop, Step::Stop);
    }
    plan
}

async fn sync_attachments(
    ctx: &Context,
    d: &ResourceData,
    meta: &ProviderMeta,
    id: &str,
    key: &str,
) -> Result<()> {
    let (removed, added) = d.set_difference(key);
    if removed.is_empty() && added.is_empty() {
        return Ok(());
    }
    tracing::info!("Updating {} of instance: {}", key, id);

    reconcile_set(
        removed,
        added,
        |res| async move {
            let op = match key {
                "security_group_ids" => {
                    meta.api
                        .detach_instance_from_security_group(ctx, &res, id)
                        .await?
                }
                "elastic_ip_ids" => {
                    meta.api
                        .detach_instance_from_elastic_ip(ctx, &res, id)
                        .await?
                }
                _ => {
                    meta.api
                        .detach_instance_from_private_network(ctx, &res, id)
                        .await?
                }
            };
            wait(ctx, meta, op).await.map(|_| ())
        },
        |res| async move {
            let op = match key {
                "security_group_ids" => {
                    meta.api
                        .attach_instance_to_security_group(ctx, &res, id)
                        .await?
                }
                "elastic_ip_ids" => meta.api.attach_instance_to_elastic_ip(ctx, &res, id).await?,
                _ => {
                    meta.api
                        .attach_instance_to_private_network(ctx, &res, id)
                        .await?
                }
            };
            wait(ctx, meta, op).await.map(|_| ())
        },
    )
    .await
}

async fn apply_reverse_dns(
    ctx: &Context,
    meta: &ProviderMeta,
    id: &str,
    domain: Option<&str>,
) -> Result<()> {
    match domain.filter(|s| !s.is_empty()) {
        Some(domain) => {
            tracing::debug!("Setting reverse DNS of instance {} to {}", id, domain);
            let op = meta.api.update_reverse_dns_instance(ctx, id, domain).await?;
            wait(ctx, meta, op).await?;
        }
        None => {
            tracing::debug!("Clearing reverse DNS of instance {}", id);
            delete_and_wait(ctx, meta, meta.api.delete_reverse_dns_instance(ctx, id).await)
                .await?;
        }
    }
    Ok(())
}

#[async_trait]
impl ResourceHandler for ComputeInstanceResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let instance_type = resolve_instance_type(ctx, meta, "type", &required_string(d, "type")?).await?;
        let user_data = opt_string(d, "user_data")
            .filter(|s| !s.is_empty())
            .map(|s| encode_user_data(&s))
            .transpose()?;

        let req = CreateInstanceRequest {
            name: required_string(d, "name")?,
            instance_type: Some(Reference::new(instance_type.id)),
            template: Some(Reference::new(required_string(d, "template_id")?)),
            disk_size: d.get_int("disk_size").unwrap_or(DEFAULT_DISK_SIZE),
            public_ip_assignment: d
                .get_bool("ipv6")
                .map(PublicIpAssignment::from_ipv6),
            ssh_key: opt_string(d, "ssh_key").map(|name| SshKeyRef { name }),
            user_data,
            labels: opt_labels(d, "labels"),
            anti_affinity_groups: references(&d.get_string_set("anti_affinity_group_ids")),
            security_groups: references(&d.get_string_set("security_group_ids")),
            deploy_target: opt_string(d, "deploy_target_id").map(Reference::new),
        };
        tracing::info!("Creating compute instance: {}", req.name);

        let op = meta.api.create_instance(ctx, &req).await?;
        let id = wait_created(ctx, meta, op).await?;
        d.set_id(id.clone());

        // Security groups go in the create payload; the other sets are attached.
        sync_attachments(ctx, d, meta, &id, "elastic_ip_ids").await?;
        sync_attachments(ctx, d, meta, &id, "private_network_ids").await?;

        if let Some(domain) = opt_string(d, "reverse_dns").filter(|s| !s.is_empty()) {
            apply_reverse_dns(ctx, meta, &id, Some(&domain)).await?;
        }

        if d.get_str("state") == Some(STOPPED) {
            tracing::info!("Stopping compute instance: {}", id);
            let op = meta.api.stop_instance(ctx, &id).await?;
            wait(ctx, meta, op).await?;
        }

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let Some(instance) = found(meta.api.get_instance(ctx, &id).await)? else {
            gone(d, "Compute instance");
            return Ok(());
        };

        if let Some(name) = instance_type_name(ctx, meta, &instance.instance_type.id).await? {
            d.set("type", name);
        }
        let reverse_dns = found(meta.api.get_reverse_dns_instance(ctx, &id).await)?
            .and_then(|r| r.domain_name);

        d.set("name", instance.name);
        d.set("template_id", instance.template.id);
        d.set("disk_size", instance.disk_size);
        d.set(
            "ipv6",
            instance
                .public_ip_assignment
                .is_some_and(PublicIpAssignment::ipv6_enabled),
        );
        d.set("ssh_key", instance.ssh_key.map(|k| k.name));
        d.set(
            "user_data",
            instance.user_data.as_deref().map(decode_user_data),
        );
        d.set("labels", labels_value(instance.labels.as_ref()));
        d.set(
            "anti_affinity_group_ids",
            string_set_value(reference_ids(&instance.anti_affinity_groups)),
        );
        d.set(
            "security_group_ids",
            string_set_value(reference_ids(&instance.security_groups)),
        );
        d.set(
            "elastic_ip_ids",
            string_set_value(reference_ids(&instance.elastic_ips)),
        );
        d.set(
            "private_network_ids",
            string_set_value(reference_ids(&instance.private_networks)),
        );
        d.set("deploy_target_id", instance.deploy_target.map(|r| r.id));
        d.set("state", host_state(instance.state));
        d.set("reverse_dns", reverse_dns);
        d.set("public_ip_address", instance.public_ip);
        d.set("ipv6_address", instance.ipv6_address);
        d.set("created_at", instance.created_at);
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;

        let mut req = UpdateInstanceRequest::default();
        if d.has_change("name") {
            req.name = Some(required_string(d, "name")?);
        }
        if d.has_change("labels") {
            req.labels = Some(d.get_string_map("labels"));
        }
        if d.has_change("user_data") {
            req.user_data = Some(match opt_string(d, "user_data") {
                Some(raw) if !raw.is_empty() => encode_user_data(&raw)?,
                _ => String::new(),
            });
        }
        if !req.is_empty() {
            tracing::info!("Updating compute instance: {}", id);
            let op = meta.api.update_instance(ctx, &id, &req).await?;
            wait(ctx, meta, op).await?;
        }

        for key in ["security_group_ids", "elastic_ip_ids", "private_network_ids"] {
            if d.has_change(key) {
                sync_attachments(ctx, d, meta, &id, key).await?;
            }
        }
        if d.has_change("reverse_dns") {
            apply_reverse_dns(ctx, meta, &id, d.get_str("reverse_dns")).await?;
        }

        if d.has_changes(&["state", "disk_size", "type"]) {
            let disk_size = if d.has_change("disk_size") {
                let old = d.get_prior("disk_size").and_then(Value::as_int).unwrap_or(0);
                let new = d.get_int("disk_size").unwrap_or(DEFAULT_DISK_SIZE);
                if new < old {
                    return Err(ProviderError::invalid(
                        "disk_size",
                        format!("cannot shrink the disk from {} to {} GiB", old, new),
                    ));
                }
                Some(new)
            } else {
                None
            };
            let instance_type_id = if d.has_change("type") {
                let name = required_string(d, "type")?;
                Some(resolve_instance_type(ctx, meta, "type", &name).await?.id)
            } else {
                None
            };

            let instance = meta.api.get_instance(ctx, &id).await?;
            let running = instance.state == InstanceState::Running;
            let steps = lifecycle_steps(running, d.get_str("state"), disk_size, instance_type_id);

            for (_, step) in steps.into_ordered() {
                let op = match step {
                    Step::Stop => {
                        tracing::info!("Stopping compute instance: {}", id);
                        meta.api.stop_instance(ctx, &id).await?
                    }
                    Step::ResizeDisk(size) => {
                        tracing::info!("Resizing disk of compute instance {} to {} GiB", id, size);
                        meta.api.resize_instance_disk(ctx, &id, size).await?
                    }
                    Step::Scale(type_id) => {
                        tracing::info!("Scaling compute instance: {}", id);
                        meta.api.scale_instance(ctx, &id, &type_id).await?
                    }
                    Step::Start => {
                        tracing::info!("Starting compute instance: {}", id);
                        meta.api.start_instance(ctx, &id).await?
                    }
                };
                wait(ctx, meta, op).await?;
            }
        }

        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        tracing::info!("Deleting compute instance: {}", id);
        delete_and_wait(ctx, meta, meta.api.delete_instance(ctx, &id).await).await
    }

    async fn import(&self, _ctx: &Context, id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        import_regional(self.schema(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordered(plan: PhasePlan<Step>) -> Vec<Step> {
        plan.into_ordered().into_iter().map(|(_, s)| s).collect()
    }

    #[test]
    fn test_scale_running_instance() {
        let steps = lifecycle_steps(true, Some(STARTED), None, Some("type-2".to_string()));
        assert_eq!(
            ordered(steps),
            vec![Step::Stop, Step::Scale("type-2".to_string()), Step::Start]
        );
    }

    #[test]
    fn test_resize_and_scale_to_stopped() {
        let steps = lifecycle_steps(true, Some(STOPPED), Some(20), Some("type-2".to_string()));
        assert_eq!(
            ordered(steps),
            vec![
                Step::Stop,
                Step::ResizeDisk(20),
                Step::Scale("type-2".to_string())
            ]
        );
    }

    #[test]
    fn test_start_stopped_instance() {
        assert_eq!(ordered(lifecycle_steps(false, Some(STARTED), None, None)), vec![Step::Start]);
        assert!(lifecycle_steps(false, Some(STOPPED), None, None).is_empty());
        assert!(lifecycle_steps(true, Some(STARTED), None, None).is_empty());
    }

    #[test]
    fn test_unmanaged_state_is_restored() {
        let steps = lifecycle_steps(true, None, Some(50), None);
        assert_eq!(
            ordered(steps),
            vec![Step::Stop, Step::ResizeDisk(50), Step::Start]
        );
    }

    #[test]
    fn test_user_data_round_trip() {
        let encoded = encode_user_data("#cloud-config\npackages: [nginx]\n").unwrap();
        assert_eq!(decode_user_data(&encoded), "#cloud-config\npackages: [nginx]\n");
        assert_eq!(decode_user_data("not base64!"), "not base64!");
    }

    #[test]
    fn test_user_data_limit() {
        let big = "x".repeat(MAX_USER_DATA);
        let err = encode_user_data(&big).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput { ref path, .. } if path == "user_data"));
        assert!(user_data_size(&Value::from(big.as_str())).is_err());
        assert!(user_data_size(&Value::from("#cloud-config")).is_ok());
    }
}

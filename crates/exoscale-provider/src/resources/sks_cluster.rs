//! `exoscale_sks_cluster`
//!
//! Version changes are upgrades and go through their own call; the other
//! mutable attributes share one update. An unset version resolves to the
//! newest one the zone offers.

use super::{
    delete_and_wait, gone, import_regional, labels_attr, require_id, wait, wait_created,
    zone_attr,
};
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::{CreateSksClusterRequest, UpdateSksClusterRequest};
use exoscale_provider_core::codec::{
    labels_value, opt_bool, opt_labels, opt_string, opt_string_set, required_string,
    string_set_value,
};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    ProviderError, ProviderMeta, ResourceData, ResourceHandler, Result, Schema, found, validation,
};
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_sks_cluster";

const DEFAULT_CNI: &str = "calico";
const DEFAULT_LEVEL: &str = "pro";

pub struct SksClusterResource {
    schema: Arc<Schema>,
}

impl SksClusterResource {
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
                "version",
                Attribute::string()
                    .optional()
                    .computed()
                    .describe("Kubernetes version; the newest available when unset"),
            )
            .attr(
                "cni",
                Attribute::string()
                    .optional()
                    .default(DEFAULT_CNI)
                    .force_new()
                    .describe("CNI plugin, empty for none"),
            )
            .attr(
                "service_level",
                Attribute::string()
                    .optional()
                    .default(DEFAULT_LEVEL)
                    .force_new()
                    .validate_with(validation::one_of(&["starter", "pro"])),
            )
            .attr(
                "addons",
                Attribute::string_set().optional().computed().force_new(),
            )
            .attr("auto_upgrade", Attribute::bool().optional().default(false))
            .attr("labels", labels_attr())
            .attr("endpoint", Attribute::string().computed())
            .attr("state", Attribute::string().computed())
            .attr("nodepools", Attribute::string_set().computed())
            .attr("created_at", Attribute::string().computed());
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for SksClusterResource {
    fn default() -> Self {
        Self::new()
    }
}

fn version_key(version: &str) -> Vec<u64> {
    version
        .split(['.', '-'])
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}

/// The highest of `versions` by numeric component.
fn newest_version(versions: &[String]) -> Option<&String> {
    versions.iter().max_by_key(|v| version_key(v))
}

#[async_trait]
impl ResourceHandler for SksClusterResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let version = match opt_string(d, "version").filter(|v| !v.is_empty()) {
            Some(v) => v,
            None => {
                let versions = meta.api.list_sks_cluster_versions(ctx).await?;
                newest_version(&versions).cloned().ok_or_else(|| {
                    ProviderError::Internal("no SKS version available".to_string())
                })?
            }
        };

        let req = CreateSksClusterRequest {
            name: required_string(d, "name")?,
            description: opt_string(d, "description"),
            version,
            cni: opt_string(d, "cni").filter(|s| !s.is_empty()),
            level: opt_string(d, "service_level").unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
            addons: opt_string_set(d, "addons"),
            labels: opt_labels(d, "labels"),
            auto_upgrade: opt_bool(d, "auto_upgrade"),
        };
        tracing::info!("Creating SKS cluster {} ({})", req.name, req.version);

        let op = meta.api.create_sks_cluster(ctx, &req).await?;
        let id = wait_created(ctx, meta, op).await?;
        d.set_id(id);

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let Some(cluster) = found(meta.api.get_sks_cluster(ctx, &id).await)? else {
            gone(d, "SKS cluster");
            return Ok(());
        };

        d.set("name", cluster.name);
        d.set("description", cluster.description);
        d.set("version", cluster.version);
        d.set("cni", cluster.cni.unwrap_or_default());
        d.set("service_level", cluster.level);
        d.set("addons", string_set_value(cluster.addons.unwrap_or_default()));
        d.set("auto_upgrade", cluster.auto_upgrade.unwrap_or(false));
        d.set("labels", labels_value(cluster.labels.as_ref()));
        d.set("endpoint", cluster.endpoint);
        d.set("state", cluster.state);
        d.set(
            "nodepools",
            string_set_value(cluster.nodepools.unwrap_or_default().into_iter().map(|np| np.id)),
        );
        d.set("created_at", cluster.created_at);
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;

        let mut req = UpdateSksClusterRequest::default();
        if d.has_change("name") {
            req.name = Some(required_string(d, "name")?);
        }
        if d.has_change("description") {
            req.description = Some(opt_string(d, "description").unwrap_or_default());
        }
        if d.has_change("labels") {
            req.labels = Some(d.get_string_map("labels"));
        }
        if d.has_change("auto_upgrade") {
            req.auto_upgrade = Some(opt_bool(d, "auto_upgrade").unwrap_or(false));
        }
        if !req.is_empty() {
            tracing::info!("Updating SKS cluster: {}", id);
            let op = meta.api.update_sks_cluster(ctx, &id, &req).await?;
            wait(ctx, meta, op).await?;
        }

        if d.has_change("version") {
            if let Some(version) = opt_string(d, "version").filter(|v| !v.is_empty()) {
                tracing::info!("Upgrading SKS cluster {} to {}", id, version);
                let op = meta.api.upgrade_sks_cluster(ctx, &id, &version).await?;
                wait(ctx, meta, op).await?;
            }
        }

        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        tracing::info!("Deleting SKS cluster: {}", id);
        delete_and_wait(ctx, meta, meta.api.delete_sks_cluster(ctx, &id).await).await
    }

    async fn import(&self, _ctx: &Context, id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        import_regional(self.schema(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_version() {
        let versions = vec![
            "1.29.9".to_string(),
            "1.31.1".to_string(),
            "1.30.12".to_string(),
        ];
        assert_eq!(newest_version(&versions).map(String::as_str), Some("1.31.1"));
        assert_eq!(newest_version(&[]), None);
    }

    #[test]
    fn test_defaults() {
        let handler = SksClusterResource::new();
        let d = ResourceData::from_config(handler.schema(), Default::default());
        assert_eq!(d.get_str("cni"), Some(DEFAULT_CNI));
        assert_eq!(d.get_str("service_level"), Some(DEFAULT_LEVEL));
        assert_eq!(d.get_bool("auto_upgrade"), Some(false));
        assert_eq!(d.get_str("version"), None);
    }
}

//! `exoscale_private_network`

use super::{
    delete_and_wait, gone, import_regional, labels_attr, require_id, wait, wait_created,
    zone_attr,
};
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::PrivateNetworkRequest;
use exoscale_provider_core::codec::{labels_value, opt_labels, opt_string, required_string};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    Diagnostic, ProviderError, ProviderMeta, ResourceData, ResourceHandler, Result, Schema,
    Value, found, validation,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_private_network";

/// Managed addressing needs all three of these or none.
const MANAGED: [&str; 3] = ["start_ip", "end_ip", "netmask"];

pub struct PrivateNetworkResource {
    schema: Arc<Schema>,
}

impl PrivateNetworkResource {
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
                "start_ip",
                Attribute::string()
                    .optional()
                    .validate_with(validation::ipv4_address),
            )
            .attr(
                "end_ip",
                Attribute::string()
                    .optional()
                    .validate_with(validation::ipv4_address),
            )
            .attr(
                "netmask",
                Attribute::string()
                    .optional()
                    .validate_with(validation::ipv4_address),
            )
            .attr("labels", labels_attr());
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for PrivateNetworkResource {
    fn default() -> Self {
        Self::new()
    }
}

fn check_managed(configured: impl Fn(&str) -> bool) -> Option<ProviderError> {
    let set = MANAGED.iter().filter(|k| configured(k)).count();
    if set != 0 && set != MANAGED.len() {
        Some(ProviderError::invalid(
            "start_ip",
            "start_ip, end_ip and netmask must be set together",
        ))
    } else {
        None
    }
}

/// Text sent to clear an optional field; absent means untouched.
fn changed_string(d: &ResourceData, key: &str) -> Option<String> {
    d.has_change(key)
        .then(|| opt_string(d, key).unwrap_or_default())
}

#[async_trait]
impl ResourceHandler for PrivateNetworkResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn validate(&self, config: &BTreeMap<String, Value>) -> Vec<Diagnostic> {
        let mut diags = self.schema.validate(config);
        let configured = |k: &str| config.get(k).is_some_and(|v| !v.is_null());
        if let Some(err) = check_managed(configured) {
            diags.push(err.to_diagnostic());
        }
        diags
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        if let Some(err) = check_managed(|k| d.has(k)) {
            return Err(err);
        }

        let req = PrivateNetworkRequest {
            name: Some(required_string(d, "name")?),
            description: opt_string(d, "description"),
            start_ip: opt_string(d, "start_ip"),
            end_ip: opt_string(d, "end_ip"),
            netmask: opt_string(d, "netmask"),
            labels: opt_labels(d, "labels"),
        };
        tracing::info!(
            "Creating private network: {}",
            req.name.as_deref().unwrap_or_default()
        );

        let op = meta.api.create_private_network(ctx, &req).await?;
        let id = wait_created(ctx, meta, op).await?;
        d.set_id(id);

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let Some(network) = found(meta.api.get_private_network(ctx, &id).await)? else {
            gone(d, "Private network");
            return Ok(());
        };

        d.set("name", network.name);
        d.set("description", network.description);
        d.set("start_ip", network.start_ip);
        d.set("end_ip", network.end_ip);
        d.set("netmask", network.netmask);
        d.set("labels", labels_value(network.labels.as_ref()));
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        if let Some(err) = check_managed(|k| d.has(k)) {
            return Err(err);
        }

        let mut req = PrivateNetworkRequest::default();
        if d.has_change("name") {
            req.name = Some(required_string(d, "name")?);
        }
        req.description = changed_string(d, "description");
        if d.has_changes(&MANAGED) {
            req.start_ip = opt_string(d, "start_ip");
            req.end_ip = opt_string(d, "end_ip");
            req.netmask = opt_string(d, "netmask");
        }
        if d.has_change("labels") {
            req.labels = Some(d.get_string_map("labels"));
        }

        if !req.is_empty() {
            tracing::info!("Updating private network: {}", id);
            let op = meta.api.update_private_network(ctx, &id, &req).await?;
            wait(ctx, meta, op).await?;
        }

        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        tracing::info!("Deleting private network: {}", id);
        delete_and_wait(ctx, meta, meta.api.delete_private_network(ctx, &id).await).await
    }

    async fn import(&self, _ctx: &Context, id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        import_regional(self.schema(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_addressing_is_all_or_nothing() {
        let handler = PrivateNetworkResource::new();
        let mut config = BTreeMap::new();
        config.insert("zone".to_string(), Value::from("ch-gva-2"));
        config.insert("name".to_string(), Value::from("net"));
        assert!(handler.validate(&config).is_empty());

        config.insert("start_ip".to_string(), Value::from("10.0.0.10"));
        let diags = handler.validate(&config);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].attribute.as_deref(), Some("start_ip"));

        config.insert("end_ip".to_string(), Value::from("10.0.0.50"));
        config.insert("netmask".to_string(), Value::from("255.255.255.0"));
        assert!(handler.validate(&config).is_empty());
    }
}

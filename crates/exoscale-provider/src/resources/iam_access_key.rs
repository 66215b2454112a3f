//! `exoscale_iam_access_key`
//!
//! The secret is only returned at creation and stored sensitive; Read never
//! overwrites it. Every configurable attribute forces a new key.

use super::{delete_and_wait, gone, require_id};
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::{AccessKeyResource, CreateIamAccessKeyRequest, IamAccessKey};
use exoscale_provider_core::codec::{opt_string_set, required_string, string_set_value};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    ImportId, ProviderError, ProviderMeta, ResourceData, ResourceHandler, Result, Schema, Value,
    found, validation,
};
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_iam_access_key";

pub struct IamAccessKeyResource {
    schema: Arc<Schema>,
}

fn resource_notation(value: &Value) -> std::result::Result<(), String> {
    match value.as_str() {
        None => Ok(()),
        Some(s) if AccessKeyResource::parse(s).is_some() => Ok(()),
        Some(s) => Err(format!("{:?} is not of the form <domain>/<type>:<name>", s)),
    }
}

impl IamAccessKeyResource {
    pub fn new() -> Self {
        let schema = Schema::new()
            .attr(
                "name",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::non_empty),
            )
            .attr("operations", Attribute::string_set().optional().force_new())
            .attr("tags", Attribute::string_set().optional().force_new())
            .attr(
                "resources",
                Attribute::string_set()
                    .optional()
                    .force_new()
                    .validate_with(resource_notation)
                    .describe("Restrictions in <domain>/<type>:<name> notation"),
            )
            .attr("key", Attribute::string().computed())
            .attr("secret", Attribute::string().computed().sensitive())
            .attr("type", Attribute::string().computed());
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for IamAccessKeyResource {
    fn default() -> Self {
        Self::new()
    }
}

fn project(d: &mut ResourceData, key: IamAccessKey) {
    d.set("key", key.key);
    d.set("name", key.name);
    d.set("type", key.key_type);
    d.set("operations", string_set_value(key.operations.unwrap_or_default()));
    d.set("tags", string_set_value(key.tags.unwrap_or_default()));
    d.set(
        "resources",
        string_set_value(
            key.resources
                .unwrap_or_default()
                .iter()
                .map(ToString::to_string),
        ),
    );
}

#[async_trait]
impl ResourceHandler for IamAccessKeyResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let resources = match opt_string_set(d, "resources") {
            Some(items) => Some(
                items
                    .iter()
                    .map(|s| {
                        AccessKeyResource::parse(s).ok_or_else(|| {
                            ProviderError::invalid("resources", format!("malformed resource {:?}", s))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };
        let req = CreateIamAccessKeyRequest {
            name: required_string(d, "name")?,
            operations: opt_string_set(d, "operations"),
            tags: opt_string_set(d, "tags"),
            resources,
        };
        tracing::info!("Creating IAM access key: {}", req.name);

        let mut key = meta.api.create_iam_access_key(ctx, &req).await?;
        let secret = key.secret.take().ok_or_else(|| {
            ProviderError::Internal("access key created without a secret".to_string())
        })?;
        d.set_id(key.key.clone());
        d.set("secret", secret);
        project(d, key);

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let Some(key) = found(meta.api.get_iam_access_key(ctx, &id).await)? else {
            gone(d, "IAM access key");
            return Ok(());
        };
        project(d, key);
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        tracing::info!("Revoking IAM access key: {}", id);
        delete_and_wait(ctx, meta, meta.api.revoke_iam_access_key(ctx, &id).await).await
    }

    async fn import(&self, _ctx: &Context, id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        let id = ImportId::parse(id)?;
        Ok(ResourceData::for_import(self.schema(), id.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_resource_notation_is_validated() {
        let handler = IamAccessKeyResource::new();
        let mut config = BTreeMap::new();
        config.insert("name".to_string(), Value::from("ci"));
        config.insert(
            "resources".to_string(),
            Value::string_set(["sos/bucket:artifacts", "bucket-without-domain"]),
        );
        let diags = handler.validate(&config);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].detail.contains("bucket-without-domain"));
    }
}

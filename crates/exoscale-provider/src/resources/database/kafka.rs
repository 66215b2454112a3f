use super::{
    BlockChange, DatabaseKind, Remote, changed_settings, settings_attr, settings_json,
    version_attr,
};
use async_trait::async_trait;
use exoscale_api::types::{
    DbaasKafkaRequest, DbaasRequestCommon, DbaasServiceType, KafkaAuthenticationMethods,
    Operation,
};
use exoscale_api::{ApiError, Context};
use exoscale_provider_core::codec::{Block, json_value};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{ProviderMeta, Result, Schema};

const BLOCK: &str = "kafka";

const SETTINGS: &[(&str, &str)] = &[
    ("kafka_settings", "kafka"),
    ("kafka_connect_settings", "kafka-connect"),
    ("kafka_rest_settings", "kafka-rest"),
    ("schema_registry_settings", "schema-registry"),
];

pub(super) struct Kafka;

fn authentication_methods(block: &Block) -> KafkaAuthenticationMethods {
    KafkaAuthenticationMethods {
        certificate: block.bool("enable_cert_auth"),
        sasl: block.bool("enable_sasl_auth"),
    }
}

#[async_trait]
impl DatabaseKind for Kafka {
    fn service_type(&self) -> DbaasServiceType {
        DbaasServiceType::Kafka
    }

    fn block(&self) -> Schema {
        Schema::new()
            .attr("version", version_attr())
            .attr("enable_cert_auth", Attribute::bool().optional().default(true))
            .attr("enable_sasl_auth", Attribute::bool().optional().default(false))
            .attr("enable_kafka_connect", Attribute::bool().optional().default(false))
            .attr("enable_kafka_rest", Attribute::bool().optional().default(false))
            .attr("enable_schema_registry", Attribute::bool().optional().default(false))
            .attr("kafka_settings", settings_attr())
            .attr("kafka_connect_settings", settings_attr())
            .attr("kafka_rest_settings", settings_attr())
            .attr("schema_registry_settings", settings_attr())
    }

    fn settings(&self) -> &'static [(&'static str, &'static str)] {
        SETTINGS
    }

    fn server_filled(&self) -> &'static [&'static str] {
        &["version"]
    }

    async fn create(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
        common: DbaasRequestCommon,
        block: &Block,
    ) -> Result<Operation> {
        let req = DbaasKafkaRequest {
            common,
            version: block.non_empty_str("version"),
            authentication_methods: Some(authentication_methods(block)),
            kafka_connect_enabled: block.bool("enable_kafka_connect"),
            kafka_rest_enabled: block.bool("enable_kafka_rest"),
            schema_registry_enabled: block.bool("enable_schema_registry"),
            kafka_settings: settings_json(block, BLOCK, "kafka_settings")?,
            kafka_connect_settings: settings_json(block, BLOCK, "kafka_connect_settings")?,
            kafka_rest_settings: settings_json(block, BLOCK, "kafka_rest_settings")?,
            schema_registry_settings: settings_json(block, BLOCK, "schema_registry_settings")?,
        };
        Ok(meta.api.create_dbaas_service_kafka(ctx, name, &req).await?)
    }

    async fn update(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
        common: DbaasRequestCommon,
        change: &BlockChange,
    ) -> Result<Option<Operation>> {
        let flag = |key: &str| change.changed(key).then(|| change.new.bool(key)).flatten();
        let mut req = DbaasKafkaRequest {
            common,
            kafka_connect_enabled: flag("enable_kafka_connect"),
            kafka_rest_enabled: flag("enable_kafka_rest"),
            schema_registry_enabled: flag("enable_schema_registry"),
            kafka_settings: changed_settings(change, BLOCK, "kafka_settings")?,
            kafka_connect_settings: changed_settings(change, BLOCK, "kafka_connect_settings")?,
            kafka_rest_settings: changed_settings(change, BLOCK, "kafka_rest_settings")?,
            schema_registry_settings: changed_settings(change, BLOCK, "schema_registry_settings")?,
            ..Default::default()
        };
        if change.changed("version") {
            req.version = change.new.non_empty_str("version");
        }
        if change.changed("enable_cert_auth") || change.changed("enable_sasl_auth") {
            req.authentication_methods = Some(authentication_methods(&change.new));
        }

        if req == DbaasKafkaRequest::default() {
            return Ok(None);
        }
        Ok(Some(meta.api.update_dbaas_service_kafka(ctx, name, &req).await?))
    }

    async fn read(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
    ) -> std::result::Result<Remote, ApiError> {
        let svc = meta.api.get_dbaas_service_kafka(ctx, name).await?;
        let auth = svc.authentication_methods.unwrap_or_default();
        let block = Block::new()
            .with("version", svc.common.version.clone())
            .with("enable_cert_auth", auth.certificate)
            .with("enable_sasl_auth", auth.sasl)
            .with("enable_kafka_connect", svc.kafka_connect_enabled)
            .with("enable_kafka_rest", svc.kafka_rest_enabled)
            .with("enable_schema_registry", svc.schema_registry_enabled)
            .with("kafka_settings", json_value(svc.kafka_settings.as_ref()))
            .with("kafka_connect_settings", json_value(svc.kafka_connect_settings.as_ref()))
            .with("kafka_rest_settings", json_value(svc.kafka_rest_settings.as_ref()))
            .with(
                "schema_registry_settings",
                json_value(svc.schema_registry_settings.as_ref()),
            );
        Ok(Remote {
            common: svc.common,
            block,
        })
    }
}

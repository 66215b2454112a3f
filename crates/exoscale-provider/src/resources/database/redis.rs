use super::{BlockChange, DatabaseKind, Remote, changed_settings, settings_attr, settings_json};
use async_trait::async_trait;
use exoscale_api::types::{DbaasRedisRequest, DbaasRequestCommon, DbaasServiceType, Operation};
use exoscale_api::{ApiError, Context};
use exoscale_provider_core::codec::{Block, json_value};
use exoscale_provider_core::{ProviderMeta, Result, Schema};

const BLOCK: &str = "redis";

pub(super) struct Redis;

#[async_trait]
impl DatabaseKind for Redis {
    fn service_type(&self) -> DbaasServiceType {
        DbaasServiceType::Redis
    }

    fn block(&self) -> Schema {
        Schema::new().attr("redis_settings", settings_attr())
    }

    fn settings(&self) -> &'static [(&'static str, &'static str)] {
        &[("redis_settings", "redis")]
    }

    async fn create(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
        common: DbaasRequestCommon,
        block: &Block,
    ) -> Result<Operation> {
        let req = DbaasRedisRequest {
            common,
            redis_settings: settings_json(block, BLOCK, "redis_settings")?,
        };
        Ok(meta.api.create_dbaas_service_redis(ctx, name, &req).await?)
    }

    async fn update(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
        common: DbaasRequestCommon,
        change: &BlockChange,
    ) -> Result<Option<Operation>> {
        let req = DbaasRedisRequest {
            common,
            redis_settings: changed_settings(change, BLOCK, "redis_settings")?,
        };
        if req == DbaasRedisRequest::default() {
            return Ok(None);
        }
        Ok(Some(meta.api.update_dbaas_service_redis(ctx, name, &req).await?))
    }

    async fn read(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
    ) -> std::result::Result<Remote, ApiError> {
        let svc = meta.api.get_dbaas_service_redis(ctx, name).await?;
        let block = Block::new().with("redis_settings", json_value(svc.redis_settings.as_ref()));
        Ok(Remote {
            common: svc.common,
            block,
        })
    }
}

use super::{
    BlockChange, DatabaseKind, Remote, backup_schedule, backup_schedule_attr,
    backup_schedule_value, changed_settings, settings_attr, settings_json, version_attr,
};
use async_trait::async_trait;
use exoscale_api::types::{DbaasMysqlRequest, DbaasRequestCommon, DbaasServiceType, Operation};
use exoscale_api::{ApiError, Context};
use exoscale_provider_core::codec::{Block, json_value};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{ProviderMeta, Result, Schema, validation};

const BLOCK: &str = "mysql";

pub(super) struct Mysql;

#[async_trait]
impl DatabaseKind for Mysql {
    fn service_type(&self) -> DbaasServiceType {
        DbaasServiceType::Mysql
    }

    fn block(&self) -> Schema {
        Schema::new()
            .attr("version", version_attr())
            .attr("backup_schedule", backup_schedule_attr())
            .attr(
                "admin_username",
                Attribute::string()
                    .optional()
                    .validate_with(validation::non_empty),
            )
            .attr("admin_password", Attribute::string().optional().sensitive())
            .attr("mysql_settings", settings_attr())
    }

    fn settings(&self) -> &'static [(&'static str, &'static str)] {
        &[("mysql_settings", "mysql")]
    }

    fn server_filled(&self) -> &'static [&'static str] {
        &["version", "backup_schedule"]
    }

    fn write_only(&self) -> &'static [&'static str] {
        &["admin_username", "admin_password"]
    }

    async fn create(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
        common: DbaasRequestCommon,
        block: &Block,
    ) -> Result<Operation> {
        let req = DbaasMysqlRequest {
            common,
            version: block.non_empty_str("version"),
            backup_schedule: backup_schedule(block, BLOCK)?,
            admin_username: block.non_empty_str("admin_username"),
            admin_password: block.non_empty_str("admin_password"),
            mysql_settings: settings_json(block, BLOCK, "mysql_settings")?,
        };
        Ok(meta.api.create_dbaas_service_mysql(ctx, name, &req).await?)
    }

    /// The service drops its backup schedule on any update that omits it,
    /// so the current one is always sent along.
    async fn update(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
        common: DbaasRequestCommon,
        change: &BlockChange,
    ) -> Result<Option<Operation>> {
        let mut req = DbaasMysqlRequest {
            common,
            mysql_settings: changed_settings(change, BLOCK, "mysql_settings")?,
            ..Default::default()
        };
        if change.changed("version") {
            req.version = change.new.non_empty_str("version");
        }

        if req == DbaasMysqlRequest::default() && !change.changed("backup_schedule") {
            return Ok(None);
        }
        req.backup_schedule = backup_schedule(&change.new, BLOCK)?;
        Ok(Some(meta.api.update_dbaas_service_mysql(ctx, name, &req).await?))
    }

    async fn read(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
    ) -> std::result::Result<Remote, ApiError> {
        let svc = meta.api.get_dbaas_service_mysql(ctx, name).await?;
        let block = Block::new()
            .with("version", svc.common.version.clone())
            .with("backup_schedule", backup_schedule_value(svc.common.backup_schedule))
            .with("mysql_settings", json_value(svc.mysql_settings.as_ref()));
        Ok(Remote {
            common: svc.common,
            block,
        })
    }
}

use super::{
    BlockChange, DatabaseKind, Remote, backup_schedule, backup_schedule_attr,
    backup_schedule_value, changed_settings, settings_attr, settings_json, version_attr,
};
use async_trait::async_trait;
use exoscale_api::types::{DbaasPgRequest, DbaasRequestCommon, DbaasServiceType, Operation};
use exoscale_api::{ApiError, Context};
use exoscale_provider_core::codec::{Block, json_value};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{ProviderMeta, Result, Schema, validation};

const BLOCK: &str = "pg";

pub(super) struct Pg;

#[async_trait]
impl DatabaseKind for Pg {
    fn service_type(&self) -> DbaasServiceType {
        DbaasServiceType::Pg
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
            .attr("pg_settings", settings_attr())
            .attr("pgbouncer_settings", settings_attr())
            .attr("pglookout_settings", settings_attr())
            .attr("timescaledb_settings", settings_attr())
    }

    fn settings(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("pg_settings", "pg"),
            ("pgbouncer_settings", "pgbouncer"),
            ("pglookout_settings", "pglookout"),
            ("timescaledb_settings", "timescaledb"),
        ]
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
        let req = DbaasPgRequest {
            common,
            version: block.non_empty_str("version"),
            backup_schedule: backup_schedule(block, BLOCK)?,
            admin_username: block.non_empty_str("admin_username"),
            admin_password: block.non_empty_str("admin_password"),
            pg_settings: settings_json(block, BLOCK, "pg_settings")?,
            pgbouncer_settings: settings_json(block, BLOCK, "pgbouncer_settings")?,
            pglookout_settings: settings_json(block, BLOCK, "pglookout_settings")?,
            timescaledb_settings: settings_json(block, BLOCK, "timescaledb_settings")?,
        };
        Ok(meta.api.create_dbaas_service_pg(ctx, name, &req).await?)
    }

    async fn update(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
        common: DbaasRequestCommon,
        change: &BlockChange,
    ) -> Result<Option<Operation>> {
        let mut req = DbaasPgRequest {
            common,
            pg_settings: changed_settings(change, BLOCK, "pg_settings")?,
            pgbouncer_settings: changed_settings(change, BLOCK, "pgbouncer_settings")?,
            pglookout_settings: changed_settings(change, BLOCK, "pglookout_settings")?,
            timescaledb_settings: changed_settings(change, BLOCK, "timescaledb_settings")?,
            ..Default::default()
        };
        if change.changed("version") {
            req.version = change.new.non_empty_str("version");
        }
        if change.changed("backup_schedule") {
            req.backup_schedule = backup_schedule(&change.new, BLOCK)?;
        }

        if req == DbaasPgRequest::default() {
            return Ok(None);
        }
        Ok(Some(meta.api.update_dbaas_service_pg(ctx, name, &req).await?))
    }

    async fn read(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
    ) -> std::result::Result<Remote, ApiError> {
        let svc = meta.api.get_dbaas_service_pg(ctx, name).await?;
        let block = Block::new()
            .with("version", svc.common.version.clone())
            .with("backup_schedule", backup_schedule_value(svc.common.backup_schedule))
            .with("pg_settings", json_value(svc.pg_settings.as_ref()))
            .with("pgbouncer_settings", json_value(svc.pgbouncer_settings.as_ref()))
            .with("pglookout_settings", json_value(svc.pglookout_settings.as_ref()))
            .with("timescaledb_settings", json_value(svc.timescaledb_settings.as_ref()));
        Ok(Remote {
            common: svc.common,
            block,
        })
    }
}

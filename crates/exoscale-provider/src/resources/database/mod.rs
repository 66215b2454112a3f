//! `exoscale_database`
//!
//! One resource covers every managed database engine. The shell owns the
//! fields all engines share and the service lifecycle; each engine's
//! [`DatabaseKind`] owns its block and the API calls that carry it. Only the
//! block named after the service type may be configured.

mod kafka;
mod mysql;
mod opensearch;
mod pg;
mod redis;
pub(crate) mod settings;

use super::{delete_and_wait, gone, require_id, wait, zone_attr};
use async_trait::async_trait;
use exoscale_api::types::{
    DbaasBackupSchedule, DbaasMaintenance, DbaasRequestCommon, DbaasServiceCommon,
    DbaasServiceType, Operation,
};
use exoscale_api::{ApiError, Context};
use exoscale_provider_core::codec::{
    Block, block_of, format_hh_mm, normalize_json, opt_bool, opt_string, parse_hh_mm,
    required_string, single_block,
};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    Diagnostic, ImportId, ProviderError, ProviderMeta, ResourceData, ResourceDiff,
    ResourceHandler, Result, Schema, Value, found, validation, wait_until,
};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_database";

const RUNNING: &str = "running";

const MAINTENANCE_DAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
    "never",
];

const SERVICE_TYPES: &[&str] = &["pg", "mysql", "redis", "kafka", "opensearch"];

/// A service as one engine reports it.
pub(crate) struct Remote {
    pub common: DbaasServiceCommon,
    /// Engine block, without `ip_filter` or write-only attributes.
    pub block: Block,
}

/// Block contents before and after an update.
#[derive(Debug, Default)]
pub(crate) struct BlockChange {
    pub old: Block,
    pub new: Block,
}

impl BlockChange {
    pub(crate) fn changed(&self, key: &str) -> bool {
        let value = |b: &Block| match b.get(key) {
            Some(v) if is_settings_key(key) => normalize_json(v),
            Some(v) => v.clone(),
            None => Value::Null,
        };
        value(&self.old) != value(&self.new)
    }
}

/// Engine-specific half of `exoscale_database`.
#[async_trait]
pub(crate) trait DatabaseKind: Send + Sync {
    fn service_type(&self) -> DbaasServiceType;

    /// Attributes of the engine block, `ip_filter` excluded.
    fn block(&self) -> Schema;

    /// JSON settings attributes of the block, each paired with the server
    /// schema that checks it.
    fn settings(&self) -> &'static [(&'static str, &'static str)];

    /// Block attributes the server fills in when they are left unset.
    fn server_filled(&self) -> &'static [&'static str] {
        &[]
    }

    /// Block attributes the API never returns.
    fn write_only(&self) -> &'static [&'static str] {
        &[]
    }

    async fn create(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
        common: DbaasRequestCommon,
        block: &Block,
    ) -> Result<Operation>;

    /// Send whatever changed. `None` when there was nothing to send.
    async fn update(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
        common: DbaasRequestCommon,
        change: &BlockChange,
    ) -> Result<Option<Operation>>;

    async fn read(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
    ) -> std::result::Result<Remote, ApiError>;
}

fn is_settings_key(key: &str) -> bool {
    key.ends_with("settings")
}

/// Canonical JSON for every settings attribute of a block.
fn normalize_block(value: &Value) -> Value {
    match value {
        Value::List(items) => Value::List(
            items
                .iter()
                .map(|item| match item {
                    Value::Map(m) => Value::Map(
                        m.iter()
                            .map(|(k, v)| {
                                let v = if is_settings_key(k) { normalize_json(v) } else { v.clone() };
                                (k.clone(), v)
                            })
                            .collect(),
                    ),
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

pub(crate) fn settings_attr() -> Attribute {
    Attribute::string().optional().normalize_with(normalize_json)
}

pub(crate) fn version_attr() -> Attribute {
    Attribute::string().optional().validate_with(validation::non_empty)
}

pub(crate) fn backup_schedule_attr() -> Attribute {
    Attribute::string()
        .optional()
        .validate_with(validation::hh_mm)
        .describe("Daily backup time, HH:MM")
}

/// Parse the JSON object held by `key` of an engine block.
pub(crate) fn settings_json(block: &Block, block_name: &str, key: &str) -> Result<Option<JsonValue>> {
    let Some(text) = block.str(key).filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    let path = format!("{}.0.{}", block_name, key);
    let json: JsonValue = serde_json::from_str(&text)
        .map_err(|e| ProviderError::invalid(&path, format!("invalid JSON: {}", e)))?;
    if !json.is_object() {
        return Err(ProviderError::invalid(path, "expected a JSON object"));
    }
    Ok(Some(json))
}

/// Settings to send for a changed attribute; an emptied one clears them.
pub(crate) fn changed_settings(change: &BlockChange, block_name: &str, key: &str) -> Result<Option<JsonValue>> {
    if !change.changed(key) {
        return Ok(None);
    }
    Ok(Some(
        settings_json(&change.new, block_name, key)?
            .unwrap_or_else(|| JsonValue::Object(Default::default())),
    ))
}

pub(crate) fn backup_schedule(block: &Block, block_name: &str) -> Result<Option<DbaasBackupSchedule>> {
    let Some(raw) = block.non_empty_str("backup_schedule") else {
        return Ok(None);
    };
    let (hour, minute) = parse_hh_mm(&raw).ok_or_else(|| {
        ProviderError::invalid(
            format!("{}.0.backup_schedule", block_name),
            format!("{:?} is not a valid HH:MM time", raw),
        )
    })?;
    Ok(Some(DbaasBackupSchedule {
        backup_hour: Some(hour),
        backup_minute: Some(minute),
    }))
}

pub(crate) fn backup_schedule_value(schedule: Option<DbaasBackupSchedule>) -> Value {
    match schedule {
        Some(DbaasBackupSchedule {
            backup_hour: Some(hour),
            backup_minute: Some(minute),
        }) => format_hh_mm(hour, minute).into(),
        _ => Value::Null,
    }
}

fn maintenance_time(value: &Value) -> std::result::Result<(), String> {
    let Some(s) = value.as_str() else {
        return Ok(());
    };
    chrono::NaiveTime::parse_from_str(s, "%H:%M:%S")
        .map(|_| ())
        .map_err(|_| format!("{:?} is not a valid HH:MM:SS time", s))
}

fn maintenance(d: &ResourceData) -> Result<Option<DbaasMaintenance>> {
    match (opt_string(d, "maintenance_dow"), opt_string(d, "maintenance_time")) {
        (Some(dow), Some(time)) => Ok(Some(DbaasMaintenance { dow, time })),
        (None, None) => Ok(None),
        _ => Err(ProviderError::invalid(
            "maintenance_time",
            "maintenance_dow and maintenance_time must be set together",
        )),
    }
}

fn ip_filter(block: &Block) -> Option<Vec<String>> {
    let filter = block.string_set("ip_filter");
    (!filter.is_empty()).then_some(filter)
}

fn kinds() -> Vec<Box<dyn DatabaseKind>> {
    vec![
        Box::new(pg::Pg),
        Box::new(mysql::Mysql),
        Box::new(redis::Redis),
        Box::new(kafka::Kafka),
        Box::new(opensearch::Opensearch),
    ]
}

pub struct DatabaseResource {
    schema: Arc<Schema>,
    kinds: Vec<Box<dyn DatabaseKind>>,
}

impl DatabaseResource {
    pub fn new() -> Self {
        let kinds = kinds();
        let mut schema = Schema::new()
            .attr("zone", zone_attr())
            .attr(
                "name",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::non_empty),
            )
            .attr(
                "type",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::one_of(SERVICE_TYPES)),
            )
            .attr(
                "plan",
                Attribute::string()
                    .required()
                    .validate_with(validation::non_empty),
            )
            .attr(
                "maintenance_dow",
                Attribute::string()
                    .optional()
                    .validate_with(validation::one_of(MAINTENANCE_DAYS)),
            )
            .attr(
                "maintenance_time",
                Attribute::string()
                    .optional()
                    .validate_with(maintenance_time),
            )
            .attr(
                "termination_protection",
                Attribute::bool().optional().computed(),
            )
            .attr("created_at", Attribute::string().computed())
            .attr("updated_at", Attribute::string().computed())
            .attr("disk_size", Attribute::int().computed())
            .attr("node_count", Attribute::int().computed())
            .attr("node_cpus", Attribute::int().computed())
            .attr("node_memory", Attribute::int().computed())
            .attr("state", Attribute::string().computed())
            .attr("ca_certificate", Attribute::string().computed());

        for kind in &kinds {
            let block = kind.block().attr(
                "ip_filter",
                Attribute::string_set()
                    .optional()
                    .validate_with(validation::cidr),
            );
            schema = schema.attr(
                kind.service_type().as_str(),
                Attribute::block(block)
                    .optional()
                    .computed()
                    .normalize_with(normalize_block),
            );
        }

        Self {
            schema: Arc::new(schema),
            kinds,
        }
    }

    fn kind(&self, service_type: &str) -> Result<&dyn DatabaseKind> {
        self.kinds
            .iter()
            .find(|k| k.service_type().as_str() == service_type)
            .map(Box::as_ref)
            .ok_or_else(|| {
                ProviderError::invalid("type", format!("unsupported database type {:?}", service_type))
            })
    }

    fn kind_of(&self, d: &ResourceData) -> Result<&dyn DatabaseKind> {
        self.kind(&required_string(d, "type")?)
    }

    /// Check configured settings against the server schemas. With a change,
    /// only the settings that changed are checked.
    async fn check_settings(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        kind: &dyn DatabaseKind,
        block: &Block,
        change: Option<&BlockChange>,
    ) -> Result<()> {
        let wanted: Vec<(&str, &str)> = kind
            .settings()
            .iter()
            .filter(|(key, _)| block.get(key).is_some() && change.is_none_or(|c| c.changed(key)))
            .copied()
            .collect();
        if wanted.is_empty() {
            return Ok(());
        }

        let block_name = kind.service_type().as_str();
        let schemas = meta.api.get_dbaas_settings(ctx, kind.service_type()).await?;
        for (key, schema_name) in wanted {
            let Some(json) = settings_json(block, block_name, key)? else {
                continue;
            };
            let path = format!("{}.0.{}", block_name, key);
            let schema = schemas.schema(schema_name).ok_or_else(|| {
                ProviderError::invalid(&path, format!("no {} settings are published", schema_name))
            })?;
            settings::check(&path, &json, schema)?;
        }
        Ok(())
    }

    async fn wait_running(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        kind: &dyn DatabaseKind,
        name: &str,
    ) -> Result<()> {
        let description = format!("database service {} to run", name);
        wait_until(ctx, &meta.wait, &description, || async move {
            let remote = kind.read(ctx, meta, name).await?;
            Ok((remote.common.state.as_deref() == Some(RUNNING)).then_some(()))
        })
        .await
    }
}

impl Default for DatabaseResource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceHandler for DatabaseResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn validate(&self, config: &BTreeMap<String, Value>) -> Vec<Diagnostic> {
        let mut diags = self.schema.validate(config);

        let is_set = |key: &str| config.get(key).is_some_and(|v| !v.is_null());
        if is_set("maintenance_dow") != is_set("maintenance_time") {
            diags.push(Diagnostic::error(
                "maintenance_time",
                "maintenance_dow and maintenance_time must be set together",
            ));
        }

        if let Some(service_type) = config.get("type").and_then(Value::as_str) {
            for other in SERVICE_TYPES.iter().filter(|t| **t != service_type) {
                if is_set(other) {
                    diags.push(Diagnostic::error(
                        *other,
                        format!("not allowed for a {} service", service_type),
                    ));
                }
            }
            if let Ok(kind) = self.kind(service_type) {
                if let Some(block) = config.get(service_type).and_then(block_of) {
                    for (key, _) in kind.settings() {
                        if let Err(e) = settings_json(&block, service_type, key) {
                            diags.push(e.to_diagnostic());
                        }
                    }
                }
            }
        }
        diags
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let kind = self.kind_of(d)?;
        let name = required_string(d, "name")?;
        let block = single_block(d, kind.service_type().as_str()).unwrap_or_default();
        self.check_settings(ctx, meta, kind, &block, None).await?;

        let common = DbaasRequestCommon {
            plan: Some(required_string(d, "plan")?),
            maintenance: maintenance(d)?,
            termination_protection: opt_bool(d, "termination_protection"),
            ip_filter: ip_filter(&block),
        };
        tracing::info!("Creating {} database service: {}", kind.service_type(), name);

        let op = kind.create(ctx, meta, &name, common, &block).await?;
        wait(ctx, meta, op).await?;
        d.set_id(&name);
        self.wait_running(ctx, meta, kind, &name).await?;

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let name = require_id(d)?;
        let kind = self.kind_of(d)?;
        let block_name = kind.service_type().as_str();
        let Some(Remote { common, mut block }) = found(kind.read(ctx, meta, &name).await)? else {
            gone(d, "Database service");
            return Ok(());
        };

        if let Some(filter) = common.ip_filter.filter(|f| !f.is_empty()) {
            block.0.insert("ip_filter".to_string(), Value::string_set(filter));
        }
        if let Some(current) = single_block(d, block_name) {
            for key in kind.write_only() {
                if let Some(v) = current.get(key) {
                    block.0.insert(key.to_string(), v.clone());
                }
            }
        }

        d.set("name", common.name);
        d.set("plan", common.plan);
        let (dow, time) = common
            .maintenance
            .map(|m| (Some(m.dow), Some(m.time)))
            .unwrap_or_default();
        d.set("maintenance_dow", dow);
        d.set("maintenance_time", time);
        d.set("termination_protection", common.termination_protection);
        d.set("created_at", common.created_at);
        d.set("updated_at", common.updated_at);
        d.set("disk_size", common.disk_size);
        d.set("node_count", common.node_count);
        d.set("node_cpus", common.node_cpu_count);
        d.set("node_memory", common.node_memory);
        d.set("state", common.state);
        d.set(block_name, block.into_value());

        let ca = meta.api.get_dbaas_ca_certificate(ctx).await?;
        d.set("ca_certificate", ca);
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let name = require_id(d)?;
        let kind = self.kind_of(d)?;
        let block_name = kind.service_type().as_str();
        let change = BlockChange {
            old: d.get_prior(block_name).and_then(block_of).unwrap_or_default(),
            new: single_block(d, block_name).unwrap_or_default(),
        };
        self.check_settings(ctx, meta, kind, &change.new, Some(&change))
            .await?;

        let mut common = DbaasRequestCommon::default();
        if d.has_change("plan") {
            common.plan = Some(required_string(d, "plan")?);
        }
        if d.has_changes(&["maintenance_dow", "maintenance_time"]) {
            common.maintenance = maintenance(d)?;
        }
        if d.has_change("termination_protection") {
            common.termination_protection = opt_bool(d, "termination_protection");
        }
        if change.changed("ip_filter") {
            common.ip_filter = Some(change.new.string_set("ip_filter"));
        }

        if let Some(op) = kind.update(ctx, meta, &name, common, &change).await? {
            tracing::info!("Updated {} database service: {}", kind.service_type(), name);
            wait(ctx, meta, op).await?;
            self.wait_running(ctx, meta, kind, &name).await?;
        }

        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let name = require_id(d)?;
        if d.get_bool("termination_protection") == Some(true) {
            return Err(ProviderError::invalid(
                "termination_protection",
                format!("database service {} is protected against termination", name),
            ));
        }
        tracing::info!("Deleting database service: {}", name);
        delete_and_wait(ctx, meta, meta.api.delete_dbaas_service(ctx, &name).await).await
    }

    /// `<name>@<zone>`; the service type is found by probing each engine.
    async fn import(&self, ctx: &Context, id: &str, meta: &ProviderMeta) -> Result<ResourceData> {
        let id = ImportId::parse(id)?;
        let zone = id.require_zone()?.to_string();
        let ctx = ctx.with_zone(zone.clone());

        for kind in &self.kinds {
            if found(kind.read(&ctx, meta, &id.id).await)?.is_some() {
                let mut d = ResourceData::for_import(self.schema(), &id.id);
                d.set("zone", zone);
                d.set("name", id.id.as_str());
                d.set("type", kind.service_type().as_str());
                return Ok(d);
            }
        }
        Err(ProviderError::NotFound(format!("database service {}", id.id)))
    }

    /// Block attributes the server fills in are carried over from state when
    /// the configuration leaves them out.
    async fn customize_diff(
        &self,
        _ctx: &Context,
        diff: &mut ResourceDiff,
        _meta: &ProviderMeta,
    ) -> Result<()> {
        if diff.is_create() {
            return Ok(());
        }
        let Some(service_type) = diff.new_value("type").and_then(Value::as_str).map(str::to_string)
        else {
            return Ok(());
        };
        let Ok(kind) = self.kind(&service_type) else {
            return Ok(());
        };
        let (Some(old), Some(new)) = (
            diff.old(&service_type).and_then(block_of),
            diff.new_value(&service_type).and_then(block_of),
        ) else {
            return Ok(());
        };

        let mut merged = new;
        for key in kind.server_filled() {
            if merged.get(key).is_none() {
                if let Some(v) = old.get(key) {
                    merged.0.insert(key.to_string(), v.clone());
                }
            }
        }
        let old_value = old.into_value();
        let merged = merged.into_value();
        if normalize_block(&old_value) == normalize_block(&merged) {
            diff.set_new(&service_type, old_value);
        } else {
            diff.set_new(&service_type, merged);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exoscale_provider_core::compute_diff;

    fn config(pairs: Vec<(&str, Value)>) -> BTreeMap<String, Value> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn pg_block(pairs: Vec<(&str, Value)>) -> Value {
        Value::List(vec![Value::Map(config(pairs))])
    }

    fn base(extra: Vec<(&str, Value)>) -> BTreeMap<String, Value> {
        let mut c = config(vec![
            ("zone", "ch-gva-2".into()),
            ("name", "orders".into()),
            ("type", "pg".into()),
            ("plan", "startup-4".into()),
        ]);
        c.extend(config(extra));
        c
    }

    #[test]
    fn test_only_the_type_block_is_allowed() {
        let handler = DatabaseResource::new();
        let diags = handler.validate(&base(vec![(
            "mysql",
            pg_block(vec![("mysql_settings", "{}".into())]),
        )]));
        assert!(diags.iter().any(|d| d.attribute.as_deref() == Some("mysql")));
    }

    #[test]
    fn test_maintenance_fields_go_together() {
        let handler = DatabaseResource::new();
        let diags = handler.validate(&base(vec![("maintenance_dow", "monday".into())]));
        assert!(diags
            .iter()
            .any(|d| d.attribute.as_deref() == Some("maintenance_time")));

        let diags = handler.validate(&base(vec![
            ("maintenance_dow", "monday".into()),
            ("maintenance_time", "01:30:00".into()),
        ]));
        assert!(diags.is_empty(), "{:?}", diags);
    }

    #[test]
    fn test_settings_must_be_a_json_object() {
        let handler = DatabaseResource::new();
        let diags = handler.validate(&base(vec![(
            "pg",
            pg_block(vec![("pg_settings", "[1, 2]".into())]),
        )]));
        assert!(diags
            .iter()
            .any(|d| d.attribute.as_deref() == Some("pg.0.pg_settings")));
    }

    #[test]
    fn test_block_change_ignores_json_formatting() {
        let change = BlockChange {
            old: Block::new().with("pg_settings", r#"{"a":1,"b":{"c":2}}"#),
            new: Block::new().with("pg_settings", "{ \"b\": {\"c\": 2}, \"a\": 1 }"),
        };
        assert!(!change.changed("pg_settings"));
        assert!(!change.changed("version"));

        let change = BlockChange {
            old: Block::new().with("version", "15"),
            new: Block::new().with("version", "16"),
        };
        assert!(change.changed("version"));
    }

    #[test]
    fn test_backup_schedule_round_trip() {
        let block = Block::new().with("backup_schedule", "04:05");
        let schedule = backup_schedule(&block, "pg").unwrap();
        assert_eq!(
            schedule,
            Some(DbaasBackupSchedule {
                backup_hour: Some(4),
                backup_minute: Some(5)
            })
        );
        assert_eq!(backup_schedule_value(schedule), Value::from("04:05"));

        let err = backup_schedule(&Block::new().with("backup_schedule", "4h"), "mysql").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput { ref path, .. } if path == "mysql.0.backup_schedule"));
    }

    #[test]
    fn test_cleared_settings_are_sent_empty() {
        let change = BlockChange {
            old: Block::new().with("redis_settings", r#"{"maxmemory_policy":"allkeys-lru"}"#),
            new: Block::new(),
        };
        let sent = changed_settings(&change, "redis", "redis_settings").unwrap();
        assert_eq!(sent, Some(serde_json::json!({})));
        assert_eq!(changed_settings(&change, "redis", "other_settings").unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_filled_attributes_do_not_drift() {
        let handler = DatabaseResource::new();
        let prior = base(vec![(
            "pg",
            pg_block(vec![
                ("version", "15".into()),
                ("backup_schedule", "01:23".into()),
                ("pg_settings", r#"{"max_connections":200}"#.into()),
            ]),
        )]);
        let planned = base(vec![(
            "pg",
            pg_block(vec![("pg_settings", r#"{ "max_connections": 200 }"#.into())]),
        )]);

        let mut diff = compute_diff(&handler.schema(), Some(&prior), &planned);
        assert!(diff.has_changes());
        handler
            .customize_diff(
                &Context::background(),
                &mut diff,
                &crate::resources::resource_tests::meta(),
            )
            .await
            .unwrap();
        assert!(!diff.has_changes());
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Managed database service types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbaasServiceType {
    Pg,
    Mysql,
    Redis,
    Kafka,
    Opensearch,
}

impl DbaasServiceType {
    pub const ALL: [DbaasServiceType; 5] = [
        DbaasServiceType::Pg,
        DbaasServiceType::Mysql,
        DbaasServiceType::Redis,
        DbaasServiceType::Kafka,
        DbaasServiceType::Opensearch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DbaasServiceType::Pg => "pg",
            DbaasServiceType::Mysql => "mysql",
            DbaasServiceType::Redis => "redis",
            DbaasServiceType::Kafka => "kafka",
            DbaasServiceType::Opensearch => "opensearch",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl std::fmt::Display for DbaasServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbaasMaintenance {
    pub dow: String,
    pub time: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbaasBackupSchedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_hour: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_minute: Option<i64>,
}

/// Fields every database service reports, whatever its type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbaasServiceCommon {
    pub name: String,
    pub plan: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub termination_protection: Option<bool>,
    #[serde(default)]
    pub maintenance: Option<DbaasMaintenance>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub disk_size: Option<i64>,
    #[serde(default)]
    pub node_count: Option<i64>,
    #[serde(default)]
    pub node_cpu_count: Option<i64>,
    #[serde(default)]
    pub node_memory: Option<i64>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub ip_filter: Option<Vec<String>>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub backup_schedule: Option<DbaasBackupSchedule>,
}

/// Request fields shared by every create/update payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbaasRequestCommon {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<DbaasMaintenance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_protection: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_filter: Option<Vec<String>>,
}

impl DbaasRequestCommon {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbaasServicePg {
    #[serde(flatten)]
    pub common: DbaasServiceCommon,
    #[serde(default)]
    pub pg_settings: Option<JsonValue>,
    #[serde(default)]
    pub pgbouncer_settings: Option<JsonValue>,
    #[serde(default)]
    pub pglookout_settings: Option<JsonValue>,
    #[serde(default)]
    pub timescaledb_settings: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbaasPgRequest {
    #[serde(flatten)]
    pub common: DbaasRequestCommon,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_schedule: Option<DbaasBackupSchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pg_settings: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pgbouncer_settings: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pglookout_settings: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timescaledb_settings: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbaasServiceMysql {
    #[serde(flatten)]
    pub common: DbaasServiceCommon,
    #[serde(default)]
    pub mysql_settings: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbaasMysqlRequest {
    #[serde(flatten)]
    pub common: DbaasRequestCommon,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_schedule: Option<DbaasBackupSchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mysql_settings: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbaasServiceRedis {
    #[serde(flatten)]
    pub common: DbaasServiceCommon,
    #[serde(default)]
    pub redis_settings: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbaasRedisRequest {
    #[serde(flatten)]
    pub common: DbaasRequestCommon,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis_settings: Option<JsonValue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaAuthenticationMethods {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sasl: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbaasServiceKafka {
    #[serde(flatten)]
    pub common: DbaasServiceCommon,
    #[serde(default)]
    pub authentication_methods: Option<KafkaAuthenticationMethods>,
    #[serde(default)]
    pub kafka_connect_enabled: Option<bool>,
    #[serde(default)]
    pub kafka_rest_enabled: Option<bool>,
    #[serde(default)]
    pub schema_registry_enabled: Option<bool>,
    #[serde(default)]
    pub kafka_settings: Option<JsonValue>,
    #[serde(default)]
    pub kafka_connect_settings: Option<JsonValue>,
    #[serde(default)]
    pub kafka_rest_settings: Option<JsonValue>,
    #[serde(default)]
    pub schema_registry_settings: Option<JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbaasKafkaRequest {
    #[serde(flatten)]
    pub common: DbaasRequestCommon,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_methods: Option<KafkaAuthenticationMethods>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka_connect_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka_rest_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_registry_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka_settings: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka_connect_settings: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka_rest_settings: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_registry_settings: Option<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OpensearchIndexPattern {
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_index_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting_algorithm: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OpensearchIndexTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping_nested_objects_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_replicas: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_shards: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OpensearchDashboards {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_old_space_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbaasServiceOpensearch {
    #[serde(flatten)]
    pub common: DbaasServiceCommon,
    #[serde(default)]
    pub opensearch_settings: Option<JsonValue>,
    #[serde(default)]
    pub index_patterns: Option<Vec<OpensearchIndexPattern>>,
    #[serde(default)]
    pub index_template: Option<OpensearchIndexTemplate>,
    #[serde(default)]
    pub keep_index_refresh_interval: Option<bool>,
    #[serde(default)]
    pub max_index_count: Option<i64>,
    #[serde(default)]
    pub opensearch_dashboards: Option<OpensearchDashboards>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DbaasOpensearchRequest {
    #[serde(flatten)]
    pub common: DbaasRequestCommon,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opensearch_settings: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_patterns: Option<Vec<OpensearchIndexPattern>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_template: Option<OpensearchIndexTemplate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_index_refresh_interval: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_index_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opensearch_dashboards: Option<OpensearchDashboards>,
}

/// JSON schemas describing the accepted settings for one service type,
/// keyed by settings block (`pg`, `pgbouncer`, `mysql`, `kafka-rest`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbaasSettingsSchemas {
    #[serde(default)]
    pub settings: BTreeMap<String, JsonValue>,
}

impl DbaasSettingsSchemas {
    pub fn schema(&self, block: &str) -> Option<&JsonValue> {
        self.settings.get(block)
    }
}

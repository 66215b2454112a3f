use super::{Labels, PublicIpAssignment, Reference};
use serde::{Deserialize, Serialize};

/// Catalog entry for an instance type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InstanceType {
    pub id: String,
    pub family: String,
    pub size: String,
    #[serde(default)]
    pub authorized: Option<bool>,
    #[serde(default)]
    pub cpus: Option<i64>,
    #[serde(default)]
    pub memory: Option<i64>,
}

impl InstanceType {
    /// Host-side `<family>.<size>` name, lowercased.
    pub fn name(&self) -> String {
        format!("{}.{}", self.family, self.size).to_lowercase()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Template {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub default_user: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SshKeyRef {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstanceState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Migrating,
    Destroying,
    Destroyed,
    Error,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InstanceState::Starting => "starting",
            InstanceState::Running => "running",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::Migrating => "migrating",
            InstanceState::Destroying => "destroying",
            InstanceState::Destroyed => "destroyed",
            InstanceState::Error => "error",
            InstanceState::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Manager {
    pub id: String,
    #[serde(rename = "type")]
    pub manager_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub instance_type: Reference,
    pub template: Reference,
    pub disk_size: i64,
    pub state: InstanceState,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub public_ip_assignment: Option<PublicIpAssignment>,
    #[serde(default)]
    pub ipv6_address: Option<String>,
    #[serde(default)]
    pub ssh_key: Option<SshKeyRef>,
    #[serde(default)]
    pub user_data: Option<String>,
    #[serde(default)]
    pub labels: Option<Labels>,
    #[serde(default)]
    pub anti_affinity_groups: Option<Vec<Reference>>,
    #[serde(default)]
    pub security_groups: Option<Vec<Reference>>,
    #[serde(default)]
    pub elastic_ips: Option<Vec<Reference>>,
    #[serde(default)]
    pub private_networks: Option<Vec<Reference>>,
    #[serde(default)]
    pub deploy_target: Option<Reference>,
    #[serde(default)]
    pub manager: Option<Manager>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateInstanceRequest {
    pub name: String,
    pub instance_type: Option<Reference>,
    pub template: Option<Reference>,
    pub disk_size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip_assignment: Option<PublicIpAssignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<SshKeyRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anti_affinity_groups: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_target: Option<Reference>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateInstanceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
}

impl UpdateInstanceRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.labels.is_none() && self.user_data.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InstancePool {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub instance_type: Reference,
    pub template: Reference,
    pub size: i64,
    #[serde(default)]
    pub disk_size: Option<i64>,
    #[serde(default)]
    pub ssh_key: Option<SshKeyRef>,
    #[serde(default)]
    pub user_data: Option<String>,
    #[serde(default)]
    pub labels: Option<Labels>,
    #[serde(default)]
    pub anti_affinity_groups: Option<Vec<Reference>>,
    #[serde(default)]
    pub security_groups: Option<Vec<Reference>>,
    #[serde(default)]
    pub elastic_ips: Option<Vec<Reference>>,
    #[serde(default)]
    pub private_networks: Option<Vec<Reference>>,
    #[serde(default)]
    pub public_ip_assignment: Option<PublicIpAssignment>,
    #[serde(default)]
    pub instance_prefix: Option<String>,
    #[serde(default)]
    pub deploy_target: Option<Reference>,
    #[serde(default)]
    pub instances: Option<Vec<Reference>>,
    #[serde(default)]
    pub manager: Option<Manager>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateInstancePoolRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub instance_type: Option<Reference>,
    pub template: Option<Reference>,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<SshKeyRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anti_affinity_groups: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elastic_ips: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_networks: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip_assignment: Option<PublicIpAssignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_target: Option<Reference>,
}

/// Partial update of an instance pool. `None` fields are left untouched;
/// `Some(vec![])` clears an attached set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateInstancePoolRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<SshKeyRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elastic_ips: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_networks: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip_assignment: Option<PublicIpAssignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_target: Option<Reference>,
}

impl UpdateInstancePoolRequest {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

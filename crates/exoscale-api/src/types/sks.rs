use super::{Labels, PublicIpAssignment, Reference};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SksCluster {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    #[serde(default)]
    pub cni: Option<String>,
    pub level: String,
    #[serde(default)]
    pub addons: Option<Vec<String>>,
    #[serde(default)]
    pub labels: Option<Labels>,
    #[serde(default)]
    pub auto_upgrade: Option<bool>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub nodepools: Option<Vec<SksNodepool>>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateSksClusterRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cni: Option<String>,
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addons: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_upgrade: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateSksClusterRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_upgrade: Option<bool>,
}

impl UpdateSksClusterRequest {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SksNodepoolTaint {
    pub value: String,
    pub effect: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KubeletImageGc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_age: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SksNodepool {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub instance_type: Reference,
    #[serde(default)]
    pub template: Option<Reference>,
    pub disk_size: i64,
    pub size: i64,
    #[serde(default)]
    pub addons: Option<Vec<String>>,
    #[serde(default)]
    pub taints: Option<BTreeMap<String, SksNodepoolTaint>>,
    #[serde(default)]
    pub labels: Option<Labels>,
    #[serde(default)]
    pub anti_affinity_groups: Option<Vec<Reference>>,
    #[serde(default)]
    pub security_groups: Option<Vec<Reference>>,
    #[serde(default)]
    pub private_networks: Option<Vec<Reference>>,
    #[serde(default)]
    pub deploy_target: Option<Reference>,
    #[serde(default)]
    pub instance_pool: Option<Reference>,
    #[serde(default)]
    pub instance_prefix: Option<String>,
    #[serde(default)]
    pub kubelet_image_gc: Option<KubeletImageGc>,
    #[serde(default)]
    pub public_ip_assignment: Option<PublicIpAssignment>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateSksNodepoolRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub instance_type: Option<Reference>,
    pub disk_size: i64,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addons: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taints: Option<BTreeMap<String, SksNodepoolTaint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anti_affinity_groups: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_networks: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_target: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubelet_image_gc: Option<KubeletImageGc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip_assignment: Option<PublicIpAssignment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateSksNodepoolRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_type: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taints: Option<BTreeMap<String, SksNodepoolTaint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anti_affinity_groups: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_groups: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_networks: Option<Vec<Reference>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_target: Option<Reference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubelet_image_gc: Option<KubeletImageGc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_ip_assignment: Option<PublicIpAssignment>,
}

impl UpdateSksNodepoolRequest {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SksKubeconfigRequest {
    pub user: String,
    pub groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SksKubeconfig {
    /// Base64-encoded kubeconfig document.
    pub kubeconfig: String,
}

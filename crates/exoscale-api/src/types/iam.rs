use serde::{Deserialize, Serialize};

/// Resource restriction attached to an IAM access key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AccessKeyResource {
    pub domain: String,
    pub resource_type: String,
    pub resource_name: String,
}

impl AccessKeyResource {
    /// Parse the `<domain>/<type>:<name>` notation.
    pub fn parse(s: &str) -> Option<Self> {
        let (domain, rest) = s.split_once('/')?;
        let (resource_type, resource_name) = rest.split_once(':')?;
        if domain.is_empty() || resource_type.is_empty() || resource_name.is_empty() {
            return None;
        }
        Some(Self {
            domain: domain.to_string(),
            resource_type: resource_type.to_string(),
            resource_name: resource_name.to_string(),
        })
    }
}

impl std::fmt::Display for AccessKeyResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}:{}", self.domain, self.resource_type, self.resource_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IamAccessKey {
    pub key: String,
    pub name: String,
    /// Only returned by the create call.
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(rename = "type", default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub operations: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub resources: Option<Vec<AccessKeyResource>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateIamAccessKeyRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<AccessKeyResource>>,
}

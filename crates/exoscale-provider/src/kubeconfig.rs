//! Kubeconfig inspection
//!
//! SKS kubeconfigs embed the cluster CA and a client certificate as base64
//! PEM bundles. [`KubeconfigDocument`] decodes every embedded certificate so
//! the kubeconfig resource can derive its identity and decide when to renew.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use exoscale_provider_core::{ProviderError, Result};
use serde::Deserialize;
use x509_parser::prelude::*;

/// Validity and subject of one embedded certificate
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateInfo {
    /// Serial number in decimal
    pub serial: String,
    pub common_name: String,
    pub organizations: Vec<String>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl CertificateInfo {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| decode_error(format!("failed to parse certificate: {}", e)))?;

        let subject = cert.subject();
        let common_name = subject
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .unwrap_or("")
            .to_string();
        let organizations = subject
            .iter_organization()
            .filter_map(|o| o.as_str().ok().map(str::to_string))
            .collect();

        Ok(Self {
            serial: cert.tbs_certificate.serial.to_string(),
            common_name,
            organizations,
            not_before: timestamp(cert.validity().not_before.timestamp())?,
            not_after: timestamp(cert.validity().not_after.timestamp())?,
        })
    }

    /// Total lifetime of the certificate
    pub fn lifetime(&self) -> chrono::Duration {
        self.not_after - self.not_before
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| decode_error(format!("certificate time {} out of range", secs)))
}

fn decode_error(message: String) -> ProviderError {
    ProviderError::Internal(format!("kubeconfig: {}", message))
}

#[derive(Debug, Deserialize)]
struct RawKubeconfig {
    #[serde(default)]
    clusters: Vec<NamedCluster>,
    #[serde(default)]
    users: Vec<NamedUser>,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
struct ClusterEntry {
    #[serde(rename = "certificate-authority-data")]
    certificate_authority_data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedUser {
    user: UserEntry,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    #[serde(rename = "client-certificate-data")]
    client_certificate_data: Option<String>,
}

/// A parsed kubeconfig with its embedded certificates in document order
#[derive(Debug, Clone)]
pub struct KubeconfigDocument {
    raw: String,
    certificates: Vec<CertificateInfo>,
}

impl KubeconfigDocument {
    /// Decode the base64 document returned by the API.
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| decode_error(format!("invalid base64: {}", e)))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| decode_error(format!("not UTF-8: {}", e)))?;
        Self::parse(&text)
    }

    /// Parse a kubeconfig YAML document.
    pub fn parse(text: &str) -> Result<Self> {
        let doc: RawKubeconfig = serde_yaml::from_str(text)
            .map_err(|e| decode_error(format!("invalid YAML: {}", e)))?;

        let bundles = doc
            .clusters
            .iter()
            .filter_map(|c| c.cluster.certificate_authority_data.as_deref())
            .chain(
                doc.users
                    .iter()
                    .filter_map(|u| u.user.client_certificate_data.as_deref()),
            );

        let mut certificates = Vec::new();
        for bundle in bundles {
            let pem_bytes = STANDARD
                .decode(bundle.trim())
                .map_err(|e| decode_error(format!("invalid certificate data: {}", e)))?;
            let pems = ::pem::parse_many(&pem_bytes)
                .map_err(|e| decode_error(format!("failed to parse PEM: {}", e)))?;
            for p in pems.iter().filter(|p| p.tag() == "CERTIFICATE") {
                certificates.push(CertificateInfo::from_der(p.contents())?);
            }
        }

        Ok(Self {
            raw: text.to_string(),
            certificates,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn certificates(&self) -> &[CertificateInfo] {
        &self.certificates
    }

    /// Colon-joined serial numbers, used as the resource identity.
    pub fn identity(&self) -> String {
        self.certificates
            .iter()
            .map(|c| c.serial.as_str())
            .collect::<Vec<_>>()
            .join(":")
    }

    /// The soonest expiry among the embedded certificates.
    pub fn earliest_expiry(&self) -> Option<DateTime<Utc>> {
        self.certificates.iter().map(|c| c.not_after).min()
    }

    /// Whether a certificate expires within `early_renewal_seconds` of `now`.
    pub fn ready_for_renewal(&self, now: DateTime<Utc>, early_renewal_seconds: i64) -> bool {
        match self.earliest_expiry() {
            Some(expiry) => now + chrono::Duration::seconds(early_renewal_seconds) >= expiry,
            None => false,
        }
    }
}

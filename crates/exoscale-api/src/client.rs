//! HTTP client for the Exoscale v2 API
//!
//! Every call resolves the zone endpoint from the request context, signs the
//! request with the account's API key and maps HTTP failures onto
//! [`ApiError`].

use crate::api::ExoscaleApi;
use crate::context::Context;
use crate::error::{ApiError, Result};
use crate::signature::{Credentials, SIGNATURE_TTL_SECS};
use crate::types::*;
use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_ENVIRONMENT: &str = "api";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub key: String,
    pub secret: String,
    /// Environment prefix of the zone endpoint (`api` in production).
    pub environment: String,
    /// Full base URL (including `/v2`) used instead of the zone endpoint.
    pub endpoint: Option<String>,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
}

impl ClientConfig {
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            endpoint: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }
}

/// Exoscale API client
pub struct Client {
    http: reqwest::Client,
    credentials: Credentials,
    environment: String,
    endpoint: Option<String>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.key.is_empty() || config.secret.is_empty() {
            return Err(ApiError::InvalidRequest(
                "API key and secret must be set".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("exoscale-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            credentials: Credentials::new(config.key, config.secret),
            environment: config.environment,
            endpoint: config.endpoint,
        })
    }

    /// Base URL for calls made under `ctx`.
    pub fn base_url(&self, ctx: &Context) -> Result<String> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.trim_end_matches('/').to_string());
        }
        let zone = ctx.require_zone()?;
        Ok(format!(
            "https://{}-{}.exoscale.com/v2",
            self.environment, zone
        ))
    }

    async fn call<B, T>(&self, ctx: &Context, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = Url::parse(&format!("{}{}", self.base_url(ctx)?, path))
            .map_err(|e| ApiError::InvalidRequest(format!("invalid URL for {}: {}", path, e)))?;
        let payload = match body {
            Some(b) => serde_json::to_vec(b)?,
            None => Vec::new(),
        };
        let expires = chrono::Utc::now().timestamp() + SIGNATURE_TTL_SECS;
        let authorization =
            self.credentials
                .authorization(method.as_str(), url.path(), &[], &payload, expires);

        tracing::debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, authorization);
        if body.is_some() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(payload);
        }

        ctx.run(async move {
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;
            if status.is_success() {
                return Ok(serde_json::from_str(&text)?);
            }
            let message = remote_message(&text);
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ApiError::NotFound(message));
            }
            Err(ApiError::Api {
                status: status.as_u16(),
                message,
            })
        })
        .await
    }

    async fn get<T: DeserializeOwned>(&self, ctx: &Context, path: &str) -> Result<T> {
        self.call::<(), T>(ctx, Method::GET, path, None).await
    }

    async fn post<B, T>(&self, ctx: &Context, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        self.call(ctx, Method::POST, path, Some(body)).await
    }

    async fn put<B>(&self, ctx: &Context, path: &str, body: &B) -> Result<Operation>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.call(ctx, Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, ctx: &Context, path: &str) -> Result<Operation> {
        self.call::<(), Operation>(ctx, Method::DELETE, path, None)
            .await
    }
}

/// Extract the `message` field of an error body, falling back to the raw text.
fn remote_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(e) => e.message,
        Err(_) if body.trim().is_empty() => "no error message".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

fn instance_ref(instance_id: &str) -> serde_json::Value {
    json!({ "instance": { "id": instance_id } })
}

// ============ List envelopes ============

#[derive(Deserialize)]
struct InstanceTypeList {
    #[serde(rename = "instance-types", default)]
    instance_types: Vec<InstanceType>,
}

#[derive(Deserialize)]
struct DnsDomainList {
    #[serde(rename = "dns-domains", default)]
    dns_domains: Vec<DnsDomain>,
}

#[derive(Deserialize)]
struct DnsDomainRecordList {
    #[serde(rename = "dns-domain-records", default)]
    dns_domain_records: Vec<DnsDomainRecord>,
}

#[derive(Deserialize)]
struct SksVersionList {
    #[serde(rename = "sks-cluster-versions", default)]
    sks_cluster_versions: Vec<String>,
}

#[derive(Deserialize)]
struct CaCertificate {
    certificate: String,
}

#[async_trait]
impl ExoscaleApi for Client {
    async fn get_operation(&self, ctx: &Context, id: &str) -> Result<Operation> {
        self.get(ctx, &format!("/operation/{}", id)).await
    }

    async fn list_instance_types(&self, ctx: &Context) -> Result<Vec<InstanceType>> {
        let list: InstanceTypeList = self.get(ctx, "/instance-type").await?;
        Ok(list.instance_types)
    }

    async fn create_instance(
        &self,
        ctx: &Context,
        req: &CreateInstanceRequest,
    ) -> Result<Operation> {
        self.post(ctx, "/instance", req).await
    }

    async fn get_instance(&self, ctx: &Context, id: &str) -> Result<Instance> {
        self.get(ctx, &format!("/instance/{}", id)).await
    }

    async fn update_instance(
        &self,
        ctx: &Context,
        id: &str,
        req: &UpdateInstanceRequest,
    ) -> Result<Operation> {
        self.put(ctx, &format!("/instance/{}", id), req).await
    }

    async fn delete_instance(&self, ctx: &Context, id: &str) -> Result<Operation> {
        self.delete(ctx, &format!("/instance/{}", id)).await
    }

    async fn start_instance(&self, ctx: &Context, id: &str) -> Result<Operation> {
        self.put(ctx, &format!("/instance/{}:start", id), &json!({}))
            .await
    }

    async fn stop_instance(&self, ctx: &Context, id: &str) -> Result<Operation> {
        self.put(ctx, &format!("/instance/{}:stop", id), &json!({}))
            .await
    }

    async fn scale_instance(
        &self,
        ctx: &Context,
        id: &str,
        instance_type_id: &str,
    ) -> Result<Operation> {
        let body = json!({ "instance-type": { "id": instance_type_id } });
        self.put(ctx, &format!("/instance/{}:scale", id), &body).await
    }

    async fn resize_instance_disk(
        &self,
        ctx: &Context,
        id: &str,
        disk_size: i64,
    ) -> Result<Operation> {
        let body = json!({ "disk-size": disk_size });
        self.put(ctx, &format!("/instance/{}:resize-disk", id), &body)
            .await
    }

    async fn attach_instance_to_security_group(
        &self,
        ctx: &Context,
        security_group_id: &str,
        instance_id: &str,
    ) -> Result<Operation> {
        let path = format!("/security-group/{}:attach", security_group_id);
        self.put(ctx, &path, &instance_ref(instance_id)).await
    }

    async fn detach_instance_from_security_group(
        &self,
        ctx: &Context,
        security_group_id: &str,
        instance_id: &str,
    ) -> Result<Operation> {
        let path = format!("/security-group/{}:detach", security_group_id);
        self.put(ctx, &path, &instance_ref(instance_id)).await
    }

    async fn attach_instance_to_elastic_ip(
        &self,
        ctx: &Context,
        elastic_ip_id: &str,
        instance_id: &str,
    ) -> Result<Operation> {
        let path = format!("/elastic-ip/{}:attach", elastic_ip_id);
        self.put(ctx, &path, &instance_ref(instance_id)).await
    }

    async fn detach_instance_from_elastic_ip(
        &self,
        ctx: &Context,
        elastic_ip_id: &str,
        instance_id: &str,
    ) -> Result<Operation> {
        let path = format!("/elastic-ip/{}:detach", elastic_ip_id);
        self.put(ctx, &path, &instance_ref(instance_id)).await
    }

    async fn attach_instance_to_private_network(
        &self,
        ctx: &Context,
        private_network_id: &str,
        instance_id: &str,
    ) -> Result<Operation> {
        let path = format!("/private-network/{}:attach", private_network_id);
        self.put(ctx, &path, &instance_ref(instance_id)).await
    }

    async fn detach_instance_from_private_network(
        &self,
        ctx: &Context,
        private_network_id: &str,
        instance_id: &str,
    ) -> Result<Operation> {
        let path = format!("/private-network/{}:detach", private_network_id);
        self.put(ctx, &path, &instance_ref(instance_id)).await
    }

    async fn get_reverse_dns_instance(
        &self,
        ctx: &Context,
        id: &str,
    ) -> Result<ReverseDnsRecord> {
        self.get(ctx, &format!("/reverse-dns/instance/{}", id)).await
    }

    async fn update_reverse_dns_instance(
        &self,
        ctx: &Context,
        id: &str,
        domain_name: &str,
    ) -> Result<Operation> {
        let body = json!({ "domain-name": domain_name });
        self.post(ctx, &format!("/reverse-dns/instance/{}", id), &body)
            .await
    }

    async fn delete_reverse_dns_instance(&self, ctx: &Context, id: &str) -> Result<Operation> {
        self.delete(ctx, &format!("/reverse-dns/instance/{}", id))
            .await
    }

    async fn create_instance_pool(
        &self,
        ctx: &Context,
        req: &CreateInstancePoolRequest,
    ) -> Result<Operation> {
        self.post(ctx, "/instance-pool", req).await
    }

    async fn get_instance_pool(&self, ctx: &Context, id: &str) -> Result<InstancePool> {
        self.get(ctx, &format!("/instance-pool/{}", id)).await
    }

    async fn update_instance_pool(
        &self,
        ctx: &Context,
        id: &str,
        req: &UpdateInstancePoolRequest,
    ) -> Result<Operation> {
        self.put(ctx, &format!("/instance-pool/{}", id), req).await
    }

    async fn scale_instance_pool(&self, ctx: &Context, id: &str, size: i64) -> Result<Operation> {
        let body = json!({ "size": size });
        self.put(ctx, &format!("/instance-pool/{}:scale", id), &body)
            .await
    }

    async fn reset_instance_pool_field(
        &self,
        ctx: &Context,
        id: &str,
        field: &str,
    ) -> Result<Operation> {
        self.delete(ctx, &format!("/instance-pool/{}/{}", id, field))
            .await
    }

    async fn delete_instance_pool(&self, ctx: &Context, id: &str) -> Result<Operation> {
        self.delete(ctx, &format!("/instance-pool/{}", id)).await
    }

    async fn create_anti_affinity_group(
        &self,
        ctx: &Context,
        req: &CreateAntiAffinityGroupRequest,
    ) -> Result<Operation> {
        self.post(ctx, "/anti-affinity-group", req).await
    }

    async fn get_anti_affinity_group(
        &self,
        ctx: &Context,
        id: &str,
    ) -> Result<AntiAffinityGroup> {
        self.get(ctx, &format!("/anti-affinity-group/{}", id)).await
    }

    async fn delete_anti_affinity_group(&self, ctx: &Context, id: &str) -> Result<Operation> {
        self.delete(ctx, &format!("/anti-affinity-group/{}", id))
            .await
    }

    async fn create_security_group(
        &self,
        ctx: &Context,
        req: &CreateSecurityGroupRequest,
    ) -> Result<Operation> {
        self.post(ctx, "/security-group", req).await
    }

    async fn get_security_group(&self, ctx: &Context, id: &str) -> Result<SecurityGroup> {
        self.get(ctx, &format!("/security-group/{}", id)).await
    }

    async fn delete_security_group(&self, ctx: &Context, id: &str) -> Result<Operation> {
        self.delete(ctx, &format!("/security-group/{}", id)).await
    }

    async fn add_security_group_rule(
        &self,
        ctx: &Context,
        security_group_id: &str,
        req: &AddSecurityGroupRuleRequest,
    ) -> Result<Operation> {
        let path = format!("/security-group/{}/rules", security_group_id);
        self.post(ctx, &path, req).await
    }

    async fn delete_security_group_rule(
        &self,
        ctx: &Context,
        security_group_id: &str,
        rule_id: &str,
    ) -> Result<Operation> {
        let path = format!("/security-group/{}/rules/{}", security_group_id, rule_id);
        self.delete(ctx, &path).await
    }

    async fn add_external_source_to_security_group(
        &self,
        ctx: &Context,
        security_group_id: &str,
        cidr: &str,
    ) -> Result<Operation> {
        let path = format!("/security-group/{}:add-source", security_group_id);
        self.put(ctx, &path, &json!({ "cidr": cidr })).await
    }

    async fn remove_external_source_from_security_group(
        &self,
        ctx: &Context,
        security_group_id: &str,
        cidr: &str,
    ) -> Result<Operation> {
        let path = format!("/security-group/{}:remove-source", security_group_id);
        self.put(ctx, &path, &json!({ "cidr": cidr })).await
    }

    async fn create_private_network(
        &self,
        ctx: &Context,
        req: &PrivateNetworkRequest,
    ) -> Result<Operation> {
        self.post(ctx, "/private-network", req).await
    }

    async fn get_private_network(&self, ctx: &Context, id: &str) -> Result<PrivateNetwork> {
        self.get(ctx, &format!("/private-network/{}", id)).await
    }

    async fn update_private_network(
        &self,
        ctx: &Context,
        id: &str,
        req: &PrivateNetworkRequest,
    ) -> Result<Operation> {
        self.put(ctx, &format!("/private-network/{}", id), req).await
    }

    async fn delete_private_network(&self, ctx: &Context, id: &str) -> Result<Operation> {
        self.delete(ctx, &format!("/private-network/{}", id)).await
    }

    async fn register_ssh_key(
        &self,
        ctx: &Context,
        req: &RegisterSshKeyRequest,
    ) -> Result<Operation> {
        self.post(ctx, "/ssh-key", req).await
    }

    async fn get_ssh_key(&self, ctx: &Context, name: &str) -> Result<SshKey> {
        self.get(ctx, &format!("/ssh-key/{}", name)).await
    }

    async fn delete_ssh_key(&self, ctx: &Context, name: &str) -> Result<Operation> {
        self.delete(ctx, &format!("/ssh-key/{}", name)).await
    }

    async fn create_dns_domain(&self, ctx: &Context, unicode_name: &str) -> Result<DnsDomain> {
        self.post(ctx, "/dns-domain", &json!({ "unicode-name": unicode_name }))
            .await
    }

    async fn get_dns_domain(&self, ctx: &Context, id: &str) -> Result<DnsDomain> {
        self.get(ctx, &format!("/dns-domain/{}", id)).await
    }

    async fn list_dns_domains(&self, ctx: &Context) -> Result<Vec<DnsDomain>> {
        let list: DnsDomainList = self.get(ctx, "/dns-domain").await?;
        Ok(list.dns_domains)
    }

    async fn delete_dns_domain(&self, ctx: &Context, id: &str) -> Result<Operation> {
        self.delete(ctx, &format!("/dns-domain/{}", id)).await
    }

    async fn create_dns_domain_record(
        &self,
        ctx: &Context,
        domain_id: &str,
        req: &CreateDnsDomainRecordRequest,
    ) -> Result<Operation> {
        self.post(ctx, &format!("/dns-domain/{}/record", domain_id), req)
            .await
    }

    async fn get_dns_domain_record(
        &self,
        ctx: &Context,
        domain_id: &str,
        record_id: &str,
    ) -> Result<DnsDomainRecord> {
        let path = format!("/dns-domain/{}/record/{}", domain_id, record_id);
        self.get(ctx, &path).await
    }

    async fn list_dns_domain_records(
        &self,
        ctx: &Context,
        domain_id: &str,
    ) -> Result<Vec<DnsDomainRecord>> {
        let list: DnsDomainRecordList = self
            .get(ctx, &format!("/dns-domain/{}/record", domain_id))
            .await?;
        Ok(list.dns_domain_records)
    }

    async fn update_dns_domain_record(
        &self,
        ctx: &Context,
        domain_id: &str,
        record_id: &str,
        req: &UpdateDnsDomainRecordRequest,
    ) -> Result<Operation> {
        let path = format!("/dns-domain/{}/record/{}", domain_id, record_id);
        self.put(ctx, &path, req).await
    }

    async fn delete_dns_domain_record(
        &self,
        ctx: &Context,
        domain_id: &str,
        record_id: &str,
    ) -> Result<Operation> {
        let path = format!("/dns-domain/{}/record/{}", domain_id, record_id);
        self.delete(ctx, &path).await
    }

    async fn create_iam_access_key(
        &self,
        ctx: &Context,
        req: &CreateIamAccessKeyRequest,
    ) -> Result<IamAccessKey> {
        self.post(ctx, "/access-key", req).await
    }

    async fn get_iam_access_key(&self, ctx: &Context, key: &str) -> Result<IamAccessKey> {
        self.get(ctx, &format!("/access-key/{}", key)).await
    }

    async fn revoke_iam_access_key(&self, ctx: &Context, key: &str) -> Result<Operation> {
        self.delete(ctx, &format!("/access-key/{}", key)).await
    }

    async fn create_elastic_ip(
        &self,
        ctx: &Context,
        req: &CreateElasticIpRequest,
    ) -> Result<Operation> {
        self.post(ctx, "/elastic-ip", req).await
    }

    async fn get_elastic_ip(&self, ctx: &Context, id: &str) -> Result<ElasticIp> {
        self.get(ctx, &format!("/elastic-ip/{}", id)).await
    }

    async fn update_elastic_ip(
        &self,
        ctx: &Context,
        id: &str,
        req: &UpdateElasticIpRequest,
    ) -> Result<Operation> {
        self.put(ctx, &format!("/elastic-ip/{}", id), req).await
    }

    async fn reset_elastic_ip_field(
        &self,
        ctx: &Context,
        id: &str,
        field: &str,
    ) -> Result<Operation> {
        self.delete(ctx, &format!("/elastic-ip/{}/{}", id, field))
            .await
    }

    async fn delete_elastic_ip(&self, ctx: &Context, id: &str) -> Result<Operation> {
        self.delete(ctx, &format!("/elastic-ip/{}", id)).await
    }

    async fn get_reverse_dns_elastic_ip(
        &self,
        ctx: &Context,
        id: &str,
    ) -> Result<ReverseDnsRecord> {
        self.get(ctx, &format!("/reverse-dns/elastic-ip/{}", id))
            .await
    }

    async fn update_reverse_dns_elastic_ip(
        &self,
        ctx: &Context,
        id: &str,
        domain_name: &str,
    ) -> Result<Operation> {
        let body = json!({ "domain-name": domain_name });
        self.post(ctx, &format!("/reverse-dns/elastic-ip/{}", id), &body)
            .await
    }

    async fn delete_reverse_dns_elastic_ip(
        &self,
        ctx: &Context,
        id: &str,
    ) -> Result<Operation> {
        self.delete(ctx, &format!("/reverse-dns/elastic-ip/{}", id))
            .await
    }

    async fn create_load_balancer(&self, ctx: &Context, req: &NlbRequest) -> Result<Operation> {
        self.post(ctx, "/load-balancer", req).await
    }

    async fn get_load_balancer(&self, ctx: &Context, id: &str) -> Result<Nlb> {
        self.get(ctx, &format!("/load-balancer/{}", id)).await
    }

    async fn update_load_balancer(
        &self,
        ctx: &Context,
        id: &str,
        req: &NlbRequest,
    ) -> Result<Operation> {
        self.put(ctx, &format!("/load-balancer/{}", id), req).await
    }

    async fn delete_load_balancer(&self, ctx: &Context, id: &str) -> Result<Operation> {
        self.delete(ctx, &format!("/load-balancer/{}", id)).await
    }

    async fn add_service_to_load_balancer(
        &self,
        ctx: &Context,
        nlb_id: &str,
        req: &NlbServiceRequest,
    ) -> Result<Operation> {
        self.post(ctx, &format!("/load-balancer/{}/service", nlb_id), req)
            .await
    }

    async fn get_load_balancer_service(
        &self,
        ctx: &Context,
        nlb_id: &str,
        service_id: &str,
    ) -> Result<NlbService> {
        let path = format!("/load-balancer/{}/service/{}", nlb_id, service_id);
        self.get(ctx, &path).await
    }

    async fn update_load_balancer_service(
        &self,
        ctx: &Context,
        nlb_id: &str,
        service_id: &str,
        req: &NlbServiceRequest,
    ) -> Result<Operation> {
        let path = format!("/load-balancer/{}/service/{}", nlb_id, service_id);
        self.put(ctx, &path, req).await
    }

    async fn delete_load_balancer_service(
        &self,
        ctx: &Context,
        nlb_id: &str,
        service_id: &str,
    ) -> Result<Operation> {
        let path = format!("/load-balancer/{}/service/{}", nlb_id, service_id);
        self.delete(ctx, &path).await
    }

    async fn list_sks_cluster_versions(&self, ctx: &Context) -> Result<Vec<String>> {
        let list: SksVersionList = self.get(ctx, "/sks-cluster-version").await?;
        Ok(list.sks_cluster_versions)
    }

    async fn create_sks_cluster(
        &self,
        ctx: &Context,
        req: &CreateSksClusterRequest,
    ) -> Result<Operation> {
        self.post(ctx, "/sks-cluster", req).await
    }

    async fn get_sks_cluster(&self, ctx: &Context, id: &str) -> Result<SksCluster> {
        self.get(ctx, &format!("/sks-cluster/{}", id)).await
    }

    async fn update_sks_cluster(
        &self,
        ctx: &Context,
        id: &str,
        req: &UpdateSksClusterRequest,
    ) -> Result<Operation> {
        self.put(ctx, &format!("/sks-cluster/{}", id), req).await
    }

    async fn upgrade_sks_cluster(
        &self,
        ctx: &Context,
        id: &str,
        version: &str,
    ) -> Result<Operation> {
        let body = json!({ "version": version });
        self.put(ctx, &format!("/sks-cluster/{}/upgrade", id), &body)
            .await
    }

    async fn delete_sks_cluster(&self, ctx: &Context, id: &str) -> Result<Operation> {
        self.delete(ctx, &format!("/sks-cluster/{}", id)).await
    }

    async fn create_sks_nodepool(
        &self,
        ctx: &Context,
        cluster_id: &str,
        req: &CreateSksNodepoolRequest,
    ) -> Result<Operation> {
        self.post(ctx, &format!("/sks-cluster/{}/nodepool", cluster_id), req)
            .await
    }

    async fn get_sks_nodepool(
        &self,
        ctx: &Context,
        cluster_id: &str,
        nodepool_id: &str,
    ) -> Result<SksNodepool> {
        let path = format!("/sks-cluster/{}/nodepool/{}", cluster_id, nodepool_id);
        self.get(ctx, &path).await
    }

    async fn update_sks_nodepool(
        &self,
        ctx: &Context,
        cluster_id: &str,
        nodepool_id: &str,
        req: &UpdateSksNodepoolRequest,
    ) -> Result<Operation> {
        let path = format!("/sks-cluster/{}/nodepool/{}", cluster_id, nodepool_id);
        self.put(ctx, &path, req).await
    }

    async fn scale_sks_nodepool(
        &self,
        ctx: &Context,
        cluster_id: &str,
        nodepool_id: &str,
        size: i64,
    ) -> Result<Operation> {
        let path = format!("/sks-cluster/{}/nodepool/{}:scale", cluster_id, nodepool_id);
        self.put(ctx, &path, &json!({ "size": size })).await
    }

    async fn delete_sks_nodepool(
        &self,
        ctx: &Context,
        cluster_id: &str,
        nodepool_id: &str,
    ) -> Result<Operation> {
        let path = format!("/sks-cluster/{}/nodepool/{}", cluster_id, nodepool_id);
        self.delete(ctx, &path).await
    }

    async fn generate_sks_cluster_kubeconfig(
        &self,
        ctx: &Context,
        cluster_id: &str,
        req: &SksKubeconfigRequest,
    ) -> Result<SksKubeconfig> {
        self.post(ctx, &format!("/sks-cluster-kubeconfig/{}", cluster_id), req)
            .await
    }

    async fn create_dbaas_service_pg(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasPgRequest,
    ) -> Result<Operation> {
        self.post(ctx, &format!("/dbaas-postgres/{}", name), req)
            .await
    }

    async fn get_dbaas_service_pg(&self, ctx: &Context, name: &str) -> Result<DbaasServicePg> {
        self.get(ctx, &format!("/dbaas-postgres/{}", name)).await
    }

    async fn update_dbaas_service_pg(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasPgRequest,
    ) -> Result<Operation> {
        self.put(ctx, &format!("/dbaas-postgres/{}", name), req).await
    }

    async fn create_dbaas_service_mysql(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasMysqlRequest,
    ) -> Result<Operation> {
        self.post(ctx, &format!("/dbaas-mysql/{}", name), req).await
    }

    async fn get_dbaas_service_mysql(
        &self,
        ctx: &Context,
        name: &str,
    ) -> Result<DbaasServiceMysql> {
        self.get(ctx, &format!("/dbaas-mysql/{}", name)).await
    }

    async fn update_dbaas_service_mysql(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasMysqlRequest,
    ) -> Result<Operation> {
        self.put(ctx, &format!("/dbaas-mysql/{}", name), req).await
    }

    async fn create_dbaas_service_redis(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasRedisRequest,
    ) -> Result<Operation> {
        self.post(ctx, &format!("/dbaas-redis/{}", name), req).await
    }

    async fn get_dbaas_service_redis(
        &self,
        ctx: &Context,
        name: &str,
    ) -> Result<DbaasServiceRedis> {
        self.get(ctx, &format!("/dbaas-redis/{}", name)).await
    }

    async fn update_dbaas_service_redis(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasRedisRequest,
    ) -> Result<Operation> {
        self.put(ctx, &format!("/dbaas-redis/{}", name), req).await
    }

    async fn create_dbaas_service_kafka(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasKafkaRequest,
    ) -> Result<Operation> {
        self.post(ctx, &format!("/dbaas-kafka/{}", name), req).await
    }

    async fn get_dbaas_service_kafka(
        &self,
        ctx: &Context,
        name: &str,
    ) -> Result<DbaasServiceKafka> {
        self.get(ctx, &format!("/dbaas-kafka/{}", name)).await
    }

    async fn update_dbaas_service_kafka(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasKafkaRequest,
    ) -> Result<Operation> {
        self.put(ctx, &format!("/dbaas-kafka/{}", name), req).await
    }

    async fn create_dbaas_service_opensearch(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasOpensearchRequest,
    ) -> Result<Operation> {
        self.post(ctx, &format!("/dbaas-opensearch/{}", name), req)
            .await
    }

    async fn get_dbaas_service_opensearch(
        &self,
        ctx: &Context,
        name: &str,
    ) -> Result<DbaasServiceOpensearch> {
        self.get(ctx, &format!("/dbaas-opensearch/{}", name)).await
    }

    async fn update_dbaas_service_opensearch(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasOpensearchRequest,
    ) -> Result<Operation> {
        self.put(ctx, &format!("/dbaas-opensearch/{}", name), req)
            .await
    }

    async fn delete_dbaas_service(&self, ctx: &Context, name: &str) -> Result<Operation> {
        self.delete(ctx, &format!("/dbaas-service/{}", name)).await
    }

    async fn get_dbaas_settings(
        &self,
        ctx: &Context,
        service_type: DbaasServiceType,
    ) -> Result<DbaasSettingsSchemas> {
        self.get(ctx, &format!("/dbaas-settings-{}", service_type.as_str()))
            .await
    }

    async fn get_dbaas_ca_certificate(&self, ctx: &Context) -> Result<String> {
        let ca: CaCertificate = self.get(ctx, "/dbaas-ca-certificate").await?;
        Ok(ca.certificate)
    }
}

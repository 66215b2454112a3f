//! Typed Exoscale API surface
//!
//! [`ExoscaleApi`] is the seam between resource handlers and the wire. The
//! HTTP implementation lives in [`crate::client`]; tests substitute an
//! in-memory fake. Every call takes the request [`Context`], which pins the
//! zone and bounds the call.
//!
//! Mutating calls return an [`Operation`] handle that callers poll until it
//! reaches a terminal state.

use crate::context::Context;
use crate::error::Result;
use crate::types::*;
use async_trait::async_trait;

#[async_trait]
pub trait ExoscaleApi: Send + Sync {
    // Operations and catalog

    async fn get_operation(&self, ctx: &Context, id: &str) -> Result<Operation>;
    async fn list_instance_types(&self, ctx: &Context) -> Result<Vec<InstanceType>>;

    // Compute instances

    async fn create_instance(&self, ctx: &Context, req: &CreateInstanceRequest)
    -> Result<Operation>;
    async fn get_instance(&self, ctx: &Context, id: &str) -> Result<Instance>;
    async fn update_instance(
        &self,
        ctx: &Context,
        id: &str,
        req: &UpdateInstanceRequest,
    ) -> Result<Operation>;
    async fn delete_instance(&self, ctx: &Context, id: &str) -> Result<Operation>;
    async fn start_instance(&self, ctx: &Context, id: &str) -> Result<Operation>;
    async fn stop_instance(&self, ctx: &Context, id: &str) -> Result<Operation>;
    async fn scale_instance(
        &self,
        ctx: &Context,
        id: &str,
        instance_type_id: &str,
    ) -> Result<Operation>;
    async fn resize_instance_disk(
        &self,
        ctx: &Context,
        id: &str,
        disk_size: i64,
    ) -> Result<Operation>;
    async fn attach_instance_to_security_group(
        &self,
        ctx: &Context,
        security_group_id: &str,
        instance_id: &str,
    ) -> Result<Operation>;
    async fn detach_instance_from_security_group(
        &self,
        ctx: &Context,
        security_group_id: &str,
        instance_id: &str,
    ) -> Result<Operation>;
    async fn attach_instance_to_elastic_ip(
        &self,
        ctx: &Context,
        elastic_ip_id: &str,
        instance_id: &str,
    ) -> Result<Operation>;
    async fn detach_instance_from_elastic_ip(
        &self,
        ctx: &Context,
        elastic_ip_id: &str,
        instance_id: &str,
    ) -> Result<Operation>;
    async fn attach_instance_to_private_network(
        &self,
        ctx: &Context,
        private_network_id: &str,
        instance_id: &str,
    ) -> Result<Operation>;
    async fn detach_instance_from_private_network(
        &self,
        ctx: &Context,
        private_network_id: &str,
        instance_id: &str,
    ) -> Result<Operation>;
    async fn get_reverse_dns_instance(&self, ctx: &Context, id: &str)
    -> Result<ReverseDnsRecord>;
    async fn update_reverse_dns_instance(
        &self,
        ctx: &Context,
        id: &str,
        domain_name: &str,
    ) -> Result<Operation>;
    async fn delete_reverse_dns_instance(&self, ctx: &Context, id: &str) -> Result<Operation>;

    // Instance pools

    async fn create_instance_pool(
        &self,
        ctx: &Context,
        req: &CreateInstancePoolRequest,
    ) -> Result<Operation>;
    async fn get_instance_pool(&self, ctx: &Context, id: &str) -> Result<InstancePool>;
    async fn update_instance_pool(
        &self,
        ctx: &Context,
        id: &str,
        req: &UpdateInstancePoolRequest,
    ) -> Result<Operation>;
    async fn scale_instance_pool(&self, ctx: &Context, id: &str, size: i64) -> Result<Operation>;
    /// Reset an optional pool field to its server-side default.
    async fn reset_instance_pool_field(
        &self,
        ctx: &Context,
        id: &str,
        field: &str,
    ) -> Result<Operation>;
    async fn delete_instance_pool(&self, ctx: &Context, id: &str) -> Result<Operation>;

    // Anti-affinity groups

    async fn create_anti_affinity_group(
        &self,
        ctx: &Context,
        req: &CreateAntiAffinityGroupRequest,
    ) -> Result<Operation>;
    async fn get_anti_affinity_group(&self, ctx: &Context, id: &str)
    -> Result<AntiAffinityGroup>;
    async fn delete_anti_affinity_group(&self, ctx: &Context, id: &str) -> Result<Operation>;

    // Security groups

    async fn create_security_group(
        &self,
        ctx: &Context,
        req: &CreateSecurityGroupRequest,
    ) -> Result<Operation>;
    async fn get_security_group(&self, ctx: &Context, id: &str) -> Result<SecurityGroup>;
    async fn delete_security_group(&self, ctx: &Context, id: &str) -> Result<Operation>;
    async fn add_security_group_rule(
        &self,
        ctx: &Context,
        security_group_id: &str,
        req: &AddSecurityGroupRuleRequest,
    ) -> Result<Operation>;
    async fn delete_security_group_rule(
        &self,
        ctx: &Context,
        security_group_id: &str,
        rule_id: &str,
    ) -> Result<Operation>;
    async fn add_external_source_to_security_group(
        &self,
        ctx: &Context,
        security_group_id: &str,
        cidr: &str,
    ) -> Result<Operation>;
    async fn remove_external_source_from_security_group(
        &self,
        ctx: &Context,
        security_group_id: &str,
        cidr: &str,
    ) -> Result<Operation>;

    // Private networks

    async fn create_private_network(
        &self,
        ctx: &Context,
        req: &PrivateNetworkRequest,
    ) -> Result<Operation>;
    async fn get_private_network(&self, ctx: &Context, id: &str) -> Result<PrivateNetwork>;
    async fn update_private_network(
        &self,
        ctx: &Context,
        id: &str,
        req: &PrivateNetworkRequest,
    ) -> Result<Operation>;
    async fn delete_private_network(&self, ctx: &Context, id: &str) -> Result<Operation>;

    // SSH keys

    async fn register_ssh_key(&self, ctx: &Context, req: &RegisterSshKeyRequest)
    -> Result<Operation>;
    async fn get_ssh_key(&self, ctx: &Context, name: &str) -> Result<SshKey>;
    async fn delete_ssh_key(&self, ctx: &Context, name: &str) -> Result<Operation>;

    // DNS

    async fn create_dns_domain(&self, ctx: &Context, unicode_name: &str) -> Result<DnsDomain>;
    async fn get_dns_domain(&self, ctx: &Context, id: &str) -> Result<DnsDomain>;
    async fn list_dns_domains(&self, ctx: &Context) -> Result<Vec<DnsDomain>>;
    async fn delete_dns_domain(&self, ctx: &Context, id: &str) -> Result<Operation>;
    async fn create_dns_domain_record(
        &self,
        ctx: &Context,
        domain_id: &str,
        req: &CreateDnsDomainRecordRequest,
    ) -> Result<Operation>;
    async fn get_dns_domain_record(
        &self,
        ctx: &Context,
        domain_id: &str,
        record_id: &str,
    ) -> Result<DnsDomainRecord>;
    async fn list_dns_domain_records(
        &self,
        ctx: &Context,
        domain_id: &str,
    ) -> Result<Vec<DnsDomainRecord>>;
    async fn update_dns_domain_record(
        &self,
        ctx: &Context,
        domain_id: &str,
        record_id: &str,
        req: &UpdateDnsDomainRecordRequest,
    ) -> Result<Operation>;
    async fn delete_dns_domain_record(
        &self,
        ctx: &Context,
        domain_id: &str,
        record_id: &str,
    ) -> Result<Operation>;

    // IAM

    /// The returned key carries its secret; later reads never do.
    async fn create_iam_access_key(
        &self,
        ctx: &Context,
        req: &CreateIamAccessKeyRequest,
    ) -> Result<IamAccessKey>;
    async fn get_iam_access_key(&self, ctx: &Context, key: &str) -> Result<IamAccessKey>;
    async fn revoke_iam_access_key(&self, ctx: &Context, key: &str) -> Result<Operation>;

    // Elastic IPs

    async fn create_elastic_ip(&self, ctx: &Context, req: &CreateElasticIpRequest)
    -> Result<Operation>;
    async fn get_elastic_ip(&self, ctx: &Context, id: &str) -> Result<ElasticIp>;
    async fn update_elastic_ip(
        &self,
        ctx: &Context,
        id: &str,
        req: &UpdateElasticIpRequest,
    ) -> Result<Operation>;
    /// Reset an optional elastic IP field (e.g. `healthcheck`) to its default.
    async fn reset_elastic_ip_field(
        &self,
        ctx: &Context,
        id: &str,
        field: &str,
    ) -> Result<Operation>;
    async fn delete_elastic_ip(&self, ctx: &Context, id: &str) -> Result<Operation>;
    async fn get_reverse_dns_elastic_ip(
        &self,
        ctx: &Context,
        id: &str,
    ) -> Result<ReverseDnsRecord>;
    async fn update_reverse_dns_elastic_ip(
        &self,
        ctx: &Context,
        id: &str,
        domain_name: &str,
    ) -> Result<Operation>;
    async fn delete_reverse_dns_elastic_ip(&self, ctx: &Context, id: &str)
    -> Result<Operation>;

    // Network load balancers

    async fn create_load_balancer(&self, ctx: &Context, req: &NlbRequest) -> Result<Operation>;
    async fn get_load_balancer(&self, ctx: &Context, id: &str) -> Result<Nlb>;
    async fn update_load_balancer(
        &self,
        ctx: &Context,
        id: &str,
        req: &NlbRequest,
    ) -> Result<Operation>;
    async fn delete_load_balancer(&self, ctx: &Context, id: &str) -> Result<Operation>;
    async fn add_service_to_load_balancer(
        &self,
        ctx: &Context,
        nlb_id: &str,
        req: &NlbServiceRequest,
    ) -> Result<Operation>;
    async fn get_load_balancer_service(
        &self,
        ctx: &Context,
        nlb_id: &str,
        service_id: &str,
    ) -> Result<NlbService>;
    async fn update_load_balancer_service(
        &self,
        ctx: &Context,
        nlb_id: &str,
        service_id: &str,
        req: &NlbServiceRequest,
    ) -> Result<Operation>;
    async fn delete_load_balancer_service(
        &self,
        ctx: &Context,
        nlb_id: &str,
        service_id: &str,
    ) -> Result<Operation>;

    // SKS

    async fn list_sks_cluster_versions(&self, ctx: &Context) -> Result<Vec<String>>;
    async fn create_sks_cluster(&self, ctx: &Context, req: &CreateSksClusterRequest)
    -> Result<Operation>;
    async fn get_sks_cluster(&self, ctx: &Context, id: &str) -> Result<SksCluster>;
    async fn update_sks_cluster(
        &self,
        ctx: &Context,
        id: &str,
        req: &UpdateSksClusterRequest,
    ) -> Result<Operation>;
    async fn upgrade_sks_cluster(
        &self,
        ctx: &Context,
        id: &str,
        version: &str,
    ) -> Result<Operation>;
    async fn delete_sks_cluster(&self, ctx: &Context, id: &str) -> Result<Operation>;
    async fn create_sks_nodepool(
        &self,
        ctx: &Context,
        cluster_id: &str,
        req: &CreateSksNodepoolRequest,
    ) -> Result<Operation>;
    async fn get_sks_nodepool(
        &self,
        ctx: &Context,
        cluster_id: &str,
        nodepool_id: &str,
    ) -> Result<SksNodepool>;
    async fn update_sks_nodepool(
        &self,
        ctx: &Context,
        cluster_id: &str,
        nodepool_id: &str,
        req: &UpdateSksNodepoolRequest,
    ) -> Result<Operation>;
    async fn scale_sks_nodepool(
        &self,
        ctx: &Context,
        cluster_id: &str,
        nodepool_id: &str,
        size: i64,
    ) -> Result<Operation>;
    async fn delete_sks_nodepool(
        &self,
        ctx: &Context,
        cluster_id: &str,
        nodepool_id: &str,
    ) -> Result<Operation>;
    async fn generate_sks_cluster_kubeconfig(
        &self,
        ctx: &Context,
        cluster_id: &str,
        req: &SksKubeconfigRequest,
    ) -> Result<SksKubeconfig>;

    // Managed databases

    async fn create_dbaas_service_pg(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasPgRequest,
    ) -> Result<Operation>;
    async fn get_dbaas_service_pg(&self, ctx: &Context, name: &str) -> Result<DbaasServicePg>;
    async fn update_dbaas_service_pg(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasPgRequest,
    ) -> Result<Operation>;
    async fn create_dbaas_service_mysql(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasMysqlRequest,
    ) -> Result<Operation>;
    async fn get_dbaas_service_mysql(&self, ctx: &Context, name: &str)
    -> Result<DbaasServiceMysql>;
    async fn update_dbaas_service_mysql(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasMysqlRequest,
    ) -> Result<Operation>;
    async fn create_dbaas_service_redis(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasRedisRequest,
    ) -> Result<Operation>;
    async fn get_dbaas_service_redis(&self, ctx: &Context, name: &str)
    -> Result<DbaasServiceRedis>;
    async fn update_dbaas_service_redis(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasRedisRequest,
    ) -> Result<Operation>;
    async fn create_dbaas_service_kafka(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasKafkaRequest,
    ) -> Result<Operation>;
    async fn get_dbaas_service_kafka(&self, ctx: &Context, name: &str)
    -> Result<DbaasServiceKafka>;
    async fn update_dbaas_service_kafka(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasKafkaRequest,
    ) -> Result<Operation>;
    async fn create_dbaas_service_opensearch(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasOpensearchRequest,
    ) -> Result<Operation>;
    async fn get_dbaas_service_opensearch(
        &self,
        ctx: &Context,
        name: &str,
    ) -> Result<DbaasServiceOpensearch>;
    async fn update_dbaas_service_opensearch(
        &self,
        ctx: &Context,
        name: &str,
        req: &DbaasOpensearchRequest,
    ) -> Result<Operation>;
    async fn delete_dbaas_service(&self, ctx: &Context, name: &str) -> Result<Operation>;
    /// JSON schemas of the settings accepted by a service type.
    async fn get_dbaas_settings(
        &self,
        ctx: &Context,
        service_type: DbaasServiceType,
    ) -> Result<DbaasSettingsSchemas>;
    /// PEM bundle of the CA signing every database service certificate.
    async fn get_dbaas_ca_certificate(&self, ctx: &Context) -> Result<String>;
}

//! `exoscale_security_group_rule`
//!
//! A rule lives inside its security group. Adding a rule returns an
//! operation referencing the group, so the new rule is located by matching
//! its fields against the group's rule list.

use super::{delete_and_wait, gone, require_id, wait};
use async_trait::async_trait;
use exoscale_api::Context;
use exoscale_api::types::{
    AddSecurityGroupRuleRequest, FlowDirection, Icmp, Reference, SecurityGroupRule,
};
use exoscale_provider_core::codec::{opt_int, opt_string, required_string};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{
    Diagnostic, ImportId, ProviderError, ProviderMeta, ResourceData, ResourceHandler, Result,
    Schema, Value, found, validation,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const TYPE_NAME: &str = "exoscale_security_group_rule";

const PROTOCOLS: &[&str] = &[
    "TCP", "UDP", "ICMP", "ICMPv6", "AH", "ESP", "GRE", "IPIP", "ALL",
];

pub struct SecurityGroupRuleResource {
    schema: Arc<Schema>,
}

impl SecurityGroupRuleResource {
    pub fn new() -> Self {
        let schema = Schema::new()
            .attr(
                "security_group_id",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::uuid),
            )
            .attr(
                "type",
                Attribute::string()
                    .required()
                    .force_new()
                    .validate_with(validation::one_of(&["INGRESS", "EGRESS"])),
            )
            .attr(
                "protocol",
                Attribute::string()
                    .optional()
                    .force_new()
                    .default("TCP")
                    .validate_with(validation::one_of_ignore_case(PROTOCOLS))
                    .normalize_with(super::lowercase),
            )
            .attr(
                "start_port",
                Attribute::int()
                    .optional()
                    .force_new()
                    .validate_with(validation::port),
            )
            .attr(
                "end_port",
                Attribute::int()
                    .optional()
                    .force_new()
                    .validate_with(validation::port),
            )
            .attr(
                "cidr",
                Attribute::string()
                    .optional()
                    .force_new()
                    .conflicts_with(&["user_security_group_id"])
                    .validate_with(validation::cidr),
            )
            .attr(
                "user_security_group_id",
                Attribute::string()
                    .optional()
                    .force_new()
                    .validate_with(validation::uuid),
            )
            .attr(
                "icmp_type",
                Attribute::int()
                    .optional()
                    .force_new()
                    .validate_with(validation::int_between(-1, 255)),
            )
            .attr(
                "icmp_code",
                Attribute::int()
                    .optional()
                    .force_new()
                    .validate_with(validation::int_between(-1, 255)),
            )
            .attr("description", Attribute::string().optional().force_new());
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Default for SecurityGroupRuleResource {
    fn default() -> Self {
        Self::new()
    }
}

fn is_icmp(protocol: &str) -> bool {
    protocol.eq_ignore_ascii_case("icmp") || protocol.eq_ignore_ascii_case("icmpv6")
}

fn uses_ports(protocol: &str) -> bool {
    protocol.eq_ignore_ascii_case("tcp") || protocol.eq_ignore_ascii_case("udp")
}

/// Build the add-rule payload, checking the cross-attribute constraints.
fn rule_request(d: &ResourceData) -> Result<AddSecurityGroupRuleRequest> {
    let flow_direction = match required_string(d, "type")?.as_str() {
        "INGRESS" => FlowDirection::Ingress,
        "EGRESS" => FlowDirection::Egress,
        other => {
            return Err(ProviderError::invalid(
                "type",
                format!("{:?} must be INGRESS or EGRESS", other),
            ));
        }
    };
    let protocol = opt_string(d, "protocol").unwrap_or_else(|| "TCP".to_string());

    let network = opt_string(d, "cidr");
    let source = opt_string(d, "user_security_group_id");
    if network.is_none() && source.is_none() {
        return Err(ProviderError::invalid(
            "cidr",
            "one of cidr or user_security_group_id is required",
        ));
    }

    let (start_port, end_port) = if uses_ports(&protocol) {
        let start = opt_int(d, "start_port")
            .ok_or_else(|| ProviderError::invalid("start_port", "required for TCP and UDP"))?;
        let end = opt_int(d, "end_port").unwrap_or(start);
        if end < start {
            return Err(ProviderError::invalid(
                "end_port",
                format!("{} is lower than start_port {}", end, start),
            ));
        }
        (Some(start), Some(end))
    } else {
        (None, None)
    };

    let icmp = is_icmp(&protocol).then(|| Icmp {
        icmp_type: opt_int(d, "icmp_type"),
        code: opt_int(d, "icmp_code"),
    });

    Ok(AddSecurityGroupRuleRequest {
        flow_direction,
        protocol: protocol.to_lowercase(),
        description: opt_string(d, "description"),
        start_port,
        end_port,
        network,
        security_group: source.map(Reference::new),
        icmp,
    })
}

fn same_rule(rule: &SecurityGroupRule, req: &AddSecurityGroupRuleRequest) -> bool {
    rule.flow_direction == req.flow_direction
        && rule.protocol.eq_ignore_ascii_case(&req.protocol)
        && rule.start_port == req.start_port
        && rule.end_port == req.end_port
        && rule.network == req.network
        && rule.security_group == req.security_group
        && rule.icmp.as_ref().map(|i| (i.icmp_type, i.code))
            == req.icmp.as_ref().map(|i| (i.icmp_type, i.code))
        && rule.description.as_deref().unwrap_or_default()
            == req.description.as_deref().unwrap_or_default()
}

fn protocol_name(wire: &str) -> String {
    PROTOCOLS
        .iter()
        .find(|p| p.eq_ignore_ascii_case(wire))
        .map(|p| p.to_string())
        .unwrap_or_else(|| wire.to_uppercase())
}

#[async_trait]
impl ResourceHandler for SecurityGroupRuleResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn validate(&self, config: &BTreeMap<String, Value>) -> Vec<Diagnostic> {
        let mut diags = self.schema.validate(config);
        let set = |k: &str| config.get(k).is_some_and(|v| !v.is_null());
        if !set("cidr") && !set("user_security_group_id") {
            diags.push(Diagnostic::error(
                "cidr",
                "one of cidr or user_security_group_id is required",
            ));
        }
        diags
    }

    async fn create(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let sg_id = required_string(d, "security_group_id")?;
        let req = rule_request(d)?;
        tracing::info!(
            "Adding {} rule to security group: {}",
            req.protocol,
            sg_id
        );

        let op = meta.api.add_security_group_rule(ctx, &sg_id, &req).await?;
        wait(ctx, meta, op).await?;

        let group = meta.api.get_security_group(ctx, &sg_id).await?;
        let rule = group
            .rules
            .unwrap_or_default()
            .into_iter()
            .rev()
            .find(|r| same_rule(r, &req))
            .ok_or_else(|| {
                ProviderError::Internal(format!(
                    "rule added to security group {} could not be located",
                    sg_id
                ))
            })?;
        d.set_id(rule.id);

        self.read(ctx, d, meta).await
    }

    async fn read(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let sg_id = required_string(d, "security_group_id")?;
        let Some(group) = found(meta.api.get_security_group(ctx, &sg_id).await)? else {
            gone(d, "Security group rule");
            return Ok(());
        };
        let Some(rule) = group
            .rules
            .unwrap_or_default()
            .into_iter()
            .find(|r| r.id == id)
        else {
            gone(d, "Security group rule");
            return Ok(());
        };

        let direction = match rule.flow_direction {
            FlowDirection::Ingress => "INGRESS",
            FlowDirection::Egress => "EGRESS",
        };
        d.set("type", direction);
        d.set("protocol", protocol_name(&rule.protocol));
        d.set("start_port", rule.start_port);
        d.set("end_port", rule.end_port);
        d.set("cidr", rule.network);
        d.set("user_security_group_id", rule.security_group.map(|r| r.id));
        d.set("icmp_type", rule.icmp.as_ref().and_then(|i| i.icmp_type));
        d.set("icmp_code", rule.icmp.as_ref().and_then(|i| i.code));
        d.set("description", rule.description);
        Ok(())
    }

    async fn update(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        self.read(ctx, d, meta).await
    }

    async fn delete(&self, ctx: &Context, d: &mut ResourceData, meta: &ProviderMeta) -> Result<()> {
        let id = require_id(d)?;
        let sg_id = required_string(d, "security_group_id")?;
        tracing::info!("Deleting security group rule: {}", id);
        delete_and_wait(
            ctx,
            meta,
            meta.api.delete_security_group_rule(ctx, &sg_id, &id).await,
        )
        .await
    }

    async fn import(&self, _ctx: &Context, id: &str, _meta: &ProviderMeta) -> Result<ResourceData> {
        let id = ImportId::parse(id)?;
        let sg_id = id.require_parent()?.to_string();
        let mut d = ResourceData::for_import(self.schema(), &id.id);
        d.set("security_group_id", sg_id);
        Ok(d)
    }
}

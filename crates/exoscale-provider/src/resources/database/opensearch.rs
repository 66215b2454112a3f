use super::{
    BlockChange, DatabaseKind, Remote, changed_settings, settings_attr, settings_json,
    version_attr,
};
use async_trait::async_trait;
use exoscale_api::types::{
    DbaasOpensearchRequest, DbaasRequestCommon, DbaasServiceType, OpensearchDashboards,
    OpensearchIndexPattern, OpensearchIndexTemplate, Operation,
};
use exoscale_api::{ApiError, Context};
use exoscale_provider_core::codec::{Block, block_of, json_value};
use exoscale_provider_core::schema::Attribute;
use exoscale_provider_core::{ProviderMeta, Result, Schema, Value, validation};

const BLOCK: &str = "opensearch";

pub(super) struct Opensearch;

fn index_patterns(block: &Block) -> Vec<OpensearchIndexPattern> {
    block
        .get("index_pattern")
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_map)
        .map(|m| Block(m.clone()))
        .filter_map(|p| {
            Some(OpensearchIndexPattern {
                pattern: p.non_empty_str("pattern")?,
                max_index_count: p.int("max_index_count"),
                sorting_algorithm: p.non_empty_str("sorting_algorithm"),
            })
        })
        .collect()
}

fn index_patterns_value(patterns: Vec<OpensearchIndexPattern>) -> Value {
    if patterns.is_empty() {
        return Value::Null;
    }
    Value::set(patterns.into_iter().map(|p| {
        Value::Map(
            Block::new()
                .with("pattern", p.pattern)
                .with("max_index_count", p.max_index_count)
                .with("sorting_algorithm", p.sorting_algorithm)
                .0,
        )
    }))
}

fn index_template(block: &Block) -> Option<OpensearchIndexTemplate> {
    let t = block.get("index_template").and_then(block_of)?;
    Some(OpensearchIndexTemplate {
        mapping_nested_objects_limit: t.int("mapping_nested_objects_limit"),
        number_of_replicas: t.int("number_of_replicas"),
        number_of_shards: t.int("number_of_shards"),
    })
}

fn index_template_value(template: Option<OpensearchIndexTemplate>) -> Value {
    match template {
        Some(t) if t != OpensearchIndexTemplate::default() => Block::new()
            .with("mapping_nested_objects_limit", t.mapping_nested_objects_limit)
            .with("number_of_replicas", t.number_of_replicas)
            .with("number_of_shards", t.number_of_shards)
            .into_value(),
        _ => Value::Null,
    }
}

fn dashboards(block: &Block) -> Option<OpensearchDashboards> {
    let b = block.get("dashboards").and_then(block_of)?;
    Some(OpensearchDashboards {
        enabled: b.bool("enabled"),
        max_old_space_size: b.int("max_old_space_size"),
        request_timeout: b.int("request_timeout"),
    })
}

fn dashboards_value(dashboards: Option<OpensearchDashboards>) -> Value {
    match dashboards {
        Some(d) => Block::new()
            .with("enabled", d.enabled)
            .with("max_old_space_size", d.max_old_space_size)
            .with("request_timeout", d.request_timeout)
            .into_value(),
        None => Value::Null,
    }
}

#[async_trait]
impl DatabaseKind for Opensearch {
    fn service_type(&self) -> DbaasServiceType {
        DbaasServiceType::Opensearch
    }

    fn block(&self) -> Schema {
        let index_pattern = Schema::new()
            .attr(
                "pattern",
                Attribute::string()
                    .required()
                    .validate_with(validation::non_empty),
            )
            .attr(
                "max_index_count",
                Attribute::int()
                    .optional()
                    .validate_with(validation::int_at_least(0)),
            )
            .attr(
                "sorting_algorithm",
                Attribute::string()
                    .optional()
                    .validate_with(validation::one_of(&["alphabetical", "creation_date"])),
            );
        let index_template = Schema::new()
            .attr("mapping_nested_objects_limit", Attribute::int().optional())
            .attr("number_of_replicas", Attribute::int().optional())
            .attr("number_of_shards", Attribute::int().optional());
        let dashboards = Schema::new()
            .attr("enabled", Attribute::bool().optional().default(true))
            .attr("max_old_space_size", Attribute::int().optional())
            .attr("request_timeout", Attribute::int().optional());

        Schema::new()
            .attr("version", version_attr())
            .attr("settings", settings_attr())
            .attr("index_pattern", Attribute::block_set(index_pattern).optional())
            .attr("index_template", Attribute::block(index_template).optional())
            .attr("dashboards", Attribute::block(dashboards).optional())
            .attr("keep_index_refresh_interval", Attribute::bool().optional())
            .attr(
                "max_index_count",
                Attribute::int()
                    .optional()
                    .validate_with(validation::int_at_least(0)),
            )
    }

    fn settings(&self) -> &'static [(&'static str, &'static str)] {
        &[("settings", "opensearch")]
    }

    fn server_filled(&self) -> &'static [&'static str] {
        &[
            "version",
            "index_template",
            "dashboards",
            "keep_index_refresh_interval",
            "max_index_count",
        ]
    }

    async fn create(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
        common: DbaasRequestCommon,
        block: &Block,
    ) -> Result<Operation> {
        let patterns = index_patterns(block);
        let req = DbaasOpensearchRequest {
            common,
            version: block.non_empty_str("version"),
            opensearch_settings: settings_json(block, BLOCK, "settings")?,
            index_patterns: (!patterns.is_empty()).then_some(patterns),
            index_template: index_template(block),
            keep_index_refresh_interval: block.bool("keep_index_refresh_interval"),
            max_index_count: block.int("max_index_count"),
            opensearch_dashboards: dashboards(block),
        };
        Ok(meta.api.create_dbaas_service_opensearch(ctx, name, &req).await?)
    }

    async fn update(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
        common: DbaasRequestCommon,
        change: &BlockChange,
    ) -> Result<Option<Operation>> {
        let new = &change.new;
        let mut req = DbaasOpensearchRequest {
            common,
            opensearch_settings: changed_settings(change, BLOCK, "settings")?,
            ..Default::default()
        };
        if change.changed("version") {
            req.version = new.non_empty_str("version");
        }
        if change.changed("index_pattern") {
            req.index_patterns = Some(index_patterns(new));
        }
        if change.changed("index_template") {
            req.index_template = Some(index_template(new).unwrap_or_default());
        }
        if change.changed("dashboards") {
            req.opensearch_dashboards = Some(dashboards(new).unwrap_or_default());
        }
        if change.changed("keep_index_refresh_interval") {
            req.keep_index_refresh_interval = new.bool("keep_index_refresh_interval");
        }
        if change.changed("max_index_count") {
            req.max_index_count = new.int("max_index_count");
        }

        if req == DbaasOpensearchRequest::default() {
            return Ok(None);
        }
        Ok(Some(
            meta.api
                .update_dbaas_service_opensearch(ctx, name, &req)
                .await?,
        ))
    }

    async fn read(
        &self,
        ctx: &Context,
        meta: &ProviderMeta,
        name: &str,
    ) -> std::result::Result<Remote, ApiError> {
        let svc = meta.api.get_dbaas_service_opensearch(ctx, name).await?;
        let block = Block::new()
            .with("version", svc.common.version.clone())
            .with("settings", json_value(svc.opensearch_settings.as_ref()))
            .with(
                "index_pattern",
                index_patterns_value(svc.index_patterns.unwrap_or_default()),
            )
            .with("index_template", index_template_value(svc.index_template))
            .with("dashboards", dashboards_value(svc.opensearch_dashboards))
            .with("keep_index_refresh_interval", svc.keep_index_refresh_interval)
            .with("max_index_count", svc.max_index_count);
        Ok(Remote {
            common: svc.common,
            block,
        })
    }
}

//! Metrics and alerting tools for the Prometheus sub-agent.
//!
//! Thin wrappers over the Prometheus HTTP API: range and instant PromQL
//! queries, scrape-target listing, and metric metadata.

use genai::chat::{Tool, ToolCall};
use serde_json::json;

use super::{body_or_error, optional_str, require_str, ToolContext};

/// System prompt for the Prometheus sub-agent.
pub const PROMETHEUS_AGENT_INSTRUCTIONS: &str = "\
You are the metrics and alerting agent. You diagnose service health through
PromQL against Prometheus.

Approach:
1. If you are unsure a metric exists or what its labels mean, check
   `prom_metadata` first; guessing metric names wastes a query.
2. Use `prom_query_range` over the incident window to see the shape of a
   signal (spikes, cliffs, slow drift), and `prom_query_instant` for current
   values. Pick a step that yields at most a few hundred points.
3. Use `prom_list_targets` when missing or stale data suggests a scrape
   problem rather than a service problem.
4. The standard first pass for a service: request rate, error ratio, and
   latency quantiles, compared before and during the incident window.

Report concrete numbers with units and timestamps, and say whether each
signal is anomalous relative to the pre-incident baseline. Distinguish 'the
metric is bad' from 'the metric is absent'.";

/// Tool schemas for the Prometheus sub-agent.
pub fn define_tools() -> Vec<Tool> {
    vec![
        Tool::new("prom_query_range")
            .with_description(
                "Evaluate a PromQL expression over a time range. Returns the raw \
                 JSON matrix response.",
            )
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "PromQL expression" },
                    "start": { "type": "string", "description": "Range start, RFC3339 or Unix epoch" },
                    "end": { "type": "string", "description": "Range end, RFC3339 or Unix epoch" },
                    "step": { "type": "string", "description": "Resolution step, e.g. '30s' or '5m'" }
                },
                "required": ["query", "start", "end", "step"]
            })),
        Tool::new("prom_query_instant")
            .with_description(
                "Evaluate a PromQL expression at a single instant. Returns the raw \
                 JSON vector response.",
            )
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "PromQL expression" },
                    "time": { "type": "string", "description": "Evaluation time, RFC3339 or Unix epoch (default: now)" }
                },
                "required": ["query"]
            })),
        Tool::new("prom_list_targets")
            .with_description(
                "List Prometheus scrape targets and their health. Useful to rule \
                 out scrape failures when metrics are missing or stale.",
            )
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "state": {
                        "type": "string",
                        "description": "Filter by target state: 'active', 'dropped', or 'any'"
                    }
                }
            })),
        Tool::new("prom_metadata")
            .with_description(
                "Fetch metric metadata (type, help text). Without a metric name, \
                 lists metadata for all metrics.",
            )
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "metric": { "type": "string", "description": "Metric name to look up" }
                }
            })),
    ]
}

pub async fn query_range(call: &ToolCall, ctx: &ToolContext) -> String {
    let query = match require_str(call, "query") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let start = match require_str(call, "start") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let end = match require_str(call, "end") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let step = match require_str(call, "step") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let url = format!("{}/api/v1/query_range", ctx.endpoints.prom_base_url);
    body_or_error(
        ctx.http
            .get(&url)
            .query(&[("query", query), ("start", start), ("end", end), ("step", step)])
            .send()
            .await,
        "prom_query_range",
    )
    .await
}

pub async fn query_instant(call: &ToolCall, ctx: &ToolContext) -> String {
    let query = match require_str(call, "query") {
        Ok(q) => q,
        Err(e) => return e,
    };

    let url = format!("{}/api/v1/query", ctx.endpoints.prom_base_url);
    let mut params = vec![("query", query)];
    if let Some(time) = optional_str(call, "time") {
        params.push(("time", time));
    }
    body_or_error(
        ctx.http.get(&url).query(&params).send().await,
        "prom_query_instant",
    )
    .await
}

pub async fn list_targets(call: &ToolCall, ctx: &ToolContext) -> String {
    let url = format!("{}/api/v1/targets", ctx.endpoints.prom_base_url);
    let mut req = ctx.http.get(&url);
    if let Some(state) = optional_str(call, "state") {
        req = req.query(&[("state", state)]);
    }
    body_or_error(req.send().await, "prom_list_targets").await
}

pub async fn metadata(call: &ToolCall, ctx: &ToolContext) -> String {
    let url = format!("{}/api/v1/metadata", ctx.endpoints.prom_base_url);
    let mut req = ctx.http.get(&url);
    if let Some(metric) = optional_str(call, "metric") {
        req = req.query(&[("metric", metric)]);
    }
    body_or_error(req.send().await, "prom_metadata").await
}

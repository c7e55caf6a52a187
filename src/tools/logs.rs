//! Log-store tools for the log sub-agent.
//!
//! One tool: a Loki-compatible range query. Results come back as the raw
//! JSON response so the model sees stream labels and timestamps.

use genai::chat::{Tool, ToolCall};
use serde_json::json;

use super::{body_or_error, optional_str, require_str, ToolContext};

/// System prompt for the log sub-agent.
pub const LOG_AGENT_INSTRUCTIONS: &str = "\
You are the log agent. You investigate error logs with `log_query` against
the central log store (LogQL selectors and filters).

Approach:
1. Start from the service and time window in the task description. Query the
   narrowest stream selector that covers them, filtered to errors, e.g.
   `{service=\"checkout\"} |= \"ERROR\"`.
2. Widen the filter or the window only when a narrow query returns nothing.
3. Group what you find: distinct error signatures, their first and last
   occurrence, and rough frequency. Do not paste hundreds of raw lines.
4. Quote a small number of representative log lines verbatim, with
   timestamps, as evidence.

Report the signatures, their timing relative to the incident window, and
which hosts or instances they came from. If the store has no matching
streams at all, report that rather than guessing.";

/// Tool schemas for the log sub-agent.
pub fn define_tools() -> Vec<Tool> {
    vec![Tool::new("log_query")
        .with_description(
            "Run a LogQL range query against the central log store. Returns the \
             raw JSON response with matching streams and log lines.",
        )
        .with_schema(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "LogQL query, e.g. '{service=\"checkout\"} |= \"ERROR\"'"
                },
                "start": {
                    "type": "string",
                    "description": "Window start, RFC3339 or Unix epoch (default: 1h ago)"
                },
                "end": {
                    "type": "string",
                    "description": "Window end, RFC3339 or Unix epoch (default: now)"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of lines to return (default 100)"
                }
            },
            "required": ["query"]
        }))]
}

pub async fn query(call: &ToolCall, ctx: &ToolContext) -> String {
    let logql = match require_str(call, "query") {
        Ok(q) => q,
        Err(e) => return e,
    };

    let url = format!("{}/loki/api/v1/query_range", ctx.endpoints.log_base_url);
    let mut params: Vec<(&str, String)> = vec![("query", logql.to_string())];
    if let Some(start) = optional_str(call, "start") {
        params.push(("start", start.to_string()));
    }
    if let Some(end) = optional_str(call, "end") {
        params.push(("end", end.to_string()));
    }
    let limit = call
        .fn_arguments
        .get("limit")
        .and_then(|v| v.as_u64())
        .unwrap_or(100);
    params.push(("limit", limit.to_string()));

    body_or_error(
        ctx.http.get(&url).query(&params).send().await,
        "log_query",
    )
    .await
}

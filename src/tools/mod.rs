//! Domain tool modules for the four SRE sub-agents.
//!
//! Each module exports the sub-agent's instruction string, its
//! [`genai::chat::Tool`] schemas, and async dispatch functions. Tool results
//! are always returned as strings (JSON payload or `{"error": ...}`), never
//! as `Err` variants, so the model can observe failures and react.

pub mod logs;
pub mod mysql;
pub mod prometheus;
pub mod wiki;

use std::time::Duration;

use genai::chat::ToolCall;
use serde_json::json;

use crate::config::ToolEndpoints;
use crate::error::AgentError;
use mysql::SqlGuard;

/// Shared state for tool dispatch: one HTTP client, the service endpoints,
/// and the SQL statement guard.
pub struct ToolContext {
    pub http: reqwest::Client,
    pub endpoints: ToolEndpoints,
    pub sql_guard: SqlGuard,
}

impl ToolContext {
    pub fn new(endpoints: ToolEndpoints) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("sre-agent/0.1")
            .build()
            .map_err(|e| AgentError::ToolInit(format!("http client: {e}")))?;

        Ok(Self {
            http,
            sql_guard: SqlGuard::new(endpoints.sql_allow_writes)
                .map_err(|e| AgentError::ToolInit(format!("sql guard: {e}")))?,
            endpoints,
        })
    }
}

/// Dispatch a tool call to its implementation.
///
/// Routes on `call.fn_name`; tool names are globally unique across the four
/// domain modules. Unknown names yield a JSON error payload rather than an
/// `Err` so the model can correct itself.
pub async fn dispatch_tool_call(call: &ToolCall, ctx: &ToolContext) -> String {
    match call.fn_name.as_str() {
        "wiki_read_structure" => wiki::read_structure(call, ctx).await,
        "wiki_read_contents" => wiki::read_contents(call, ctx).await,
        "wiki_ask_question" => wiki::ask_question(call, ctx).await,
        "log_query" => logs::query(call, ctx).await,
        "prom_query_range" => prometheus::query_range(call, ctx).await,
        "prom_query_instant" => prometheus::query_instant(call, ctx).await,
        "prom_list_targets" => prometheus::list_targets(call, ctx).await,
        "prom_metadata" => prometheus::metadata(call, ctx).await,
        "mysql_execute" => mysql::execute(call, ctx).await,
        "mysql_search_objects" => mysql::search_objects(call, ctx).await,
        unknown => json!({"error": format!("Unknown tool: {}", unknown)}).to_string(),
    }
}

/// Extract a required string argument, or produce the JSON error payload.
pub(crate) fn require_str<'a>(call: &'a ToolCall, key: &str) -> Result<&'a str, String> {
    call.fn_arguments
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            json!({"error": format!("{}: missing or invalid '{}' argument", call.fn_name, key)})
                .to_string()
        })
}

/// Extract an optional string argument.
pub(crate) fn optional_str<'a>(call: &'a ToolCall, key: &str) -> Option<&'a str> {
    call.fn_arguments.get(key).and_then(|v| v.as_str())
}

/// Convert an HTTP response future outcome into the tool-result string
/// contract: response body on success, JSON error payload otherwise.
pub(crate) async fn body_or_error(
    resp: Result<reqwest::Response, reqwest::Error>,
    what: &str,
) -> String {
    match resp {
        Ok(r) => {
            let status = r.status();
            match r.text().await {
                Ok(body) if status.is_success() => body,
                Ok(body) => json!({
                    "error": format!("{what}: HTTP {status}"),
                    "body": body,
                })
                .to_string(),
                Err(e) => json!({"error": format!("{what}: failed to read body: {e}")})
                    .to_string(),
            }
        }
        Err(e) => json!({"error": format!("{what}: request failed: {e}")}).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolEndpoints;

    fn test_endpoints() -> ToolEndpoints {
        ToolEndpoints {
            wiki_base_url: "http://localhost:8090".to_string(),
            log_base_url: "http://localhost:3100".to_string(),
            prom_base_url: "http://localhost:9090".to_string(),
            sql_gateway_url: "http://localhost:8081".to_string(),
            sql_allow_writes: false,
        }
    }

    #[tokio::test]
    async fn unknown_tool_returns_json_error() {
        let ctx = ToolContext::new(test_endpoints()).unwrap();
        let call = ToolCall {
            call_id: "c1".to_string(),
            fn_name: "no_such_tool".to_string(),
            fn_arguments: json!({}),
        };

        let result = dispatch_tool_call(&call, &ctx).await;

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert!(parsed["error"].as_str().unwrap().contains("no_such_tool"));
    }

    #[test]
    fn tool_names_are_globally_unique() {
        let mut names: Vec<String> = Vec::new();
        for tool in wiki::define_tools()
            .into_iter()
            .chain(logs::define_tools())
            .chain(prometheus::define_tools())
            .chain(mysql::define_tools())
        {
            assert!(
                !names.contains(&tool.name),
                "duplicate tool name: {}",
                tool.name
            );
            names.push(tool.name);
        }
        assert_eq!(names.len(), 10);
    }
}

//! Orchestrator agent: construction and the delegation loop.
//!
//! [`build_sre_agent`] performs the linear start-up sequence: sub-agent
//! descriptors, composed instructions (the only fallible step before tool
//! setup), chat client, then the [`DeepAgent`] handle. The handle owns the
//! conversation loop: orchestrator text streams to stdout, `task` tool calls
//! fan out to sub-agents, and each sub-agent runs its own bounded
//! tool-calling loop with only its descriptor's tools.
//!
//! The two configured limits (`max_concurrent_research_units`,
//! `max_researcher_iterations`) are advisory: they are substituted into the
//! instruction text and nowhere else. The hard caps below exist so a
//! misbehaving model cannot loop forever.

use std::io::Write;
use std::time::Instant;

use futures::future::join_all;
use futures::StreamExt;
use genai::chat::{
    ChatMessage, ChatOptions, ChatRequest, ChatStreamEvent, Tool, ToolCall, ToolResponse,
};
use genai::Client;
use serde_json::json;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AgentError;
use crate::model::build_chat_client;
use crate::prompts::{compose_instructions, task_description_prefix};
use crate::subagent::{sre_sub_agents, SubAgentSpec};
use crate::tools::{dispatch_tool_call, ToolContext};

/// Hard cap on orchestrator turns per question.
const MAX_ORCHESTRATOR_TURNS: u64 = 20;

/// Hard cap on turns inside a single sub-agent delegation.
const MAX_SUBAGENT_TURNS: u64 = 12;

/// Name of the delegation tool exposed to the orchestrator model.
const TASK_TOOL_NAME: &str = "task";

/// The orchestrator agent. Opaque handle over the chat client, the composed
/// instructions, the sub-agent descriptors, and the tool context.
pub struct DeepAgent {
    client: Client,
    model: String,
    instructions: String,
    sub_agents: Vec<SubAgentSpec>,
    tool_ctx: ToolContext,
}

/// Build the SRE orchestrator agent from resolved configuration.
///
/// Construction order matters: instruction composition fails before any
/// model client exists, and the client itself cannot fail here (endpoint
/// problems surface on first use).
pub fn build_sre_agent(config: &AppConfig) -> Result<DeepAgent, AgentError> {
    let sub_agents = sre_sub_agents();

    let instructions = compose_instructions(
        config.max_concurrent_research_units,
        config.max_researcher_iterations,
    )?;

    let client = build_chat_client(&config.base_url, &config.api_key);
    let tool_ctx = ToolContext::new(config.endpoints.clone())?;

    Ok(DeepAgent {
        client,
        model: config.model.clone(),
        instructions,
        sub_agents,
        tool_ctx,
    })
}

impl DeepAgent {
    /// The composed top-level instruction string (system prompt).
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// The sub-agent descriptors, in delegation-priority order.
    pub fn sub_agents(&self) -> &[SubAgentSpec] {
        &self.sub_agents
    }

    /// Build the `task` delegation tool. The schema enumerates the sub-agent
    /// names and the description embeds their routing descriptions, so the
    /// model can pick a delegate without extra round trips.
    fn delegation_tool(&self) -> Tool {
        let names: Vec<&str> = self.sub_agents.iter().map(|s| s.name).collect();
        let roster = self
            .sub_agents
            .iter()
            .map(|s| format!("- {}: {}", s.name, s.description))
            .collect::<Vec<_>>()
            .join("\n");

        Tool::new(TASK_TOOL_NAME)
            .with_description(format!(
                "Delegate a self-contained investigation task to a sub-agent. \
                 The sub-agent sees only the task description. Available \
                 sub-agents:\n{roster}"
            ))
            .with_schema(json!({
                "type": "object",
                "properties": {
                    "subagent_type": {
                        "type": "string",
                        "enum": names,
                        "description": "Which sub-agent to delegate to"
                    },
                    "description": {
                        "type": "string",
                        "description": "Self-contained task description with all identifiers and time windows the sub-agent needs"
                    }
                },
                "required": ["subagent_type", "description"]
            }))
    }

    /// Run one investigation to completion.
    ///
    /// Streams orchestrator text to stdout as it arrives and returns the
    /// final assistant text. `task` calls issued in the same assistant turn
    /// run concurrently.
    pub async fn run(&self, question: &str) -> anyhow::Result<String> {
        let prefix = task_description_prefix(chrono::Local::now().date_naive())
            .map_err(AgentError::Prompt)?;

        let mut chat_req = ChatRequest::from_system(&self.instructions)
            .with_tools(vec![self.delegation_tool()])
            .append_message(ChatMessage::user(format!("{prefix}{question}")));

        let chat_options = ChatOptions::default()
            .with_capture_content(true)
            .with_capture_tool_calls(true);

        for turn in 1..=MAX_ORCHESTRATOR_TURNS {
            let stream_res = self
                .client
                .exec_chat_stream(&self.model, chat_req.clone(), Some(&chat_options))
                .await
                .map_err(|e| AgentError::LlmError(format!("orchestrator stream: {e}")))?;

            let mut stream = stream_res.stream;
            let mut captured_text: Option<String> = None;
            let mut captured_tool_calls: Vec<ToolCall> = Vec::new();

            while let Some(event) = stream.next().await {
                match event {
                    Ok(ChatStreamEvent::Chunk(chunk)) => {
                        print!("{}", chunk.content);
                        std::io::stdout().flush().ok();
                    }
                    Ok(ChatStreamEvent::End(end)) => {
                        if let Some(text) = end.captured_first_text() {
                            captured_text = Some(text.to_string());
                        }
                        if let Some(calls) = end.captured_tool_calls() {
                            captured_tool_calls = calls.into_iter().cloned().collect();
                        }
                    }
                    Ok(_) => {
                        // Start, ReasoningChunk, ToolCallChunk -- ignore.
                    }
                    Err(e) => {
                        eprintln!("\n[stream error] {e}");
                        // Continue -- the End event may still arrive.
                    }
                }
            }

            if captured_tool_calls.is_empty() {
                println!();
                // Text-only response is the final answer.
                if let Some(text) = captured_text {
                    return Ok(text);
                }
                // Neither text nor tool calls: re-prompt.
                tracing::warn!(turn, "Empty orchestrator response, re-prompting");
                continue;
            }

            println!();
            chat_req = chat_req.append_message(ChatMessage::from(captured_tool_calls.clone()));

            // Run all delegations from this turn concurrently. The advisory
            // parallelism limit lives in the instruction text; whatever the
            // model actually issued is honored here.
            let results = join_all(
                captured_tool_calls
                    .iter()
                    .map(|call| self.handle_task_call(call, turn)),
            )
            .await;

            for (call, result) in captured_tool_calls.iter().zip(results) {
                chat_req = chat_req.append_message(ToolResponse::new(call.call_id.clone(), result));
            }
        }

        Err(AgentError::TurnCapExceeded {
            max_turns: MAX_ORCHESTRATOR_TURNS,
        }
        .into())
    }

    /// Handle one `task` tool call: route to the named sub-agent and return
    /// its report. Failures come back as JSON error payloads (never `Err`)
    /// so the model can observe and correct.
    async fn handle_task_call(&self, call: &ToolCall, turn: u64) -> String {
        if call.fn_name != TASK_TOOL_NAME {
            return json!({"error": format!("Unknown tool: {}", call.fn_name)}).to_string();
        }

        let subagent_type = call
            .fn_arguments
            .get("subagent_type")
            .and_then(|v| v.as_str());
        let description = call.fn_arguments.get("description").and_then(|v| v.as_str());
        let (subagent_type, description) = match (subagent_type, description) {
            (Some(s), Some(d)) => (s, d),
            _ => {
                return json!({
                    "error": "task: 'subagent_type' and 'description' are both required"
                })
                .to_string();
            }
        };

        let Some(spec) = self.sub_agents.iter().find(|s| s.name == subagent_type) else {
            let known: Vec<&str> = self.sub_agents.iter().map(|s| s.name).collect();
            return json!({
                "error": format!("Unknown sub-agent: {subagent_type}"),
                "known_subagents": known,
            })
            .to_string();
        };

        let run_id = Uuid::new_v4();
        let start = Instant::now();
        eprintln!("[task] {} <- {:.80}", spec.name, description);
        tracing::info!(%run_id, subagent = spec.name, turn, "Delegation started");

        let outcome = self.run_sub_agent(spec, description).await;
        let elapsed = start.elapsed().as_secs_f64();

        match outcome {
            Ok(report) => {
                tracing::info!(%run_id, subagent = spec.name, elapsed, "Delegation completed");
                report
            }
            Err(e) => {
                tracing::warn!(%run_id, subagent = spec.name, elapsed, error = %e, "Delegation failed");
                json!({"error": format!("{}: {e}", spec.name)}).to_string()
            }
        }
    }

    /// Run one sub-agent to completion on a single task.
    ///
    /// The sub-agent's conversation is isolated: its own system prompt, only
    /// its descriptor's tools, and the task description as the sole user
    /// message. Its first text-only response is the report.
    async fn run_sub_agent(&self, spec: &SubAgentSpec, task: &str) -> Result<String, AgentError> {
        let mut chat_req = ChatRequest::from_system(spec.system_prompt)
            .with_tools(spec.tools.clone())
            .append_message(ChatMessage::user(task));

        for _turn in 1..=MAX_SUBAGENT_TURNS {
            let chat_res = self
                .client
                .exec_chat(&self.model, chat_req.clone(), None)
                .await
                .map_err(|e| AgentError::LlmError(format!("{}: {e}", spec.name)))?;

            let text = chat_res.first_text().map(str::to_string);
            let tool_calls: Vec<ToolCall> =
                chat_res.tool_calls().into_iter().cloned().collect();

            if tool_calls.is_empty() {
                return Ok(text.unwrap_or_else(|| "(sub-agent produced no output)".to_string()));
            }

            chat_req = chat_req.append_message(ChatMessage::from(tool_calls.clone()));

            for call in &tool_calls {
                eprintln!("[{}] {}", spec.name, call.fn_name);
                let result = dispatch_tool_call(call, &self.tool_ctx).await;
                chat_req =
                    chat_req.append_message(ToolResponse::new(call.call_id.clone(), result));
            }
        }

        Err(AgentError::TurnCapExceeded {
            max_turns: MAX_SUBAGENT_TURNS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, ToolEndpoints};

    fn test_config() -> AppConfig {
        AppConfig {
            model: "gpt-5.2".to_string(),
            base_url: String::new(),
            api_key: String::new(),
            max_concurrent_research_units: 3,
            max_researcher_iterations: 3,
            endpoints: ToolEndpoints {
                wiki_base_url: "http://localhost:8090".to_string(),
                log_base_url: "http://localhost:3100".to_string(),
                prom_base_url: "http://localhost:9090".to_string(),
                sql_gateway_url: "http://localhost:8081".to_string(),
                sql_allow_writes: false,
            },
        }
    }

    #[test]
    fn agent_builds_without_network_access() {
        // Empty endpoint values are fine at construction; failures are
        // deferred to first use.
        let agent = build_sre_agent(&test_config()).unwrap();
        assert_eq!(agent.sub_agents().len(), 4);
    }

    #[test]
    fn instructions_carry_the_configured_limits() {
        let mut config = test_config();
        config.max_concurrent_research_units = 5;
        config.max_researcher_iterations = 2;

        let agent = build_sre_agent(&config).unwrap();

        assert!(agent.instructions().contains("at most 5 sub-agent tasks"));
        assert!(agent.instructions().contains("at most 2 rounds of delegation"));
    }

    #[test]
    fn delegation_tool_enumerates_all_sub_agents() {
        let agent = build_sre_agent(&test_config()).unwrap();
        let tool = agent.delegation_tool();

        assert_eq!(tool.name, TASK_TOOL_NAME);

        let schema = tool.schema.expect("task tool has a schema");
        let names: Vec<&str> = schema["properties"]["subagent_type"]["enum"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            ["wiki-agent", "log-agent", "prometheus-agent", "mysql-agent"]
        );

        let description = tool.description.expect("task tool has a description");
        for name in ["wiki-agent", "log-agent", "prometheus-agent", "mysql-agent"] {
            assert!(description.contains(name));
        }
    }

    #[tokio::test]
    async fn task_call_for_unknown_sub_agent_returns_json_error() {
        let agent = build_sre_agent(&test_config()).unwrap();
        let call = ToolCall {
            call_id: "c1".to_string(),
            fn_name: TASK_TOOL_NAME.to_string(),
            fn_arguments: json!({
                "subagent_type": "kafka-agent",
                "description": "check consumer lag"
            }),
        };

        let result = agent.handle_task_call(&call, 1).await;

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert!(parsed["error"].as_str().unwrap().contains("kafka-agent"));
        assert_eq!(parsed["known_subagents"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn task_call_with_missing_arguments_returns_json_error() {
        let agent = build_sre_agent(&test_config()).unwrap();
        let call = ToolCall {
            call_id: "c1".to_string(),
            fn_name: TASK_TOOL_NAME.to_string(),
            fn_arguments: json!({ "subagent_type": "log-agent" }),
        };

        let result = agent.handle_task_call(&call, 1).await;

        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert!(parsed["error"].as_str().unwrap().contains("description"));
    }
}

//! Sub-agent descriptors.
//!
//! Each descriptor pairs a routing name and description (read by the
//! orchestrator when deciding delegation) with the sub-agent's system prompt
//! and its allowed tools. The four descriptors share one plain record type;
//! the orchestrator consumes them uniformly. Built once at start-up and
//! never mutated.

use genai::chat::Tool;

use crate::tools::{logs, mysql, prometheus, wiki};

/// A named delegate with a restricted tool set.
#[derive(Debug, Clone)]
pub struct SubAgentSpec {
    /// Unique identifier, referenced by the orchestrator's `task` tool.
    pub name: &'static str,
    /// What this sub-agent is for, written for the orchestrator's routing
    /// judgment rather than for the end user.
    pub description: &'static str,
    /// Injected verbatim as the sub-agent's system prompt.
    pub system_prompt: &'static str,
    /// Tools the sub-agent may call. Nothing outside this list is exposed
    /// to it.
    pub tools: Vec<Tool>,
}

/// Build the four SRE sub-agent descriptors, in delegation-priority order.
///
/// No validation beyond construction: name conflicts or malformed tool
/// schemas surface downstream, not here.
pub fn sre_sub_agents() -> Vec<SubAgentSpec> {
    vec![
        SubAgentSpec {
            name: "wiki-agent",
            description: "Knowledge-base agent for the project wiki. For system \
                faults and incidents, consult this agent first to analyze the \
                problem at the architecture level and shape the rest of the \
                investigation plan.",
            system_prompt: wiki::WIKI_AGENT_INSTRUCTIONS,
            tools: wiki::define_tools(),
        },
        SubAgentSpec {
            name: "log-agent",
            description: "Log agent for the project's central log store. Use it \
                whenever error logs need to be searched or triaged.",
            system_prompt: logs::LOG_AGENT_INSTRUCTIONS,
            tools: logs::define_tools(),
        },
        SubAgentSpec {
            name: "prometheus-agent",
            description: "Metrics and alerting agent. Runs PromQL queries and \
                health diagnostics against Prometheus.",
            system_prompt: prometheus::PROMETHEUS_AGENT_INSTRUCTIONS,
            tools: prometheus::define_tools(),
        },
        SubAgentSpec {
            name: "mysql-agent",
            description: "Database agent. Executes SQL queries and searches \
                database objects through the SQL gateway.",
            system_prompt: mysql::MYSQL_AGENT_INSTRUCTIONS,
            tools: mysql::define_tools(),
        },
    ]
}

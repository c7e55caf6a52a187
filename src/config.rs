//! Runtime configuration resolved from CLI arguments and the environment.
//!
//! Precedence: CLI > environment > defaults. There is no config file; local
//! development overrides live in `.env.dev` (see [`crate::env`]), which must
//! be loaded before [`load_config`] runs.

use crate::cli::{Cli, Commands};

/// Default chat model identifier on the OpenAI-compatible endpoint.
pub const DEFAULT_MODEL: &str = "gpt-5.2";

/// Default advisory limit on parallel sub-agent delegations.
pub const DEFAULT_MAX_CONCURRENT_RESEARCH_UNITS: usize = 3;

/// Default advisory limit on delegation rounds per investigation.
pub const DEFAULT_MAX_RESEARCHER_ITERATIONS: usize = 3;

/// Base URLs for the services the domain tools talk to.
#[derive(Debug, Clone)]
pub struct ToolEndpoints {
    /// Knowledge-base (wiki) service.
    pub wiki_base_url: String,
    /// Log store (Loki-compatible query API).
    pub log_base_url: String,
    /// Prometheus HTTP API.
    pub prom_base_url: String,
    /// HTTP SQL gateway in front of MySQL.
    pub sql_gateway_url: String,
    /// Allow non-read-only SQL through the gateway.
    pub sql_allow_writes: bool,
}

/// Fully-resolved runtime configuration. All fields have values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    /// OpenAI-compatible endpoint; empty means "unset" and fails at first use.
    pub base_url: String,
    /// API key for the endpoint; empty means "unset" and fails at first use.
    pub api_key: String,
    pub max_concurrent_research_units: usize,
    pub max_researcher_iterations: usize,
    pub endpoints: ToolEndpoints,
}

/// Resolve configuration from CLI arguments and the environment.
///
/// Missing environment variables are not an error: the model endpoint fields
/// stay empty and fail lazily on first use, and tool endpoints fall back to
/// the usual localhost ports.
pub fn load_config(cli: &Cli) -> AppConfig {
    let Commands::Run {
        model,
        max_concurrent_research_units,
        max_researcher_iterations,
        ..
    } = &cli.command;

    AppConfig {
        model: model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        base_url: env_or_empty("OPENAI_COMPAT_BASE_URL"),
        api_key: env_or_empty("OPENAI_COMPAT_API_KEY"),
        max_concurrent_research_units: max_concurrent_research_units
            .unwrap_or(DEFAULT_MAX_CONCURRENT_RESEARCH_UNITS),
        max_researcher_iterations: max_researcher_iterations
            .unwrap_or(DEFAULT_MAX_RESEARCHER_ITERATIONS),
        endpoints: ToolEndpoints {
            wiki_base_url: env_or("WIKI_BASE_URL", "http://localhost:8090"),
            log_base_url: env_or("LOKI_BASE_URL", "http://localhost:3100"),
            prom_base_url: env_or("PROMETHEUS_BASE_URL", "http://localhost:9090"),
            sql_gateway_url: env_or("SQL_GATEWAY_URL", "http://localhost:8081"),
            sql_allow_writes: std::env::var("SQL_GATEWAY_ALLOW_WRITES")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        },
    }
}

fn env_or_empty(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};

    fn cli_with(
        model: Option<String>,
        units: Option<usize>,
        iterations: Option<usize>,
    ) -> Cli {
        Cli {
            command: Commands::Run {
                question: None,
                model,
                max_concurrent_research_units: units,
                max_researcher_iterations: iterations,
            },
        }
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load_config(&cli_with(None, None, None));

        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_concurrent_research_units, 3);
        assert_eq!(config.max_researcher_iterations, 3);
        assert_eq!(config.endpoints.prom_base_url, "http://localhost:9090");
        assert!(!config.endpoints.sql_allow_writes);
    }

    #[test]
    fn cli_overrides_win() {
        let config = load_config(&cli_with(Some("deepseek-chat".to_string()), Some(5), Some(2)));

        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.max_concurrent_research_units, 5);
        assert_eq!(config.max_researcher_iterations, 2);
    }
}

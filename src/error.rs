/// Errors related to instruction-template composition.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Template placeholder `{{{name}}}` has no supplied value")]
    UnfilledPlaceholder { name: String },

    #[error("Supplied value `{name}` matches no placeholder in the template")]
    UnknownValue { name: String },
}

/// Errors related to the orchestrator and sub-agent loops.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Instruction composition failed: {0}")]
    Prompt(#[from] PromptError),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Unknown sub-agent: `{name}`")]
    UnknownSubAgent { name: String },

    #[error("Tool setup error: {0}")]
    ToolInit(String),

    #[error("Orchestrator exceeded {max_turns} turns without a final answer")]
    TurnCapExceeded { max_turns: u64 },
}

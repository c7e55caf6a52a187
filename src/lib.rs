pub mod cli;
pub mod config;
pub mod env;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod prompts;
pub mod subagent;
pub mod tools;

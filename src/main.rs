mod cli;
mod config;
mod env;
mod error;
mod model;
mod orchestrator;
mod prompts;
mod subagent;
mod tools;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Environment must be loaded before config resolution reads it.
    env::load_env_file();

    let cli = cli::Cli::parse();
    let config = config::load_config(&cli);
    tracing::info!(model = %config.model, "SRE agent starting");

    let agent = orchestrator::build_sre_agent(&config)?;
    tracing::info!(
        sub_agents = agent.sub_agents().len(),
        max_concurrent_research_units = config.max_concurrent_research_units,
        max_researcher_iterations = config.max_researcher_iterations,
        "Orchestrator constructed"
    );

    let cli::Commands::Run { question, .. } = cli.command;

    match question {
        Some(q) => {
            agent.run(&q).await?;
        }
        None => {
            // Interactive: one investigation per stdin line.
            eprintln!("Enter an investigation request (Ctrl+D to exit):");
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Err(e) = agent.run(line).await {
                    eprintln!("[error] {e:#}");
                }
                eprintln!("\nEnter an investigation request (Ctrl+D to exit):");
            }
        }
    }

    Ok(())
}

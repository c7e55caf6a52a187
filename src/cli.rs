use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sre-agent", version, about = "SRE deep-investigation orchestrator agent")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the orchestrator agent
    Run {
        /// One-shot question; omit to read questions from stdin
        #[arg(short, long)]
        question: Option<String>,

        /// Chat model identifier on the OpenAI-compatible endpoint
        #[arg(short, long)]
        model: Option<String>,

        /// Advisory cap on parallel sub-agent delegations
        #[arg(long)]
        max_concurrent_research_units: Option<usize>,

        /// Advisory cap on delegation rounds per investigation
        #[arg(long)]
        max_researcher_iterations: Option<usize>,
    },
}

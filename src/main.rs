//! archive_qa CLI - main entry point

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use archive_qa::commands::{self, AskOptions};
use archive_qa::{metrics, BackendKind, ExtractionStrategy, Prompt, QueryProfile};
use tracing::warn;

#[derive(Parser)]
#[command(name = "archive_qa")]
#[command(about = "Questions over a historical document collection", long_about = None)]
#[command(version)]
struct Cli {
    /// Address to expose Prometheus metrics (e.g., 0.0.0.0:9898)
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone, Default)]
struct PipelineArgs {
    /// Constraint extraction: year | entities
    #[arg(long)]
    strategy: Option<ExtractionStrategy>,

    /// Query profile: catalog | analysis | extended
    #[arg(long)]
    profile: Option<QueryProfile>,

    /// Graph backend: local | remote
    #[arg(long)]
    backend: Option<BackendKind>,

    /// Prompt template: analysis | brief
    #[arg(long)]
    prompt: Option<Prompt>,
}

impl PipelineArgs {
    fn options(&self, json: bool) -> AskOptions {
        AskOptions {
            strategy: self.strategy,
            profile: self.profile,
            backend: self.backend,
            prompt: self.prompt,
            json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        /// Question in natural language
        question: String,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Print the full answer as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print suggested questions from the most frequent subjects
    Suggest {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Answer questions read line by line from stdin
    Repl {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ask { .. } => "ask",
            Commands::Suggest { .. } => "suggest",
            Commands::Repl { .. } => "repl",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for local development
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("archive_qa=info".parse()?))
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr.as_deref() {
        match addr.parse::<SocketAddr>() {
            Ok(socket) => metrics::spawn_metrics_server(socket),
            Err(err) => warn!(%addr, "Invalid metrics address: {}", err),
        }
    }

    let command_name = cli.command.name();
    metrics::record_command_start(command_name);
    let start = Instant::now();

    let result = execute_command(cli.command).await;

    metrics::record_command_result(command_name, start.elapsed(), result.is_ok());

    result
}

async fn execute_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Ask {
            question,
            pipeline,
            json,
        } => {
            commands::ask_run(&question, pipeline.options(json)).await?;
        }
        Commands::Suggest { pipeline } => {
            commands::suggest_run(pipeline.options(false)).await?;
        }
        Commands::Repl { pipeline } => {
            commands::repl_run(pipeline.options(false)).await?;
        }
    }

    Ok(())
}

//! Vector retrieval over a JSON-LD language dataset.
//!
//! Builds an embedding index from the dataset, saves it as JSON and
//! optionally answers a question from the retrieved entries.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use archive_qa::commands::{self, LanguageRagArgs};
use archive_qa::rag::DEFAULT_TOP_K;
use archive_qa::Config;

#[derive(Parser)]
#[command(name = "language_rag")]
#[command(about = "Retrieval-augmented answers over a language dataset")]
struct Cli {
    /// JSON-LD dataset to index (omit to reuse a saved index)
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Index file
    #[arg(long, default_value = "language_index.json")]
    index: PathBuf,

    /// Question to answer after indexing
    #[arg(long)]
    query: Option<String>,

    /// Entries retrieved per question
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Use the local hashing embedder even when HF_API_TOKEN is set
    #[arg(long, default_value_t = false)]
    local: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("archive_qa=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config::new();

    commands::language_rag_run(
        LanguageRagArgs {
            dataset: cli.dataset,
            index_path: cli.index,
            query: cli.query,
            top_k: cli.top_k,
            local: cli.local,
        },
        &config,
    )
    .await
}

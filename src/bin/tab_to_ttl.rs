//! Convert a tab-separated catalogue export into a Turtle dataset.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use archive_qa::commands;

#[derive(Parser)]
#[command(name = "tab_to_ttl")]
#[command(about = "Tab-separated catalogue export to Turtle")]
struct Cli {
    /// Input .tab / .tsv file
    #[arg(default_value = "datos_abiertos.tab")]
    input: PathBuf,

    /// Output Turtle file
    #[arg(short, long, default_value = "dataset.ttl")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("archive_qa=info".parse()?))
        .init();

    let cli = Cli::parse();
    commands::convert_run(&cli.input, &cli.output)?;
    Ok(())
}

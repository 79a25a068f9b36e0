//! Single question from the command line.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::extract::ExtractionStrategy;
use crate::graph::{BackendKind, QueryProfile};
use crate::pipeline::{Answer, Orchestrator};
use crate::prompts::Prompt;

/// Per-invocation overrides on top of `config.yml`.
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    pub strategy: Option<ExtractionStrategy>,
    pub profile: Option<QueryProfile>,
    pub backend: Option<BackendKind>,
    pub prompt: Option<Prompt>,
    /// Print the answer as JSON instead of markdown
    pub json: bool,
}

impl AskOptions {
    pub fn apply(&self, config: &mut Config) {
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(profile) = self.profile {
            config.profile = profile;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(prompt) = self.prompt {
            config.prompt = prompt;
        }
    }
}

/// Markdown rendering used by `ask` and `repl`.
pub fn render_answer(answer: &Answer) -> String {
    let mut out = String::new();
    out.push_str("## Resumen\n\n");
    out.push_str(&answer.summary);
    out.push_str("\n\n## Respuesta\n\n");
    out.push_str(&answer.answer);
    out.push_str("\n\n");
    out.push_str(&answer.listing);
    if !answer.references.is_empty() {
        out.push_str("\n\n## Referencias\n\n");
        out.push_str(&answer.references);
    }
    out
}

/// Build an orchestrator from configuration plus overrides.
pub fn orchestrator(options: &AskOptions) -> Result<Orchestrator> {
    let mut config = Config::new();
    options.apply(&mut config);
    Orchestrator::from_config(&config).context("failed to initialise the question pipeline")
}

pub async fn run(question: &str, options: AskOptions) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        anyhow::bail!("question must not be empty");
    }

    let orchestrator = orchestrator(&options)?;
    info!(backend = %orchestrator.backend(), "Asking: {}", question);
    let answer = orchestrator.ask(question).await;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        println!("{}", render_answer(&answer));
    }
    Ok(())
}

//! Suggested follow-up questions.

use anyhow::Result;

use crate::commands::ask::{orchestrator, AskOptions};

/// Numbered list, one suggestion per line.
pub fn render_suggestions(suggestions: &[String]) -> String {
    suggestions
        .iter()
        .enumerate()
        .map(|(idx, s)| format!("{}. {}", idx + 1, s))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn run(options: AskOptions) -> Result<()> {
    let orchestrator = orchestrator(&options)?;
    let suggestions = orchestrator.suggested_questions().await;
    println!("{}", render_suggestions(&suggestions));
    Ok(())
}

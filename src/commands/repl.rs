//! Interactive question loop over stdin.

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::info;

use crate::commands::ask::{orchestrator, render_answer, AskOptions};
use crate::pipeline::Orchestrator;

const EXIT_WORDS: &[&str] = &["exit", "quit", "salir"];

/// Answer each non-blank line until EOF or an exit word. Returns the
/// number of questions answered.
pub async fn answer_lines<R: BufRead, W: Write>(
    orchestrator: &Orchestrator,
    reader: R,
    mut writer: W,
) -> Result<usize> {
    let mut answered = 0;
    write!(writer, "> ")?;
    writer.flush()?;

    for line in reader.lines() {
        let line = line?;
        let question = line.trim();
        if EXIT_WORDS.iter().any(|w| question.eq_ignore_ascii_case(w)) {
            break;
        }
        if !question.is_empty() {
            let answer = orchestrator.ask(question).await;
            writeln!(writer, "{}\n", render_answer(&answer))?;
            answered += 1;
        }
        write!(writer, "> ")?;
        writer.flush()?;
    }

    writeln!(writer)?;
    Ok(answered)
}

pub async fn run(options: AskOptions) -> Result<()> {
    let orchestrator = orchestrator(&options)?;
    let stdin = std::io::stdin();
    let answered = answer_lines(&orchestrator, stdin.lock(), std::io::stdout()).await?;
    let (query_stats, answer_stats) = orchestrator.cache_stats();
    info!(
        answered,
        query_cache_hit_rate = query_stats.hit_rate(),
        answer_cache_hit_rate = answer_stats.hit_rate(),
        "Session finished"
    );
    Ok(())
}

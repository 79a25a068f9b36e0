//! Prompt templates for the inference endpoint.
//!
//! Templates live in `prompts/` at the project root and can be edited
//! without rebuilding. A copy of each is compiled in and used when the file
//! cannot be found. Placeholders: `{question}` and `{context}`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;

use crate::{Error, Result};

const ANALYSIS: &str = include_str!("../prompts/analysis.md");
const BRIEF: &str = include_str!("../prompts/brief.md");
const LANGUAGE_RAG: &str = include_str!("../prompts/language_rag.md");

/// Available prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Prompt {
    /// Historian persona, instruction-tagged, structured three-part answer.
    #[default]
    Analysis,
    /// Question plus relevant information, no instruction tags.
    Brief,
    /// Retrieval-augmented answer over the language index.
    LanguageRag,
}

impl Prompt {
    /// Markdown file name under `prompts/`.
    pub fn filename(&self) -> &'static str {
        match self {
            Prompt::Analysis => "analysis.md",
            Prompt::Brief => "brief.md",
            Prompt::LanguageRag => "language_rag.md",
        }
    }

    /// Load the template from `prompts/`.
    pub fn load(&self) -> Result<String> {
        load_prompt(self.filename())
    }

    fn embedded(&self) -> &'static str {
        match self {
            Prompt::Analysis => ANALYSIS,
            Prompt::Brief => BRIEF,
            Prompt::LanguageRag => LANGUAGE_RAG,
        }
    }

    /// Template text, preferring the file on disk.
    pub fn template(&self) -> String {
        match self.load() {
            Ok(text) => text,
            Err(err) => {
                debug!("Using built-in prompt: {}", err);
                self.embedded().to_string()
            }
        }
    }

    /// Fill the template with a question and a context block.
    pub fn render(&self, question: &str, context: &str) -> String {
        fill(&self.template(), question, context)
    }

    /// Token budget used when the configuration does not set one.
    pub fn default_max_new_tokens(&self) -> u32 {
        match self {
            Prompt::Analysis => 600,
            Prompt::Brief => 250,
            Prompt::LanguageRag => 200,
        }
    }

    pub fn default_temperature(&self) -> Option<f32> {
        match self {
            Prompt::Brief => Some(0.3),
            _ => None,
        }
    }
}

impl FromStr for Prompt {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "analysis" => Ok(Prompt::Analysis),
            "brief" => Ok(Prompt::Brief),
            "language_rag" | "rag" => Ok(Prompt::LanguageRag),
            other => Err(Error::InvalidArgument(format!("unknown prompt: {other}"))),
        }
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.filename().trim_end_matches(".md");
        f.write_str(name)
    }
}

/// Single-pass placeholder substitution, so braces inside the question or
/// context are never re-expanded.
pub fn fill(template: &str, question: &str, context: &str) -> String {
    let mut out = String::with_capacity(template.len() + question.len() + context.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{question}") {
            out.push_str(question);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{context}") {
            out.push_str(context);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out.trim_end().to_string()
}

/// Load a prompt by file name.
pub fn load_prompt(filename: &str) -> Result<String> {
    let path = prompts_dir().join(filename);
    std::fs::read_to_string(&path).map_err(|e| {
        Error::InvalidArgument(format!("Failed to load prompt {}: {}", filename, e))
    })
}

/// Prompt directory, searched relative to the working directory.
pub fn prompts_dir() -> PathBuf {
    let candidates = [
        PathBuf::from("prompts"),
        PathBuf::from("../prompts"),
        PathBuf::from("../../prompts"),
    ];

    for path in candidates {
        if path.exists() {
            return path;
        }
    }

    PathBuf::from("prompts")
}

pub fn list_prompts() -> Vec<Prompt> {
    vec![Prompt::Analysis, Prompt::Brief, Prompt::LanguageRag]
}

//! Question answering over a historical document collection
//!
//! This library provides tools to:
//! - Repair mojibake in catalogue text
//! - Extract query constraints (year, entities, keywords) from questions
//! - Build parametrized SPARQL and run it against an in-process or remote graph
//! - Aggregate results into summaries, listings and generation context
//! - Synthesize answers with a hosted text-generation model
//! - Convert tabular catalogue exports to Turtle
//! - Retrieve from a JSON-LD language dataset with vector search

pub mod aggregate;
pub mod cache;
pub mod categories;
pub mod config;
pub mod document;
pub mod error;
pub mod etl;
pub mod extract;
pub mod graph;
pub mod integrations;
pub mod metrics;
pub mod pipeline;
pub mod prompts;
pub mod rag;
pub mod synthesizer;
pub mod text;

// Re-export common types
pub use config::Config;
pub use document::Document;
pub use error::{Error, Result};
pub use extract::{ConstraintExtractor, ConstraintSet, ExtractionStrategy};
pub use graph::{BackendKind, GraphBackend, QueryBuilder, QueryProfile, SparqlQuery};
pub use integrations::HuggingFaceClient;
pub use pipeline::{Answer, Orchestrator};
pub use prompts::{load_prompt, Prompt};
pub use text::TextNormalizer;

// Commands module uses re-exported types, so it must be declared after the re-exports
pub mod commands;

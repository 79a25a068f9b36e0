//! Question-answering orchestrator.
//!
//! extract constraints -> build query -> run it -> normalize and aggregate
//! -> synthesize an answer. Graph and inference failures never surface as
//! errors; they degrade to the empty-result and fixed error messages.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::aggregate::{context_block, grouped_listing, references, summarize};
use crate::cache::{CacheStats, TtlCache};
use crate::categories::load_categories;
use crate::config::Config;
use crate::document::Document;
use crate::extract::{ConstraintExtractor, ConstraintSet};
use crate::graph::{BackendKind, GraphBackend, LocalGraph, QueryBuilder, RemoteGraph};
use crate::integrations::{GenerationParams, HuggingFaceClient};
use crate::prompts::Prompt;
use crate::synthesizer::{fallback_message, AnswerSynthesizer};
use crate::text::TextNormalizer;
use crate::Result;

/// Shown instead of a generated answer when nothing matched.
pub const NO_RESULTS_HINT: &str = "No se encontraron resultados. Intente con otros términos.";

/// Returned when the subject query fails or finds nothing.
pub const FALLBACK_SUGGESTIONS: &[&str] = &["Documentos más recientes", "Documentos sin clasificar"];

/// Everything produced for one question.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub id: Uuid,
    pub question: String,
    #[serde(skip)]
    pub constraints: ConstraintSet,
    pub documents: Vec<Document>,
    pub summary: String,
    pub answer: String,
    pub listing: String,
    pub references: String,
    pub answered_at: DateTime<Utc>,
}

pub struct Orchestrator {
    extractor: ConstraintExtractor,
    builder: QueryBuilder,
    graph: GraphBackend,
    synthesizer: AnswerSynthesizer,
    normalizer: TextNormalizer,
    categories: Vec<String>,
    query_cache: TtlCache<Arc<Vec<Document>>>,
    answer_cache: TtlCache<String>,
}

impl Orchestrator {
    pub fn new(
        extractor: ConstraintExtractor,
        builder: QueryBuilder,
        graph: GraphBackend,
        synthesizer: AnswerSynthesizer,
        categories: Vec<String>,
    ) -> Self {
        Self {
            extractor,
            builder,
            graph,
            synthesizer,
            normalizer: TextNormalizer::default(),
            categories,
            query_cache: TtlCache::new("query", crate::cache::QUERY_CACHE_TTL_SECS),
            answer_cache: TtlCache::new("answer", crate::cache::ANSWER_CACHE_TTL_SECS),
        }
    }

    pub fn with_cache_ttls(mut self, query_ttl_secs: u64, answer_ttl_secs: u64) -> Self {
        self.query_cache = TtlCache::new("query", query_ttl_secs);
        self.answer_cache = TtlCache::new("answer", answer_ttl_secs);
        self
    }

    /// Wire everything from configuration. Fails only on construction
    /// problems such as an unreadable RDF file.
    pub fn from_config(config: &Config) -> Result<Self> {
        let graph = match config.backend {
            BackendKind::Local => GraphBackend::Local(LocalGraph::open_turtle(&config.rdf_file)?),
            BackendKind::Remote => GraphBackend::Remote(RemoteGraph::with_endpoint(
                config.sparql_endpoint(),
                config.timeout(),
            )?),
        };

        let client =
            HuggingFaceClient::with_url(&config.hf_api_token, &config.hf_api_url, config.timeout())?;
        let params = GenerationParams {
            max_new_tokens: config
                .max_new_tokens
                .unwrap_or_else(|| config.prompt.default_max_new_tokens()),
            temperature: config.temperature.or(config.prompt.default_temperature()),
        };
        let synthesizer =
            AnswerSynthesizer::new(client, &config.model, config.prompt).with_params(params);

        let categories = if config.categories.is_empty() {
            load_categories(&config.metadata_file)
        } else {
            config.categories.clone()
        };

        info!(
            backend = %config.backend,
            profile = %config.profile,
            strategy = %config.strategy,
            categories = categories.len(),
            "Orchestrator ready"
        );

        Ok(Self::new(
            ConstraintExtractor::for_strategy(config.strategy),
            QueryBuilder::new(config.profile),
            graph,
            synthesizer,
            categories,
        )
        .with_cache_ttls(config.query_cache_ttl_secs, config.answer_cache_ttl_secs))
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn backend(&self) -> BackendKind {
        self.graph.kind()
    }

    /// Lookup counts of the query and answer caches, in that order.
    pub fn cache_stats(&self) -> (CacheStats, CacheStats) {
        (self.query_cache.stats(), self.answer_cache.stats())
    }

    /// Answer one question.
    pub async fn ask(&self, question: &str) -> Answer {
        let id = Uuid::new_v4();
        let span = info_span!("ask", request_id = %id);
        self.ask_inner(id, question).instrument(span).await
    }

    async fn ask_inner(&self, id: Uuid, question: &str) -> Answer {
        let constraints = self.extractor.extract(question);
        let query = self.builder.build(&constraints);
        let documents = self.fetch_documents(&query).await;

        let label = constraints.label();
        let summary = summarize(&documents, label, &self.categories);
        let listing = grouped_listing(&documents, label);
        let references = references(&documents);

        let answer = if documents.is_empty() {
            NO_RESULTS_HINT.to_string()
        } else {
            let context = match self.synthesizer.prompt() {
                Prompt::Brief => summary.clone(),
                _ => context_block(&documents),
            };
            self.generate_answer(question, &context).await
        };

        info!(
            documents = documents.len(),
            filters = query.filter_count(),
            label = label.unwrap_or("-"),
            "Question answered"
        );

        Answer {
            id,
            question: question.to_string(),
            constraints,
            documents,
            summary,
            answer,
            listing,
            references,
            answered_at: Utc::now(),
        }
    }

    async fn fetch_documents(&self, query: &crate::graph::SparqlQuery) -> Vec<Document> {
        let key = query.render();
        if let Some(cached) = self.query_cache.get(&key) {
            return cached.as_ref().clone();
        }

        match self.graph.documents(query).await {
            Ok(raw) => {
                let docs: Vec<Document> =
                    raw.iter().map(|d| d.normalized(&self.normalizer)).collect();
                self.query_cache.insert(key, Arc::new(docs.clone()));
                docs
            }
            Err(err) => {
                warn!(backend = %self.graph.kind(), "Graph query failed: {}", err);
                Vec::new()
            }
        }
    }

    async fn generate_answer(&self, question: &str, context: &str) -> String {
        let prompt = self.synthesizer.build_prompt(question, context);
        if let Some(cached) = self.answer_cache.get(&prompt) {
            return cached;
        }
        match self.synthesizer.generate(&prompt).await {
            Ok(text) => {
                self.answer_cache.insert(prompt, text.clone());
                text
            }
            Err(err) => fallback_message(&err).to_string(),
        }
    }

    /// "Documentos sobre {subject}" for the most frequent subjects.
    pub async fn suggested_questions(&self) -> Vec<String> {
        let subjects = match self.graph.top_subjects().await {
            Ok(subjects) => subjects,
            Err(err) => {
                warn!("Subject query failed: {}", err);
                Vec::new()
            }
        };

        let suggestions: Vec<String> = subjects
            .iter()
            .map(|s| self.normalizer.clean(s))
            .filter(|s| !s.is_empty())
            .map(|s| format!("Documentos sobre {s}"))
            .collect();

        if suggestions.is_empty() {
            FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect()
        } else {
            suggestions
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionStrategy;
    use crate::graph::QueryProfile;
    use crate::synthesizer::GENERATION_ERROR;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::time::Duration;

    const SAMPLE: &str = r#"
@prefix dc: <http://purl.org/dc/elements/1.1/> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
<http://x/1> dc:title "InauguraciÃ³n del Teatro" ; dc:date "1906"^^xsd:gYear ;
    dc:creator "Courret" ; dc:subject "Historia de Lima" .
<http://x/2> dc:title "Plaza de Armas" ; dc:date "1906"^^xsd:gYear .
<http://x/3> dc:title "Muelle" ; dc:date "1910"^^xsd:gYear ; dc:subject "Callao" .
"#;

    fn orchestrator(server_url: &str, prompt: Prompt) -> Orchestrator {
        let client =
            HuggingFaceClient::with_url("hf_test", server_url, Duration::from_secs(5)).unwrap();
        Orchestrator::new(
            ConstraintExtractor::for_strategy(ExtractionStrategy::Year),
            QueryBuilder::new(QueryProfile::Catalog),
            GraphBackend::Local(LocalGraph::from_turtle_str(SAMPLE).unwrap()),
            AnswerSynthesizer::new(client, "test/model", prompt),
            vec!["Historia".to_string()],
        )
    }

    #[tokio::test]
    async fn ask_runs_the_full_pipeline() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/models/test/model");
            then.status(200)
                .json_body(json!([{ "generated_text": "[INST] x [/INST] Dos documentos de 1906." }]));
        });

        let answer = orchestrator(&server.base_url(), Prompt::Analysis)
            .ask("¿Qué documentos hay de 1906?")
            .await;

        assert_eq!(answer.documents.len(), 2);
        assert_eq!(
            answer.summary,
            "Se han encontrado 2 documentos correspondientes al año 1906. \
             En la categoría de Historia, se encontraron 1 documentos. \
             Además, hay 1 documentos sin una categoría específica."
        );
        assert_eq!(answer.answer, "Dos documentos de 1906.");
        assert!(answer.listing.starts_with("## Documentos detallados para el año 1906"));
        assert!(answer.listing.contains("- **Inauguración del Teatro** (1906) - Autor: Courret"));
        assert!(answer.references.contains("- Plaza de Armas (1906) - Sin tema"));
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn empty_result_skips_generation() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!([{ "generated_text": "never" }]));
        });

        let answer = orchestrator(&server.base_url(), Prompt::Analysis)
            .ask("¿Y en 1850?")
            .await;

        assert!(answer.documents.is_empty());
        assert_eq!(answer.summary, "No se encontraron documentos para el año 1850.");
        assert_eq!(answer.listing, "**No se encontraron documentos para el año 1850.**");
        assert_eq!(answer.answer, NO_RESULTS_HINT);
        mock.assert_calls(0);
    }

    #[tokio::test]
    async fn inference_failure_degrades_to_message() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST);
            then.status(500);
        });

        let answer = orchestrator(&server.base_url(), Prompt::Brief)
            .ask("documentos de 1910")
            .await;

        assert_eq!(answer.documents.len(), 1);
        assert_eq!(answer.answer, GENERATION_ERROR);
    }

    #[tokio::test]
    async fn repeated_question_uses_answer_cache() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!([{ "generated_text": "[/INST] ok" }]));
        });

        let qa = orchestrator(&server.base_url(), Prompt::Analysis);
        let first = qa.ask("documentos de 1910").await;
        let second = qa.ask("documentos de 1910").await;

        assert_eq!(first.answer, "ok");
        assert_eq!(second.answer, "ok");
        assert_ne!(first.id, second.id);
        mock.assert_calls(1);

        let (query_stats, answer_stats) = qa.cache_stats();
        assert_eq!(query_stats, CacheStats { hits: 1, misses: 1 });
        assert_eq!(answer_stats, CacheStats { hits: 1, misses: 1 });
    }

    #[tokio::test]
    async fn unreachable_remote_graph_reads_as_no_documents() {
        let server = MockServer::start_async().await;
        let client =
            HuggingFaceClient::with_url("", &server.base_url(), Duration::from_secs(1)).unwrap();
        let remote = RemoteGraph::with_endpoint(
            "http://127.0.0.1:9/repositories/IRA",
            Duration::from_millis(500),
        )
        .unwrap();
        let qa = Orchestrator::new(
            ConstraintExtractor::for_strategy(ExtractionStrategy::Year),
            QueryBuilder::default(),
            GraphBackend::Remote(remote),
            AnswerSynthesizer::new(client, "test/model", Prompt::Analysis),
            Vec::new(),
        );

        let answer = qa.ask("1906").await;
        assert!(answer.documents.is_empty());
        assert_eq!(answer.answer, NO_RESULTS_HINT);
        assert_eq!(
            qa.suggested_questions().await,
            vec!["Documentos más recientes", "Documentos sin clasificar"]
        );
    }

    #[tokio::test]
    async fn suggestions_from_top_subjects() {
        let qa = orchestrator("http://127.0.0.1:9", Prompt::Analysis);
        let suggestions = qa.suggested_questions().await;
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.contains(&"Documentos sobre Callao".to_string()));
        assert!(suggestions.contains(&"Documentos sobre Historia de Lima".to_string()));
    }
}

//! Vector index over language records with cosine retrieval.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::dataset::LanguageRecord;
use crate::integrations::HuggingFaceClient;
use crate::prompts::Prompt;
use crate::synthesizer::{fallback_message, AnswerSynthesizer};
use crate::{Error, Result};

pub const DEFAULT_TOP_K: usize = 4;
pub const LOCAL_EMBEDDING_DIM: usize = 256;
const EMBED_BATCH: usize = 64;

/// Which embedder produced the vectors; a saved index must be queried
/// with the same one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbedderSpec {
    HuggingFace { model: String },
    Local { dim: usize },
}

enum EmbedBackend {
    HuggingFace {
        client: HuggingFaceClient,
        model: String,
    },
    Local(LocalEmbedder),
}

impl EmbedBackend {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            EmbedBackend::HuggingFace { client, model } => {
                let mut vectors = Vec::with_capacity(texts.len());
                for batch in texts.chunks(EMBED_BATCH) {
                    vectors.extend(client.embed_batch(model, batch).await?);
                }
                Ok(vectors)
            }
            EmbedBackend::Local(local) => Ok(texts.iter().map(|t| local.embed(t)).collect()),
        }
    }

    fn spec(&self) -> EmbedderSpec {
        match self {
            EmbedBackend::HuggingFace { model, .. } => EmbedderSpec::HuggingFace {
                model: model.clone(),
            },
            EmbedBackend::Local(local) => EmbedderSpec::Local { dim: local.dim },
        }
    }
}

/// Deterministic token-hashing embedder for offline use.
#[derive(Debug, Clone)]
struct LocalEmbedder {
    dim: usize,
}

impl LocalEmbedder {
    fn new(dim: usize) -> Self {
        Self { dim: dim.max(8) }
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dim];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let idx = (fnv1a(&token.to_lowercase()) % self.dim as u64) as usize;
            vec[idx] += 1.0;
        }
        normalize(&mut vec);
        vec
    }
}

/// FNV-1a, stable across builds so saved local indexes stay valid.
fn fnv1a(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedText {
    text: String,
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    embedder: EmbedderSpec,
    built_at: DateTime<Utc>,
    entries: Vec<IndexedText>,
}

/// Retrieved text with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub text: String,
    pub score: f32,
}

pub struct LanguageIndex {
    backend: EmbedBackend,
    entries: Vec<IndexedText>,
    built_at: DateTime<Utc>,
}

impl LanguageIndex {
    /// Index backed by the feature-extraction endpoint.
    pub fn with_huggingface(client: HuggingFaceClient, model: impl Into<String>) -> Self {
        Self::with_backend(EmbedBackend::HuggingFace {
            client,
            model: model.into(),
        })
    }

    /// Index backed by the local hashing embedder.
    pub fn with_local(dim: usize) -> Self {
        Self::with_backend(EmbedBackend::Local(LocalEmbedder::new(dim)))
    }

    fn with_backend(backend: EmbedBackend) -> Self {
        Self {
            backend,
            entries: Vec::new(),
            built_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn embedder(&self) -> EmbedderSpec {
        self.backend.spec()
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Embed and append records. Returns the new index size.
    pub async fn add_records(&mut self, records: &[LanguageRecord]) -> Result<usize> {
        let texts: Vec<String> = records.iter().map(LanguageRecord::text).collect();
        if texts.is_empty() {
            return Ok(self.entries.len());
        }

        let embeddings = self.backend.embed(&texts).await?;
        for (text, embedding) in texts.into_iter().zip(embeddings) {
            self.entries.push(IndexedText { text, embedding });
        }
        self.built_at = Utc::now();
        info!(entries = self.entries.len(), "Language index updated");
        Ok(self.entries.len())
    }

    /// Top-`k` entries by cosine similarity, best first.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .backend
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let mut hits: Vec<Hit> = self
            .entries
            .iter()
            .map(|entry| Hit {
                text: entry.text.clone(),
                score: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        debug!(query, hits = hits.len(), "retrieved language entries");
        Ok(hits)
    }

    /// Stuff the top-`k` entries into the retrieval prompt and generate.
    pub async fn answer(&self, synthesizer: &AnswerSynthesizer, question: &str, k: usize) -> String {
        let hits = match self.retrieve(question, k).await {
            Ok(hits) => hits,
            Err(err) => {
                warn!("Retrieval failed: {}", err);
                Vec::new()
            }
        };
        let context = hits
            .iter()
            .map(|hit| hit.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = Prompt::LanguageRag.render(question, &context);
        match synthesizer.generate(&prompt).await {
            Ok(text) => text,
            Err(err) => fallback_message(&err).to_string(),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = IndexFile {
            embedder: self.backend.spec(),
            built_at: self.built_at,
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string(&file)?;
        std::fs::write(path.as_ref(), json)?;
        info!(path = %path.as_ref().display(), entries = self.entries.len(), "Saved language index");
        Ok(())
    }

    /// Load a saved index. A Hugging Face index needs a client to embed
    /// queries; a local one ignores `client`.
    pub fn load(path: impl AsRef<Path>, client: Option<HuggingFaceClient>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let file: IndexFile = serde_json::from_str(&json)?;

        let backend = match (&file.embedder, client) {
            (EmbedderSpec::Local { dim }, _) => EmbedBackend::Local(LocalEmbedder::new(*dim)),
            (EmbedderSpec::HuggingFace { model }, Some(client)) => EmbedBackend::HuggingFace {
                client,
                model: model.clone(),
            },
            (EmbedderSpec::HuggingFace { model }, None) => {
                return Err(Error::InvalidArgument(format!(
                    "index was built with {model}; an inference client is required"
                )))
            }
        };

        Ok(Self {
            backend,
            entries: file.entries,
            built_at: file.built_at,
        })
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (&x, &y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        vec.iter_mut().for_each(|v| *v /= norm);
    }
}

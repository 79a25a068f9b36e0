//! Build and query the language retrieval index.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::integrations::HuggingFaceClient;
use crate::prompts::Prompt;
use crate::rag::{load_languages, Hit, LanguageIndex, LOCAL_EMBEDDING_DIM};
use crate::synthesizer::AnswerSynthesizer;

#[derive(Debug, Clone)]
pub struct LanguageRagArgs {
    /// JSON-LD dataset to (re)index
    pub dataset: Option<PathBuf>,
    /// Where the index is saved and loaded from
    pub index_path: PathBuf,
    pub query: Option<String>,
    pub top_k: usize,
    /// Use the hashing embedder even when a token is configured
    pub local: bool,
}

fn client(config: &Config) -> Result<HuggingFaceClient> {
    Ok(HuggingFaceClient::with_url(
        &config.hf_api_token,
        &config.hf_api_url,
        config.timeout(),
    )?)
}

/// Empty index with the embedder picked from configuration.
pub fn new_index(config: &Config, force_local: bool) -> Result<LanguageIndex> {
    if force_local || config.hf_api_token.is_empty() {
        info!(dim = LOCAL_EMBEDDING_DIM, "Using local hashing embedder");
        return Ok(LanguageIndex::with_local(LOCAL_EMBEDDING_DIM));
    }
    info!(model = %config.embedding_model, "Using Hugging Face embeddings");
    Ok(LanguageIndex::with_huggingface(
        client(config)?,
        &config.embedding_model,
    ))
}

pub fn render_hits(hits: &[Hit]) -> String {
    if hits.is_empty() {
        return "Sin resultados.".to_string();
    }
    hits.iter()
        .enumerate()
        .map(|(idx, hit)| format!("{}. [{:.3}] {}", idx + 1, hit.score, hit.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn run(args: LanguageRagArgs, config: &Config) -> Result<()> {
    if args.dataset.is_none() && args.query.is_none() {
        println!("Nothing to do: pass --dataset <file> to build the index and/or --query <text>");
        return Ok(());
    }

    let index = match &args.dataset {
        Some(dataset) => {
            let records = load_languages(dataset)
                .with_context(|| format!("failed to read {}", dataset.display()))?;
            if records.is_empty() {
                warn!(path = %dataset.display(), "No languages found in dataset");
            }
            let mut index = new_index(config, args.local)?;
            index.add_records(&records).await?;
            index
                .save(&args.index_path)
                .with_context(|| format!("failed to save {}", args.index_path.display()))?;
            println!(
                "Indexed {} languages into {}",
                index.len(),
                args.index_path.display()
            );
            index
        }
        None => LanguageIndex::load(&args.index_path, Some(client(config)?))
            .with_context(|| format!("failed to load {}", args.index_path.display()))?,
    };

    if let Some(query) = args.query {
        let hits = index.retrieve(&query, args.top_k).await?;
        println!("\n=== Resultados para '{}' ===\n", query);
        println!("{}", render_hits(&hits));

        let synthesizer = AnswerSynthesizer::new(client(config)?, &config.model, Prompt::LanguageRag);
        let answer = index.answer(&synthesizer, &query, args.top_k).await;
        println!("\n=== Respuesta ===\n\n{}", answer);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::EmbedderSpec;

    #[test]
    fn token_less_config_uses_local_embedder() {
        let mut config = Config::default();
        config.hf_api_token = String::new();
        let index = new_index(&config, false).unwrap();
        assert_eq!(
            index.embedder(),
            EmbedderSpec::Local {
                dim: LOCAL_EMBEDDING_DIM
            }
        );

        config.hf_api_token = "hf_test".to_string();
        assert!(matches!(
            new_index(&config, false).unwrap().embedder(),
            EmbedderSpec::HuggingFace { .. }
        ));
        assert!(matches!(
            new_index(&config, true).unwrap().embedder(),
            EmbedderSpec::Local { .. }
        ));
    }

    #[test]
    fn hits_render_with_scores() {
        let hits = vec![Hit {
            text: "Lengua: Quechua, Glottocode: quec1387".to_string(),
            score: 0.91234,
        }];
        assert_eq!(
            render_hits(&hits),
            "1. [0.912] Lengua: Quechua, Glottocode: quec1387"
        );
        assert_eq!(render_hits(&[]), "Sin resultados.");
    }
}

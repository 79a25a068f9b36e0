//! Hugging Face Inference API client (text generation and feature extraction).

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{Error, Result};

pub const HF_API_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Generation parameters sent with every text-generation request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 600,
            temperature: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParams,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [String],
    options: EmbedOptions,
}

#[derive(Debug, Serialize)]
struct EmbedOptions {
    wait_for_model: bool,
}

/// Client for `{base}/models/{model}`.
#[derive(Debug, Clone)]
pub struct HuggingFaceClient {
    http: Client,
    api_token: Option<String>,
    base_url: String,
}

impl HuggingFaceClient {
    /// Client against the public endpoint. An empty token sends no
    /// `Authorization` header.
    pub fn new(api_token: &str, timeout: Duration) -> Result<Self> {
        Self::with_url(api_token, HF_API_URL, timeout)
    }

    pub fn with_url(api_token: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("archive_qa/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ConnectionError(format!("HTTP client error: {}", e)))?;

        let api_token = Some(api_token.trim().to_string()).filter(|t| !t.is_empty());
        if api_token.is_none() {
            warn!("HF_API_TOKEN is not set; requests are sent anonymously");
        }

        Ok(Self {
            http,
            api_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn has_token(&self) -> bool {
        self.api_token.is_some()
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }

    fn post(&self, model: &str) -> reqwest::RequestBuilder {
        let request = self.http.post(self.model_url(model));
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Raw `generated_text` for a prompt.
    ///
    /// Non-success statuses and transport failures are `Inference` /
    /// `ConnectionError`; a 2xx body without `generated_text` is a
    /// `SerializationError`.
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String> {
        let request = GenerateRequest {
            inputs: prompt,
            parameters: params,
        };

        let response = self.post(model).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Hugging Face error {}: {}",
                status, text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::SerializationError(format!("Invalid response: {}", e)))?;
        debug!(model, prompt_chars = prompt.chars().count(), "generation finished");

        generated_text(&body).ok_or_else(|| {
            Error::SerializationError("response has no generated_text".to_string())
        })
    }

    /// Sentence embeddings for a batch of texts.
    pub async fn embed_batch(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            inputs: texts,
            options: EmbedOptions {
                wait_for_model: true,
            },
        };

        let response = self.post(model).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Hugging Face error {}: {}",
                status, text
            )));
        }

        let vectors: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|e| Error::SerializationError(format!("Invalid embeddings: {}", e)))?;

        if vectors.len() != texts.len() {
            return Err(Error::SerializationError(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

/// `[{"generated_text": ...}]`, or a bare object of the same shape.
fn generated_text(body: &Value) -> Option<String> {
    let first = match body {
        Value::Array(items) => items.first()?,
        other => other,
    };
    first
        .get("generated_text")
        .and_then(Value::as_str)
        .map(str::to_string)
}

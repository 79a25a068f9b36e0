//! Answer synthesis through a hosted text-generation endpoint.

use tracing::warn;

use crate::integrations::{GenerationParams, HuggingFaceClient};
use crate::metrics;
use crate::prompts::Prompt;
use crate::{Error, Result};

/// Shown when the endpoint is unreachable or answers with an error status.
pub const GENERATION_ERROR: &str = "Error generando el resumen";
/// Shown when the endpoint answers 2xx without the expected payload.
pub const MALFORMED_RESPONSE: &str = "Error en la generación de respuesta.";

pub const INST_END: &str = "[/INST]";

pub struct AnswerSynthesizer {
    client: HuggingFaceClient,
    model: String,
    prompt: Prompt,
    params: GenerationParams,
}

impl AnswerSynthesizer {
    pub fn new(client: HuggingFaceClient, model: impl Into<String>, prompt: Prompt) -> Self {
        let params = GenerationParams {
            max_new_tokens: prompt.default_max_new_tokens(),
            temperature: prompt.default_temperature(),
        };
        Self {
            client,
            model: model.into(),
            prompt,
            params,
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn prompt(&self) -> Prompt {
        self.prompt
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_prompt(&self, question: &str, context: &str) -> String {
        self.prompt.render(question, context)
    }

    /// Continuation for an already rendered prompt.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let result = self
            .client
            .generate(&self.model, prompt, self.params)
            .await
            .map(|raw| extract_continuation(&raw, prompt));

        metrics::record_inference(match &result {
            Ok(_) => "ok",
            Err(Error::SerializationError(_)) => "malformed",
            Err(_) => "error",
        });
        result
    }

    /// Never fails: errors collapse into the fixed user-facing strings.
    pub async fn synthesize(&self, question: &str, context: &str) -> String {
        let prompt = self.build_prompt(question, context);
        match self.generate(&prompt).await {
            Ok(text) => text,
            Err(err) => fallback_message(&err).to_string(),
        }
    }
}

/// User-facing string for a failed generation.
pub fn fallback_message(err: &Error) -> &'static str {
    warn!("Answer generation failed: {}", err);
    match err {
        Error::SerializationError(_) => MALFORMED_RESPONSE,
        _ => GENERATION_ERROR,
    }
}

/// Strip the echoed prompt from a completion.
///
/// Instruction-tagged outputs keep only what follows the last `[/INST]`;
/// otherwise a leading copy of the prompt is removed.
pub fn extract_continuation(generated: &str, prompt: &str) -> String {
    if let Some(idx) = generated.rfind(INST_END) {
        return generated[idx + INST_END.len()..].trim().to_string();
    }
    generated
        .strip_prefix(prompt)
        .unwrap_or(generated)
        .trim()
        .to_string()
}

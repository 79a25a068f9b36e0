//! External integrations.
//!
//! - Hugging Face Inference API (text generation, feature extraction)

pub mod huggingface;

pub use huggingface::{GenerationParams, HuggingFaceClient};

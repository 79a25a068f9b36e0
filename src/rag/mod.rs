//! Retrieval-augmented answers over a JSON-LD language dataset.

pub mod dataset;
pub mod index;

pub use dataset::{load_languages, parse_languages, LanguageRecord};
pub use index::{EmbedderSpec, Hit, LanguageIndex, DEFAULT_TOP_K, LOCAL_EMBEDDING_DIM};

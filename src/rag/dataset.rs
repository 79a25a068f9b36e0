//! JSON-LD language dataset (Grambank-style export).

use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::{Error, Result};

pub const LANGUAGE_TYPE: &str = "http://purl.org/linguistics#Language";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const GLOTTOCODE: &str = "http://purl.org/linguistics#glottocode";

/// One language entry turned into an indexable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageRecord {
    pub label: String,
    pub glottocode: String,
}

impl LanguageRecord {
    pub fn text(&self) -> String {
        format!("Lengua: {}, Glottocode: {}", self.label, self.glottocode)
    }
}

/// First `@value` of an expanded JSON-LD property.
fn first_value<'a>(entry: &'a Value, property: &str) -> Option<&'a str> {
    entry
        .get(property)?
        .as_array()?
        .first()?
        .get("@value")?
        .as_str()
}

fn is_language(entry: &Value) -> bool {
    match entry.get("@type") {
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(LANGUAGE_TYPE)),
        Some(Value::String(t)) => t == LANGUAGE_TYPE,
        _ => false,
    }
}

/// Language records from a top-level JSON-LD array. Entries without a
/// label are skipped; a missing glottocode renders empty.
pub fn parse_languages(json: &str) -> Result<Vec<LanguageRecord>> {
    let data: Value = serde_json::from_str(json)?;
    let entries = data
        .as_array()
        .ok_or_else(|| Error::SerializationError("expected a JSON-LD array".to_string()))?;

    Ok(entries
        .iter()
        .filter(|entry| entry.is_object() && is_language(entry))
        .filter_map(|entry| {
            let label = first_value(entry, RDFS_LABEL).filter(|l| !l.is_empty())?;
            Some(LanguageRecord {
                label: label.to_string(),
                glottocode: first_value(entry, GLOTTOCODE).unwrap_or_default().to_string(),
            })
        })
        .collect())
}

pub fn load_languages(path: impl AsRef<Path>) -> Result<Vec<LanguageRecord>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let records = parse_languages(&json)?;
    info!(path = %path.display(), languages = records.len(), "Loaded language dataset");
    Ok(records)
}

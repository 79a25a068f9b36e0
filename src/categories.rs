//! Category vocabulary from a Dataverse dataset metadata export.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::aggregate::DEFAULT_CATEGORIES;
use crate::Result;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetMetadata {
    dataset_version: DatasetVersion,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetVersion {
    metadata_blocks: MetadataBlocks,
}

#[derive(Debug, Deserialize)]
struct MetadataBlocks {
    citation: CitationBlock,
}

#[derive(Debug, Deserialize)]
struct CitationBlock {
    #[serde(default)]
    fields: Vec<CitationField>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CitationField {
    type_name: String,
    #[serde(default)]
    value: serde_json::Value,
}

/// Keyword values from `datasetVersion.metadataBlocks.citation`.
pub fn parse_keywords(json: &str) -> Result<Vec<String>> {
    let metadata: DatasetMetadata = serde_json::from_str(json)?;
    let mut keywords = Vec::new();
    for field in metadata
        .dataset_version
        .metadata_blocks
        .citation
        .fields
        .iter()
        .filter(|f| f.type_name == "keyword")
    {
        let Some(entries) = field.value.as_array() else {
            continue;
        };
        for entry in entries {
            let keyword = entry
                .pointer("/keywordValue/value")
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(keyword) = keyword {
                if !keywords.iter().any(|k: &String| k == keyword) {
                    keywords.push(keyword.to_string());
                }
            }
        }
    }
    Ok(keywords)
}

pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// Load the vocabulary, falling back to the defaults when the file is
/// missing, unreadable or has no keywords.
pub fn load_categories(path: impl AsRef<Path>) -> Vec<String> {
    let path = path.as_ref();
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(err) => {
            warn!(path = %path.display(), "Metadata file unavailable: {}", err);
            return default_categories();
        }
    };

    match parse_keywords(&json) {
        Ok(keywords) if !keywords.is_empty() => {
            info!(count = keywords.len(), "Loaded category vocabulary");
            keywords
        }
        Ok(_) => {
            warn!(path = %path.display(), "Metadata has no keywords, using defaults");
            default_categories()
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid metadata: {}", err);
            default_categories()
        }
    }
}

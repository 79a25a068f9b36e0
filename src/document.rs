//! Catalogue record returned by a graph query.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::text::TextNormalizer;

pub const UNKNOWN_DATE: &str = "Fecha desconocida";
pub const UNKNOWN_CREATOR: &str = "Autor desconocido";
pub const NO_SUBJECT: &str = "Sin tema";

/// One bibliographic record. Only the title is guaranteed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Build from a solution row keyed by variable name. Rows without a
    /// title are skipped.
    pub fn from_row(row: &HashMap<String, String>) -> Option<Self> {
        let title = row.get("title").filter(|t| !t.trim().is_empty())?;
        let field = |name: &str| row.get(name).filter(|v| !v.is_empty()).cloned();
        Some(Self {
            title: title.clone(),
            date: field("date"),
            creator: field("creator"),
            subject: field("subject"),
            description: field("description"),
        })
    }

    /// Run every field through the normalizer. Fields that clean to an empty
    /// string become `None`.
    pub fn normalized(&self, normalizer: &TextNormalizer) -> Self {
        let clean = |value: &Option<String>| {
            value
                .as_deref()
                .map(|v| normalizer.clean(v))
                .filter(|v| !v.is_empty())
        };
        Self {
            title: normalizer.clean(&self.title),
            date: clean(&self.date),
            creator: clean(&self.creator),
            subject: clean(&self.subject),
            description: clean(&self.description),
        }
    }

    pub fn display_date(&self) -> &str {
        self.date.as_deref().unwrap_or(UNKNOWN_DATE)
    }

    pub fn display_creator(&self) -> &str {
        self.creator.as_deref().unwrap_or(UNKNOWN_CREATOR)
    }

    pub fn display_subject(&self) -> &str {
        self.subject.as_deref().unwrap_or(NO_SUBJECT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn from_row_requires_title() {
        assert!(Document::from_row(&row(&[("date", "1906")])).is_none());
        assert!(Document::from_row(&row(&[("title", "  ")])).is_none());

        let doc = Document::from_row(&row(&[("title", "Plaza de Armas"), ("date", "1906")]))
            .expect("document");
        assert_eq!(doc.title, "Plaza de Armas");
        assert_eq!(doc.date.as_deref(), Some("1906"));
        assert!(doc.creator.is_none());
    }

    #[test]
    fn display_fallbacks() {
        let doc = Document::new("Sin datos");
        assert_eq!(doc.display_date(), "Fecha desconocida");
        assert_eq!(doc.display_creator(), "Autor desconocido");
        assert_eq!(doc.display_subject(), "Sin tema");
    }

    #[test]
    fn normalized_repairs_every_field() {
        let doc = Document::new("InauguraciÃ³n")
            .with_creator("  PÃ©rez ")
            .with_subject("   ")
            .with_description("FotografÃ\u{AD}a");

        let clean = doc.normalized(&TextNormalizer::default());
        assert_eq!(clean.title, "Inauguración");
        assert_eq!(clean.creator.as_deref(), Some("Pérez"));
        assert!(clean.subject.is_none());
        assert_eq!(clean.description.as_deref(), Some("Fotografía"));
    }
}

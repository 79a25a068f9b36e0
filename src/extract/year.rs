use once_cell::sync::Lazy;
use regex::Regex;

use super::ConstraintSet;

static YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(1[89]\d{2}|20\d{2})\b").expect("valid year regex"));

/// First four-digit year in 1800-2099, if any.
pub fn extract_year(question: &str) -> Option<String> {
    YEAR_RE
        .find(question)
        .map(|m| m.as_str().to_string())
}

/// Year-only strategy: first match wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct YearExtractor;

impl YearExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, question: &str) -> ConstraintSet {
        ConstraintSet {
            year: extract_year(question),
            ..Default::default()
        }
    }
}

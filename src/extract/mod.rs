//! Query-constraint extraction from free-text questions.
//!
//! Two strategies are supported:
//! - [`YearExtractor`]: regex scan for a four-digit year (1800-2099)
//! - [`EntityExtractor`]: tagger-driven extraction of date / creator /
//!   subject constraints plus a keyword set for title matching
//!
//! The tagger itself sits behind the [`Tagger`] trait; [`HeuristicTagger`] is
//! the built-in rule-based implementation.

pub mod entities;
pub mod tagger;
pub mod year;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub use entities::EntityExtractor;
pub use tagger::{Annotations, EntityLabel, HeuristicTagger, PartOfSpeech, TaggedSpan, Tagger, Token};
pub use year::{extract_year, YearExtractor};

use crate::Error;

/// Structured filter values derived from a question.
///
/// Every field is independently optional; `None` means "no filter on this
/// field". Keywords are case-folded and deduplicated; the set is ordered only
/// so that the rendered query is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    pub year: Option<String>,
    pub date: Option<String>,
    pub creator: Option<String>,
    pub subject: Option<String>,
    pub keywords: BTreeSet<String>,
}

impl ConstraintSet {
    pub fn with_year(year: impl Into<String>) -> Self {
        Self {
            year: Some(year.into()),
            ..Default::default()
        }
    }

    /// True when no constraint at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.year.is_none()
            && self.date.is_none()
            && self.creator.is_none()
            && self.subject.is_none()
            && self.keywords.is_empty()
    }

    /// Year used in user-facing "for year X" messages. Free-form dates are
    /// not years and never label a summary.
    pub fn label(&self) -> Option<&str> {
        self.year.as_deref()
    }
}

/// Which extraction strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionStrategy {
    /// Regex year scan only
    #[default]
    Year,
    /// Tagger-based entities and keywords
    Entities,
}

impl FromStr for ExtractionStrategy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "year" | "regex" => Ok(ExtractionStrategy::Year),
            "entities" | "entity" | "ner" | "keywords" => Ok(ExtractionStrategy::Entities),
            other => Err(Error::InvalidArgument(format!(
                "unknown extraction strategy: {other}"
            ))),
        }
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionStrategy::Year => write!(f, "year"),
            ExtractionStrategy::Entities => write!(f, "entities"),
        }
    }
}

/// Extractor selected at construction time (enum dispatch).
pub enum ConstraintExtractor {
    Year(YearExtractor),
    Entities(EntityExtractor),
}

impl ConstraintExtractor {
    /// Build the extractor for a strategy, using the built-in tagger for
    /// the entity strategy.
    pub fn for_strategy(strategy: ExtractionStrategy) -> Self {
        match strategy {
            ExtractionStrategy::Year => ConstraintExtractor::Year(YearExtractor::new()),
            ExtractionStrategy::Entities => {
                ConstraintExtractor::Entities(EntityExtractor::new(Box::new(HeuristicTagger::new())))
            }
        }
    }

    pub fn strategy(&self) -> ExtractionStrategy {
        match self {
            ConstraintExtractor::Year(_) => ExtractionStrategy::Year,
            ConstraintExtractor::Entities(_) => ExtractionStrategy::Entities,
        }
    }

    pub fn extract(&self, question: &str) -> ConstraintSet {
        match self {
            ConstraintExtractor::Year(extractor) => extractor.extract(question),
            ConstraintExtractor::Entities(extractor) => extractor.extract(question),
        }
    }
}

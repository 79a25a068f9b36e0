use tracing::debug;

use super::tagger::{EntityLabel, PartOfSpeech, Tagger};
use super::ConstraintSet;

/// Entity-based strategy.
///
/// - DATE span -> `date`
/// - PERSON span -> `creator`
/// - LOC / GPE / ORG / MISC span -> `subject`
/// - keywords: case-folded entity texts plus lemmas of nouns and proper nouns
///
/// When several spans qualify for the same field the last one in scan order
/// is kept.
pub struct EntityExtractor {
    tagger: Box<dyn Tagger>,
}

impl EntityExtractor {
    pub fn new(tagger: Box<dyn Tagger>) -> Self {
        Self { tagger }
    }

    pub fn extract(&self, question: &str) -> ConstraintSet {
        let annotations = self.tagger.annotate(question);
        let mut set = ConstraintSet::default();

        for span in &annotations.entities {
            let text = span.text.trim();
            if text.is_empty() {
                continue;
            }
            match &span.label {
                EntityLabel::Date => set.date = Some(text.to_string()),
                EntityLabel::Person => set.creator = Some(text.to_string()),
                label if label.is_subject() => set.subject = Some(text.to_string()),
                _ => {}
            }
            set.keywords.insert(text.to_lowercase());
        }

        for token in &annotations.tokens {
            if matches!(token.pos, PartOfSpeech::Noun | PartOfSpeech::ProperNoun) {
                let lemma = token.lemma.trim().to_lowercase();
                if !lemma.is_empty() {
                    set.keywords.insert(lemma);
                }
            }
        }

        debug!(
            entities = annotations.entities.len(),
            keywords = set.keywords.len(),
            "extracted constraints"
        );
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tagger::{Annotations, HeuristicTagger, TaggedSpan, Token};

    /// Tagger returning canned annotations.
    struct FixedTagger(Annotations);

    impl Tagger for FixedTagger {
        fn annotate(&self, _text: &str) -> Annotations {
            self.0.clone()
        }
    }

    fn span(label: EntityLabel, text: &str) -> TaggedSpan {
        TaggedSpan {
            label,
            text: text.to_string(),
        }
    }

    fn token(lemma: &str, pos: PartOfSpeech) -> Token {
        Token {
            text: lemma.to_string(),
            lemma: lemma.to_string(),
            pos,
        }
    }

    #[test]
    fn maps_labels_to_fields() {
        let extractor = EntityExtractor::new(Box::new(FixedTagger(Annotations {
            entities: vec![
                span(EntityLabel::Date, "1906"),
                span(EntityLabel::Person, "Ricardo Palma"),
                span(EntityLabel::Gpe, "Lima"),
            ],
            tokens: vec![],
        })));

        let set = extractor.extract("ignored");
        assert_eq!(set.date.as_deref(), Some("1906"));
        assert_eq!(set.creator.as_deref(), Some("Ricardo Palma"));
        assert_eq!(set.subject.as_deref(), Some("Lima"));
        assert!(set.year.is_none());
    }

    #[test]
    fn last_span_wins_per_field() {
        let extractor = EntityExtractor::new(Box::new(FixedTagger(Annotations {
            entities: vec![
                span(EntityLabel::Loc, "Callao"),
                span(EntityLabel::Org, "Museo de Arte"),
                span(EntityLabel::Person, "A B"),
                span(EntityLabel::Person, "C D"),
            ],
            tokens: vec![],
        })));

        let set = extractor.extract("ignored");
        assert_eq!(set.subject.as_deref(), Some("Museo de Arte"));
        assert_eq!(set.creator.as_deref(), Some("C D"));
    }

    #[test]
    fn keywords_are_case_folded_and_deduplicated() {
        let extractor = EntityExtractor::new(Box::new(FixedTagger(Annotations {
            entities: vec![span(EntityLabel::Misc, "Lima")],
            tokens: vec![
                token("Lima", PartOfSpeech::ProperNoun),
                token("teatro", PartOfSpeech::Noun),
                token("teatro", PartOfSpeech::Noun),
                token("pasó", PartOfSpeech::Other),
            ],
        })));

        let set = extractor.extract("ignored");
        let keywords: Vec<&str> = set.keywords.iter().map(String::as_str).collect();
        assert_eq!(keywords, vec!["lima", "teatro"]);
    }

    #[test]
    fn unknown_labels_only_feed_keywords() {
        let extractor = EntityExtractor::new(Box::new(FixedTagger(Annotations {
            entities: vec![span(EntityLabel::Other("MONEY".into()), "cien soles")],
            tokens: vec![],
        })));

        let set = extractor.extract("ignored");
        assert!(set.subject.is_none());
        assert!(set.keywords.contains("cien soles"));
    }

    #[test]
    fn works_with_heuristic_tagger() {
        let extractor = EntityExtractor::new(Box::new(HeuristicTagger::new()));
        let set = extractor.extract("¿Qué fotografías de Manuel González Prada hay en Lima de 1906?");

        assert_eq!(set.creator.as_deref(), Some("Manuel González Prada"));
        assert_eq!(set.subject.as_deref(), Some("Lima"));
        assert_eq!(set.date.as_deref(), Some("1906"));
        assert!(set.keywords.contains("fotografía"));
        assert!(set.keywords.contains("manuel gonzález prada"));
        assert!(set.keywords.contains("prada"));
    }

    #[test]
    fn question_without_entities() {
        let extractor = EntityExtractor::new(Box::new(HeuristicTagger::new()));
        let set = extractor.extract("¿Qué hay?");
        assert!(set.is_empty());
    }
}

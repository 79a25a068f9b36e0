//! Tagger boundary and the built-in rule-based Spanish tagger.

use std::collections::HashSet;

/// Entity label attached to a span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityLabel {
    Date,
    Person,
    Loc,
    Gpe,
    Org,
    Misc,
    Other(String),
}

impl EntityLabel {
    /// Map a tagger label string (DATE, PER, PERSON, LOC, ...) to a label.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "DATE" => EntityLabel::Date,
            "PER" | "PERSON" => EntityLabel::Person,
            "LOC" => EntityLabel::Loc,
            "GPE" => EntityLabel::Gpe,
            "ORG" => EntityLabel::Org,
            "MISC" => EntityLabel::Misc,
            other => EntityLabel::Other(other.to_string()),
        }
    }

    /// Labels that become the `subject` constraint.
    pub fn is_subject(&self) -> bool {
        matches!(
            self,
            EntityLabel::Loc | EntityLabel::Gpe | EntityLabel::Org | EntityLabel::Misc
        )
    }
}

/// Coarse part-of-speech tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    Noun,
    ProperNoun,
    Other,
}

/// Labelled entity span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedSpan {
    pub label: EntityLabel,
    pub text: String,
}

/// Tagged token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub lemma: String,
    pub pos: PartOfSpeech,
}

/// Tagger output: entities and tokens, in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    pub entities: Vec<TaggedSpan>,
    pub tokens: Vec<Token>,
}

/// Stateless text annotator.
pub trait Tagger: Send + Sync {
    fn annotate(&self, text: &str) -> Annotations;
}

const STOPWORDS: &[&str] = &[
    "de", "del", "la", "las", "el", "los", "lo", "un", "una", "unos", "unas", "y", "e", "o", "u",
    "en", "a", "al", "con", "por", "para", "sobre", "entre", "sin", "desde", "hasta", "hacia",
    "que", "qué", "cual", "cuál", "cuales", "cuáles", "quien", "quién", "quienes", "quiénes",
    "donde", "dónde", "cuando", "cuándo", "como", "cómo", "cuanto", "cuánto", "cuántos",
    "cuántas", "hay", "son", "es", "fue", "fueron", "era", "eran", "hubo", "tiene", "tienen",
    "existe", "existen", "muestra", "muestran", "habla", "hablan", "está", "están", "me", "mi",
    "se", "su", "sus", "le", "les", "este", "esta", "estos", "estas", "ese", "esa", "esos",
    "esas", "más", "muy", "todo", "todos", "todas", "algún", "alguna", "algunos", "algunas",
    "dame", "muéstrame", "busca", "buscar",
];

/// Lower-case connectors allowed inside a multi-word proper name.
const NAME_CONNECTORS: &[&str] = &["de", "del", "la", "las", "los", "y"];

/// Prepositions that mark the following name as a place.
const PLACE_PREPOSITIONS: &[&str] = &["en", "desde", "hacia"];

const ORG_HEADS: &[&str] = &[
    "instituto",
    "universidad",
    "municipalidad",
    "biblioteca",
    "museo",
    "colegio",
    "banco",
    "compañía",
    "sociedad",
    "club",
    "ministerio",
    "congreso",
];

const MONTHS: &[&str] = &[
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "setiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Rule-based Spanish tagger (no network calls, no model files).
///
/// - DATE: a year in 1800-2099, or a month name with optional
///   "<day> de" prefix and "de <year>" suffix
/// - PERSON: two or more capitalized words (lower-case connectors allowed)
/// - LOC: a capitalized name right after "en" / "desde" / "hacia"
/// - ORG: a capitalized name headed by an institution noun
/// - MISC: any other single capitalized word
/// - NOUN: remaining non-stopword alphabetic tokens of three or more letters
#[derive(Debug, Clone)]
pub struct HeuristicTagger {
    stopwords: HashSet<String>,
}

impl Default for HeuristicTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicTagger {
    pub fn new() -> Self {
        let stopwords = STOPWORDS.iter().map(|w| w.to_string()).collect();
        Self { stopwords }
    }

    fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(&word.to_lowercase())
    }

    fn starts_name(&self, word: &str) -> bool {
        is_capitalized(word) && !self.is_stopword(word) && !is_month(word)
    }
}

impl Tagger for HeuristicTagger {
    fn annotate(&self, text: &str) -> Annotations {
        let words: Vec<String> = text
            .split_whitespace()
            .map(clean_word)
            .filter(|w| !w.is_empty())
            .collect();

        let mut annotations = Annotations::default();
        let mut i = 0;

        while i < words.len() {
            let word = &words[i];

            if is_month(word) {
                let (start, end) = date_bounds(&words, i);
                annotations.entities.push(TaggedSpan {
                    label: EntityLabel::Date,
                    text: words[start..end].join(" "),
                });
                i = end;
                continue;
            }

            if is_year(word) {
                annotations.entities.push(TaggedSpan {
                    label: EntityLabel::Date,
                    text: word.clone(),
                });
                i += 1;
                continue;
            }

            // A capitalized first word is only a name when another name word follows.
            let next_is_name = words.get(i + 1).is_some_and(|w| self.starts_name(w));
            if self.starts_name(word) && (i > 0 || next_is_name) {
                let end = name_end(&words, i, |w| self.starts_name(w));
                let span = &words[i..end];

                let previous = if i > 0 {
                    Some(words[i - 1].to_lowercase())
                } else {
                    None
                };
                let label = if previous
                    .as_deref()
                    .is_some_and(|p| PLACE_PREPOSITIONS.contains(&p))
                {
                    EntityLabel::Loc
                } else if ORG_HEADS.contains(&span[0].to_lowercase().as_str()) {
                    EntityLabel::Org
                } else if span.len() >= 2 {
                    EntityLabel::Person
                } else {
                    EntityLabel::Misc
                };

                annotations.entities.push(TaggedSpan {
                    label,
                    text: span.join(" "),
                });
                for part in span.iter().filter(|w| is_capitalized(w)) {
                    annotations.tokens.push(Token {
                        text: part.clone(),
                        lemma: part.to_lowercase(),
                        pos: PartOfSpeech::ProperNoun,
                    });
                }
                i = end;
                continue;
            }

            let pos = if !self.is_stopword(word)
                && word.chars().all(|c| c.is_alphabetic() || c == '-')
                && word.chars().count() >= 3
            {
                PartOfSpeech::Noun
            } else {
                PartOfSpeech::Other
            };
            annotations.tokens.push(Token {
                text: word.clone(),
                lemma: lemmatize(&word.to_lowercase()),
                pos,
            });
            i += 1;
        }

        annotations
    }
}

/// End index (exclusive) of a proper-name run starting at `start`.
fn name_end(words: &[String], start: usize, is_name: impl Fn(&str) -> bool) -> usize {
    let mut end = start + 1;
    while end < words.len() {
        if is_name(words[end].as_str()) {
            end += 1;
            continue;
        }
        // Connectors are kept only when a name word follows them.
        let mut look = end;
        while look < words.len() && NAME_CONNECTORS.contains(&words[look].to_lowercase().as_str())
        {
            look += 1;
        }
        if look > end && look < words.len() && is_name(words[look].as_str()) {
            end = look + 1;
        } else {
            break;
        }
    }
    end
}

/// Bounds of a date expression around the month at `idx`.
fn date_bounds(words: &[String], idx: usize) -> (usize, usize) {
    let mut start = idx;
    if idx >= 2 && words[idx - 1].eq_ignore_ascii_case("de") && is_day(&words[idx - 2]) {
        start = idx - 2;
    }
    let mut end = idx + 1;
    if idx + 2 < words.len() && words[idx + 1].eq_ignore_ascii_case("de") && is_year(&words[idx + 2])
    {
        end = idx + 3;
    }
    (start, end)
}

fn clean_word(raw: &str) -> String {
    raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '-')
        .to_string()
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(|c| c.is_uppercase())
        && word.chars().any(|c| c.is_alphabetic())
}

fn is_month(word: &str) -> bool {
    MONTHS.contains(&word.to_lowercase().as_str())
}

fn is_year(word: &str) -> bool {
    word.len() == 4
        && word.chars().all(|c| c.is_ascii_digit())
        && matches!(word.parse::<u32>(), Ok(1800..=2099))
}

fn is_day(word: &str) -> bool {
    matches!(word.parse::<u32>(), Ok(1..=31))
}

/// Crude Spanish singularization used as a lemma.
fn lemmatize(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    let len = chars.len();
    if len > 4 && word.ends_with("ces") {
        return format!("{}z", &word[..word.len() - 3]);
    }
    if len > 4 && word.ends_with("es") && "lrndj".contains(chars[len - 3]) {
        return word[..word.len() - 2].to_string();
    }
    if len > 3 && word.ends_with('s') && "aeiouáéíóú".contains(chars[len - 2]) {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

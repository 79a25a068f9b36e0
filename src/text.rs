//! Text normalizer for mis-decoded (mojibake) catalogue text.
//!
//! Source records were exported as UTF-8 but read back as Latin-1 /
//! Windows-1252 somewhere along the way, so "á" shows up as "Ã¡". The repair
//! is a fixed, ordered replacement table applied after Unicode canonical
//! composition. Sequences that are not in the table pass through unchanged:
//! this is a best-effort repair for the anticipated encodings only.

use unicode_normalization::UnicodeNormalization;

/// Default replacement table, longest / most specific patterns first.
///
/// The three-character `â€?` sequences (smart punctuation) must be checked
/// before any two-character pattern. A replacement can complete a new
/// pattern ("ÃÂº" becomes "Ãº"), so [`MojibakeTable::apply`] repeats the
/// table until the text is stable.
pub const DEFAULT_MOJIBAKE: &[(&str, &str)] = &[
    ("â€œ", "\u{201C}"),
    ("â€\u{9d}", "\u{201D}"),
    ("â€™", "\u{2019}"),
    ("â€˜", "\u{2018}"),
    ("â€“", "\u{2013}"),
    ("â€”", "\u{2014}"),
    ("â€¦", "\u{2026}"),
    ("Ã¡", "á"),
    ("Ã©", "é"),
    ("Ã\u{AD}", "í"),
    ("Ã³", "ó"),
    ("Ãº", "ú"),
    ("Ã±", "ñ"),
    ("Ã¼", "ü"),
    ("Ã\u{81}", "Á"),
    ("Ã‰", "É"),
    ("Ã\u{8D}", "Í"),
    ("Ã“", "Ó"),
    ("Ãš", "Ú"),
    ("Ã‘", "Ñ"),
    ("Ãœ", "Ü"),
    ("Ã§", "ç"),
    ("Âº", "º"),
    ("Âª", "ª"),
    ("Â¿", "¿"),
    ("Â¡", "¡"),
    ("Â°", "°"),
];

/// Upper bound on table passes, for custom tables whose entries feed each other.
pub const MAX_PASSES: usize = 8;

/// Ordered literal replacement table.
#[derive(Debug, Clone)]
pub struct MojibakeTable {
    entries: Vec<(String, String)>,
}

impl Default for MojibakeTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_MOJIBAKE)
    }
}

impl MojibakeTable {
    /// Build a table from `(wrong, correct)` pairs, applied in the given order.
    /// Empty patterns are ignored.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let entries = pairs
            .iter()
            .filter(|(wrong, _)| !wrong.is_empty())
            .map(|(wrong, correct)| (wrong.to_string(), correct.to_string()))
            .collect();
        Self { entries }
    }

    /// Append a replacement after the existing ones.
    pub fn push(&mut self, wrong: impl Into<String>, correct: impl Into<String>) {
        let wrong = wrong.into();
        if !wrong.is_empty() {
            self.entries.push((wrong, correct.into()));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every replacement in order, repeating until nothing changes or
    /// [`MAX_PASSES`] is reached. Unmapped text is returned as-is.
    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for _ in 0..MAX_PASSES {
            let mut changed = false;
            for (wrong, correct) in &self.entries {
                if out.contains(wrong.as_str()) {
                    out = out.replace(wrong.as_str(), correct);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        out
    }
}

/// Normalizer combining NFC, trimming and the mojibake table.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    table: MojibakeTable,
}

impl TextNormalizer {
    pub fn new(table: MojibakeTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &MojibakeTable {
        &self.table
    }

    /// Repair a string. Missing or blank input yields an empty string.
    ///
    /// Composition is applied again after the table so that a repaired
    /// letter followed by a combining mark ends in canonical form, which
    /// keeps the operation idempotent.
    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let composed: String = text.nfc().collect();
        let repaired = self.table.apply(composed.trim());
        repaired.nfc().collect()
    }

    /// Same as [`clean`](Self::clean) for optional values.
    pub fn clean_opt(&self, text: Option<&str>) -> String {
        text.map(|t| self.clean(t)).unwrap_or_default()
    }
}

/// Clean with the default table.
pub fn clean_text(text: &str) -> String {
    TextNormalizer::default().clean(text)
}

/// Truncate to at most `max_chars` characters (not bytes).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_common_spanish_mojibake() {
        assert_eq!(clean_text("InauguraciÃ³n del teatro"), "Inauguración del teatro");
        assert_eq!(clean_text("Ã¡rea de EspaÃ±a"), "área de España");
        assert_eq!(clean_text("NÂº 5"), "Nº 5");
    }

    #[test]
    fn empty_input_returns_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(TextNormalizer::default().clean_opt(None), "");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(clean_text("  Lima antigua \n"), "Lima antigua");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn composes_decomposed_characters() {
        let decomposed = "Lima\u{301}";
        let cleaned = clean_text(decomposed);
        assert_eq!(cleaned.chars().count(), 4);
        assert_eq!(cleaned, "Limá");
    }

    #[test]
    fn smart_punctuation_checked_before_shorter_patterns() {
        assert_eq!(clean_text("â€œLa Prensaâ€\u{9d}"), "\u{201C}La Prensa\u{201D}");
        assert_eq!(clean_text("1900â€“1910"), "1900\u{2013}1910");
    }

    #[test]
    fn unmapped_sequences_pass_through() {
        let odd = "Ã\u{9f}xyz ðŸ";
        assert_eq!(clean_text(odd), odd.nfc().collect::<String>());
    }

    #[test]
    fn clean_is_idempotent() {
        let samples = [
            "InauguraciÃ³n",
            "  â€œcomillasâ€\u{9d}  ",
            "PerÃº\u{301} y mÃ¡s",
            "Ã\u{81}ncash, NÂº 3",
            "texto correcto",
            "",
        ];
        for sample in samples {
            let once = clean_text(sample);
            let twice = clean_text(&once);
            assert_eq!(once, twice, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn chained_mojibake_is_repaired_and_stable() {
        let cases = [
            ("\u{c3}\u{c2}\u{ba}", "\u{fa}"),
            ("\u{c3}\u{c2}\u{a1}", "\u{e1}"),
            ("Per\u{c3}\u{c2}\u{ba}", "Per\u{fa}"),
        ];
        for (sample, expected) in cases {
            let once = clean_text(sample);
            assert_eq!(once, expected, "wrong repair for {sample:?}");
            assert_eq!(clean_text(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn self_feeding_table_stops_after_max_passes() {
        let table = MojibakeTable::from_pairs(&[("a", "aa")]);
        assert_eq!(table.apply("a").len(), 1 << MAX_PASSES);
    }

    #[test]
    fn custom_table_is_pluggable() {
        let mut table = MojibakeTable::from_pairs(&[]);
        table.push("&amp;", "&");
        let normalizer = TextNormalizer::new(table);

        assert_eq!(normalizer.clean("Lima &amp; Callao"), "Lima & Callao");
        // Default entries are not present in a custom table.
        assert_eq!(normalizer.clean("Ã¡"), "Ã¡");
        assert_eq!(normalizer.table().len(), 1);
    }

    #[test]
    fn empty_patterns_are_ignored() {
        let table = MojibakeTable::from_pairs(&[("", "x"), ("a", "b")]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.apply("aa"), "bb");
    }

    #[test]
    fn truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("Fotografía", 9), "Fotografí");
        assert_eq!(truncate_chars("corto", 200), "corto");
        assert_eq!(truncate_chars("ñandú", 0), "");
    }
}

//! Result aggregation: count summary, grouped listing, context block and
//! reference list.
//!
//! All functions are pure and deterministic. They expect documents that
//! already went through the text normalizer.

use std::collections::HashMap;

use crate::document::Document;
use crate::text::truncate_chars;

/// Documents fed into the generation context.
pub const CONTEXT_DOCS: usize = 10;
/// Description characters kept per context entry.
pub const CONTEXT_DESCRIPTION_CHARS: usize = 200;

/// Vocabulary used when no category list is available.
pub const DEFAULT_CATEGORIES: &[&str] = &["Historia", "Fotografía", "Lima"];

fn year_clause(label: Option<&str>) -> String {
    label
        .map(|l| format!(" para el año {l}"))
        .unwrap_or_default()
}

/// "No documents" sentence, with the year clause when a label is known.
pub fn no_documents_message(label: Option<&str>) -> String {
    format!("No se encontraron documentos{}.", year_clause(label))
}

/// Natural-language count summary.
///
/// A document counts toward the first category whose name occurs,
/// case-insensitively, in its subject. Categories with no match are not
/// mentioned.
pub fn summarize<S: AsRef<str>>(docs: &[Document], label: Option<&str>, categories: &[S]) -> String {
    if docs.is_empty() {
        return no_documents_message(label);
    }

    let mut sentences = Vec::new();
    sentences.push(match label {
        Some(label) => format!(
            "Se han encontrado {} documentos correspondientes al año {}.",
            docs.len(),
            label
        ),
        None => format!("Se han encontrado {} documentos.", docs.len()),
    });

    let mut counts: Vec<(&str, String, usize)> = Vec::new();
    for category in categories {
        let category = category.as_ref();
        let needle = category.to_lowercase();
        if !needle.is_empty() && !counts.iter().any(|(_, n, _)| *n == needle) {
            counts.push((category, needle, 0));
        }
    }

    let mut uncategorized = 0;
    for doc in docs {
        let subject = doc.display_subject().to_lowercase();
        match counts.iter_mut().find(|(_, needle, _)| subject.contains(needle.as_str())) {
            Some((_, _, count)) => *count += 1,
            None => uncategorized += 1,
        }
    }

    for (category, _, count) in &counts {
        if *count > 0 {
            sentences.push(format!(
                "En la categoría de {category}, se encontraron {count} documentos."
            ));
        }
    }

    if uncategorized > 0 {
        sentences.push(format!(
            "Además, hay {uncategorized} documentos sin una categoría específica."
        ));
    }

    sentences.join(" ")
}

/// Markdown listing grouped by subject, groups in first-seen order.
pub fn grouped_listing(docs: &[Document], label: Option<&str>) -> String {
    if docs.is_empty() {
        return format!("**{}**", no_documents_message(label));
    }

    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<String>> = HashMap::new();
    for doc in docs {
        let subject = doc.display_subject();
        let lines = groups.entry(subject).or_insert_with(|| {
            order.push(subject);
            Vec::new()
        });
        lines.push(format!(
            "- **{}** ({}) - Autor: {}",
            doc.title,
            doc.display_date(),
            doc.display_creator()
        ));
    }

    let mut out = match label {
        Some(label) => format!("## Documentos detallados para el año {label}\n\n"),
        None => "## Documentos detallados\n\n".to_string(),
    };
    for subject in order {
        out.push_str(&format!("### {subject}\n"));
        out.push_str(&groups[subject].join("\n"));
        out.push_str("\n\n");
    }
    out.trim_end().to_string()
}

/// Context passed to the answer synthesizer.
pub fn context_block(docs: &[Document]) -> String {
    docs.iter()
        .take(CONTEXT_DOCS)
        .map(|doc| {
            let description = doc.description.as_deref().unwrap_or_default();
            format!(
                "Título: {}\nFecha: {}\nTema: {}\nDescripción: {}...",
                doc.title,
                doc.display_date(),
                doc.display_subject(),
                truncate_chars(description, CONTEXT_DESCRIPTION_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One reference line per document.
pub fn references(docs: &[Document]) -> String {
    docs.iter()
        .map(|doc| {
            format!(
                "- {} ({}) - {}",
                doc.title,
                doc.display_date(),
                doc.display_subject()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

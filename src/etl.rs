//! Tab-separated catalogue export to Turtle.
//!
//! One `dcterms:BibliographicResource` per row, identified by its sanitized
//! title under [`RESOURCE_BASE`]. Rows sharing a title collapse into one
//! resource.

use std::fs;
use std::io::Write;
use std::path::Path;

use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::vocab::{rdf, xsd};
use oxigraph::model::{GraphNameRef, Literal, NamedNode, QuadRef, Term};
use oxigraph::store::Store;
use serde::Serialize;
use tracing::{info, warn};

use crate::graph::query::DC_NS;
use crate::Result;

pub const RESOURCE_BASE: &str = "http://ira.pucp.edu.pe/resource/";
pub const IRA_NS: &str = "http://ira.pucp.edu.pe/ontology#";
pub const DCTERMS_NS: &str = "http://purl.org/dc/terms/";
pub const FOAF_NS: &str = "http://xmlns.com/foaf/0.1/";

const COL_TITLE: &str = "dc.title[es_ES]";
const COL_AUTHOR: &str = "dc.contributor.author";
const COL_DATE: &str = "dc.date.issued";
const COL_DESCRIPTION: &str = "dc.description[es_ES]";
const COL_LANGUAGE: &str = "dc.language.iso[es_ES]";
const COL_PUBLISHER: &str = "dc.publisher";
const COL_SUBJECT: &str = "dc.subject[es_ES]";

/// Language-tagged columns and the Dublin Core property they map to.
const TAGGED_COLUMNS: &[(&str, &str)] = &[
    (COL_TITLE, "title"),
    (COL_AUTHOR, "creator"),
    (COL_DESCRIPTION, "description"),
    (COL_PUBLISHER, "publisher"),
    (COL_SUBJECT, "subject"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    pub rows_read: usize,
    pub documents: usize,
    pub skipped_rows: usize,
    pub invalid_dates: usize,
}

/// Decode as UTF-8, or byte-for-byte as Latin-1 when that fails.
pub fn decode_input(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            warn!("Input is not valid UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| char::from(b)).collect()
        }
    }
}

/// Local name for a title: trimmed, spaces to `_`, `\ " [ ]` dropped,
/// `/` to `_`, then percent-encoded. Blank titles have no name.
pub fn sanitize_resource_name(title: &str) -> Option<String> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '\\' | '"' | '[' | ']'))
        .map(|c| if c == ' ' || c == '/' { '_' } else { c })
        .collect();
    Some(urlencoding::encode(&cleaned).into_owned())
}

/// Leading four-digit year of a date string.
pub fn year_of(date: &str) -> Option<&str> {
    let date = date.trim();
    let year = date.get(..4)?;
    year.chars().all(|c| c.is_ascii_digit()).then_some(year)
}

fn dc(property: &str) -> NamedNode {
    NamedNode::new_unchecked(format!("{DC_NS}{property}"))
}

/// Parse TSV text into a fresh store.
pub fn tab_to_store(text: &str) -> Result<(Store, ConversionStats)> {
    let store = Store::new()?;
    let mut stats = ConversionStats::default();

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let tagged: Vec<(Option<usize>, NamedNode)> = TAGGED_COLUMNS
        .iter()
        .map(|(col, prop)| (column(*col), dc(prop)))
        .collect();
    let title_idx = column(COL_TITLE);
    let date_idx = column(COL_DATE);
    let language_idx = column(COL_LANGUAGE);

    let resource_type = NamedNode::new_unchecked(format!("{DCTERMS_NS}BibliographicResource"));
    let date_prop = dc("date");
    let language_prop = dc("language");

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!("Skipping unreadable row: {}", err);
                stats.rows_read += 1;
                stats.skipped_rows += 1;
                continue;
            }
        };
        stats.rows_read += 1;
        if record.len() != headers.len() {
            stats.skipped_rows += 1;
            continue;
        }

        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let Some(name) = field(title_idx).and_then(sanitize_resource_name) else {
            stats.skipped_rows += 1;
            continue;
        };
        let subject = NamedNode::new(format!("{RESOURCE_BASE}{name}"))?;
        let graph = GraphNameRef::DefaultGraph;

        store.insert(QuadRef::new(&subject, rdf::TYPE, &resource_type, graph))?;

        for (idx, property) in &tagged {
            if let Some(value) = field(*idx) {
                let literal: Term = Literal::new_language_tagged_literal_unchecked(value, "es").into();
                store.insert(QuadRef::new(&subject, property, &literal, graph))?;
            }
        }

        if let Some(date) = field(date_idx) {
            match year_of(date) {
                Some(year) => {
                    let literal: Term = Literal::new_typed_literal(year, xsd::G_YEAR).into();
                    store.insert(QuadRef::new(&subject, &date_prop, &literal, graph))?;
                }
                None => {
                    warn!(date, "Invalid date format");
                    stats.invalid_dates += 1;
                }
            }
        }

        if let Some(language) = field(language_idx) {
            let literal: Term = Literal::new_simple_literal(language).into();
            store.insert(QuadRef::new(&subject, &language_prop, &literal, graph))?;
        }

        stats.documents += 1;
    }

    Ok((store, stats))
}

/// Serialize the default graph as Turtle with the catalogue prefixes.
pub fn write_turtle<W: Write>(store: &Store, writer: W) -> Result<W> {
    let serializer = RdfSerializer::from_format(RdfFormat::Turtle)
        .with_prefix("dc", DC_NS)?
        .with_prefix("dcterms", DCTERMS_NS)?
        .with_prefix("foaf", FOAF_NS)?
        .with_prefix("ira", IRA_NS)?;
    Ok(store.dump_graph_to_writer(GraphNameRef::DefaultGraph, serializer, writer)?)
}

/// Read a TSV export and write it as Turtle.
pub fn convert_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<ConversionStats> {
    let bytes = fs::read(input.as_ref())?;
    let text = decode_input(&bytes);
    let (store, stats) = tab_to_store(&text)?;

    let file = fs::File::create(output.as_ref())?;
    let mut writer = write_turtle(&store, std::io::BufWriter::new(file))?;
    writer.flush()?;

    info!(
        input = %input.as_ref().display(),
        output = %output.as_ref().display(),
        rows = stats.rows_read,
        documents = stats.documents,
        skipped = stats.skipped_rows,
        invalid_dates = stats.invalid_dates,
        "RDF written"
    );
    Ok(stats)
}

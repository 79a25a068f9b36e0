//! In-process graph backed by an oxigraph memory store.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use oxigraph::io::RdfFormat;
use oxigraph::model::Term;
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;
use tracing::info;

use super::query::SparqlQuery;
use super::Row;
use crate::{Error, Result};

pub struct LocalGraph {
    store: Store,
}

impl LocalGraph {
    /// Load a Turtle file into a fresh in-memory store.
    pub fn open_turtle(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let store = Store::new()?;
        store.load_from_reader(RdfFormat::Turtle, BufReader::new(file))?;
        let graph = Self { store };
        info!(path = %path.display(), triples = graph.len(), "Loaded RDF graph");
        Ok(graph)
    }

    pub fn from_turtle_str(data: &str) -> Result<Self> {
        let store = Store::new()?;
        store.load_from_reader(RdfFormat::Turtle, data.as_bytes())?;
        Ok(Self { store })
    }

    pub fn len(&self) -> usize {
        self.store.len().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evaluate a SELECT query; each solution becomes a row of lexical values.
    pub fn select(&self, query: &SparqlQuery) -> Result<Vec<Row>> {
        let text = query.render();
        match self.store.query(text.as_str())? {
            QueryResults::Solutions(solutions) => {
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = solution?;
                    let row: Row = solution
                        .iter()
                        .map(|(var, term)| (var.as_str().to_string(), term_value(term)))
                        .collect();
                    rows.push(row);
                }
                Ok(rows)
            }
            _ => Err(Error::GraphStore("expected SELECT solutions".to_string())),
        }
    }
}

fn term_value(term: &Term) -> String {
    match term {
        Term::Literal(literal) => literal.value().to_string(),
        Term::NamedNode(node) => node.as_str().to_string(),
        Term::BlankNode(node) => node.as_str().to_string(),
        #[allow(unreachable_patterns)]
        other => other.to_string(),
    }
}

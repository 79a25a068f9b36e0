//! Graph query service: query construction plus local and remote backends.

pub mod local;
pub mod query;
pub mod remote;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub use local::LocalGraph;
pub use query::{top_subjects_query, FilterMode, QueryBuilder, QueryProfile, SparqlQuery};
pub use remote::RemoteGraph;

use crate::document::Document;
use crate::metrics;
use crate::{Error, Result};

/// One solution: variable name to lexical value. Unbound variables are absent.
pub type Row = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Local,
    Remote,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "local" | "file" | "oxigraph" => Ok(BackendKind::Local),
            "remote" | "graphdb" | "sparql" => Ok(BackendKind::Remote),
            other => Err(Error::InvalidArgument(format!("unknown graph backend: {other}"))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => f.write_str("local"),
            BackendKind::Remote => f.write_str("remote"),
        }
    }
}

/// Graph store the orchestrator talks to.
pub enum GraphBackend {
    Local(LocalGraph),
    Remote(RemoteGraph),
}

impl GraphBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            GraphBackend::Local(_) => BackendKind::Local,
            GraphBackend::Remote(_) => BackendKind::Remote,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            GraphBackend::Local(_) => "local",
            GraphBackend::Remote(_) => "remote",
        }
    }

    pub async fn select(&self, query: &SparqlQuery) -> Result<Vec<Row>> {
        let result = match self {
            GraphBackend::Local(graph) => graph.select(query),
            GraphBackend::Remote(graph) => graph.select(query).await,
        };
        metrics::record_graph_query(self.label(), result.is_ok());
        result
    }

    /// Documents matching the query. Titleless rows are dropped.
    pub async fn documents(&self, query: &SparqlQuery) -> Result<Vec<Document>> {
        let rows = self.select(query).await?;
        Ok(rows.iter().filter_map(Document::from_row).collect())
    }

    /// Most frequent subjects, most common first.
    pub async fn top_subjects(&self) -> Result<Vec<String>> {
        let rows = self.select(&top_subjects_query()).await?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| row.remove("subject"))
            .filter(|s| !s.trim().is_empty())
            .collect())
    }
}

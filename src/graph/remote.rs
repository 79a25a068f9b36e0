//! Remote SPARQL endpoint (GraphDB / RDF4J repository protocol).

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::query::SparqlQuery;
use super::Row;
use crate::{Error, Result};

pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Client for `{server}/repositories/{repository}`.
///
/// The query template is sent as `query`, and each binding travels as a
/// separate `$name` parameter holding the N-Triples form of the value.
#[derive(Debug, Clone)]
pub struct RemoteGraph {
    http: Client,
    endpoint: String,
}

impl RemoteGraph {
    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ConnectionError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn select(&self, query: &SparqlQuery) -> Result<Vec<Row>> {
        let mut params: Vec<(String, String)> = vec![("query".to_string(), query.template())];
        for (name, value) in query.bindings() {
            params.push((format!("${name}"), value.to_string()));
        }
        debug!(endpoint = %self.endpoint, bindings = query.bindings().len(), "SPARQL request");

        let response = self
            .http
            .get(&self.endpoint)
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GraphStore(format!("SPARQL endpoint error {status}: {body}")));
        }

        let results: SparqlResults = response
            .json()
            .await
            .map_err(|e| Error::SerializationError(format!("Invalid SPARQL results: {e}")))?;

        Ok(results
            .results
            .bindings
            .into_iter()
            .map(|binding| {
                binding
                    .into_iter()
                    .map(|(var, term)| (var, term.value))
                    .collect()
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: SparqlBindings,
}

#[derive(Debug, Deserialize)]
struct SparqlBindings {
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

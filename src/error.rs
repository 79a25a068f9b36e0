//! Error types for the archive question-answering pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Graph store error: {0}")]
    GraphStore(String),

    #[error("RDF error: {0}")]
    Rdf(String),

    #[error("Inference API error: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::ConnectionError(err.to_string())
        } else {
            Error::Inference(err.to_string())
        }
    }
}

impl From<oxigraph::store::StorageError> for Error {
    fn from(err: oxigraph::store::StorageError) -> Self {
        Error::GraphStore(err.to_string())
    }
}

impl From<oxigraph::store::LoaderError> for Error {
    fn from(err: oxigraph::store::LoaderError) -> Self {
        Error::Rdf(err.to_string())
    }
}

impl From<oxigraph::store::SerializerError> for Error {
    fn from(err: oxigraph::store::SerializerError) -> Self {
        Error::Rdf(err.to_string())
    }
}

impl From<oxigraph::sparql::EvaluationError> for Error {
    fn from(err: oxigraph::sparql::EvaluationError) -> Self {
        Error::GraphStore(err.to_string())
    }
}

impl From<oxigraph::model::IriParseError> for Error {
    fn from(err: oxigraph::model::IriParseError) -> Self {
        Error::Rdf(err.to_string())
    }
}

//! Configuration for the graph store, inference endpoint and pipeline
//!
//! Loads configuration from config.yml; environment variables take
//! precedence over YAML string values.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{ANSWER_CACHE_TTL_SECS, QUERY_CACHE_TTL_SECS};
use crate::extract::ExtractionStrategy;
use crate::graph::{BackendKind, QueryProfile};
use crate::integrations::huggingface::{DEFAULT_EMBEDDING_MODEL, HF_API_URL};
use crate::prompts::Prompt;
use crate::{Error, Result};

/// Default constants (fallback if config.yml not found)
pub const DEFAULT_GRAPHDB_SERVER: &str = "http://localhost:7200";
pub const DEFAULT_REPOSITORY: &str = "IRA";
pub const DEFAULT_RDF_FILE: &str = "dataset.ttl";
pub const DEFAULT_METADATA_FILE: &str = "metadata.json";
pub const DEFAULT_MODEL: &str = "mistralai/Mixtral-8x7B-Instruct-v0.1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// YAML config structures
#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    graph: Option<GraphSection>,
    inference: Option<InferenceSection>,
    pipeline: Option<PipelineSection>,
    categories: Option<CategoriesSection>,
    cache: Option<CacheSection>,
}

#[derive(Debug, Default, Deserialize)]
struct GraphSection {
    backend: Option<String>,
    server: Option<String>,
    repository: Option<String>,
    rdf_file: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct InferenceSection {
    api_url: Option<String>,
    api_token: Option<String>,
    model: Option<String>,
    embedding_model: Option<String>,
    prompt: Option<String>,
    max_new_tokens: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct PipelineSection {
    profile: Option<String>,
    strategy: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CategoriesSection {
    metadata_file: Option<String>,
    #[serde(default)]
    vocabulary: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CacheSection {
    query_ttl_secs: Option<u64>,
    answer_ttl_secs: Option<u64>,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub graphdb_server: String,
    pub repository: String,
    pub rdf_file: PathBuf,
    pub timeout_secs: u64,
    pub hf_api_url: String,
    pub hf_api_token: String,
    pub model: String,
    pub embedding_model: String,
    pub prompt: Prompt,
    /// `None` means the prompt's own default
    pub max_new_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub profile: QueryProfile,
    pub strategy: ExtractionStrategy,
    pub metadata_file: PathBuf,
    /// Explicit category list; empty means "load from the metadata file"
    pub categories: Vec<String>,
    pub query_cache_ttl_secs: u64,
    pub answer_cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Load .env, then configuration from config.yml or use defaults
    /// Environment variables take precedence over config.yml values
    pub fn new() -> Self {
        Self::load_dotenv();
        Self::load_from_file("config.yml")
            .or_else(|_| Self::load_from_file("../config.yml"))
            .unwrap_or_else(|_| Self::from_yaml(YamlConfig::default()))
    }

    /// Resolve a value: prefer env var if config value looks like ${VAR}
    fn resolve_env_string(value: Option<String>, env_key: &str) -> Option<String> {
        if let Some(ref v) = value {
            if let Some(var_name) = v.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
                if let Ok(env_val) = std::env::var(var_name) {
                    return Some(env_val);
                }
            }
        }
        if let Ok(env_val) = std::env::var(env_key) {
            if !env_val.is_empty() {
                return Some(env_val);
            }
        }
        value.filter(|v| !(v.starts_with("${") && v.ends_with('}')))
    }

    /// Load .env file into environment variables using dotenvy
    fn load_dotenv() {
        if dotenvy::dotenv().is_err() {
            let _ = dotenvy::from_filename("../.env");
        }
    }

    /// Load configuration from a specific file. Only the process
    /// environment is consulted; .env files are read by [`Config::new`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let yaml: YamlConfig = serde_yaml::from_str(&content)?;
        Ok(Self::from_yaml(yaml))
    }

    fn from_yaml(yaml: YamlConfig) -> Self {
        let graph = yaml.graph.unwrap_or_default();
        let inference = yaml.inference.unwrap_or_default();
        let pipeline = yaml.pipeline.unwrap_or_default();
        let categories = yaml.categories.unwrap_or_default();
        let cache = yaml.cache.unwrap_or_default();

        let backend = parse_or_default(graph.backend, "graph.backend");
        let profile = parse_or_default(pipeline.profile, "pipeline.profile");
        let strategy = parse_or_default(pipeline.strategy, "pipeline.strategy");
        let prompt = parse_or_default(inference.prompt, "inference.prompt");

        Self {
            backend,
            graphdb_server: Self::resolve_env_string(graph.server, "GRAPHDB_SERVER")
                .unwrap_or_else(|| DEFAULT_GRAPHDB_SERVER.to_string()),
            repository: Self::resolve_env_string(graph.repository, "REPO_NAME")
                .unwrap_or_else(|| DEFAULT_REPOSITORY.to_string()),
            rdf_file: Self::resolve_env_string(graph.rdf_file, "RDF_FILE")
                .unwrap_or_else(|| DEFAULT_RDF_FILE.to_string())
                .into(),
            timeout_secs: graph.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            hf_api_url: Self::resolve_env_string(inference.api_url, "HF_API_URL")
                .unwrap_or_else(|| HF_API_URL.to_string()),
            hf_api_token: Self::resolve_env_string(inference.api_token, "HF_API_TOKEN")
                .unwrap_or_default(),
            model: Self::resolve_env_string(inference.model, "MODEL_NAME")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            embedding_model: inference
                .embedding_model
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            prompt,
            max_new_tokens: inference.max_new_tokens,
            temperature: inference.temperature,
            profile,
            strategy,
            metadata_file: Self::resolve_env_string(categories.metadata_file, "METADATA_FILE")
                .unwrap_or_else(|| DEFAULT_METADATA_FILE.to_string())
                .into(),
            categories: categories.vocabulary,
            query_cache_ttl_secs: cache.query_ttl_secs.unwrap_or(QUERY_CACHE_TTL_SECS),
            answer_cache_ttl_secs: cache.answer_ttl_secs.unwrap_or(ANSWER_CACHE_TTL_SECS),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn sparql_endpoint(&self) -> String {
        format!(
            "{}/repositories/{}",
            self.graphdb_server.trim_end_matches('/'),
            self.repository
        )
    }
}

fn parse_or_default<T>(value: Option<String>, field: &str) -> T
where
    T: std::str::FromStr<Err = Error> + Default,
{
    match value.map(|v| v.parse::<T>()) {
        Some(Ok(parsed)) => parsed,
        Some(Err(err)) => {
            tracing::warn!("Ignoring {}: {}", field, err);
            T::default()
        }
        None => T::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{LazyLock, Mutex};

    static ENV_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

    const ENV_KEYS: &[&str] = &[
        "GRAPHDB_SERVER",
        "REPO_NAME",
        "HF_API_TOKEN",
        "MODEL_NAME",
        "HF_API_URL",
        "RDF_FILE",
        "METADATA_FILE",
        "ARCHIVE_QA_TEST_TOKEN",
    ];

    struct EnvGuard {
        key: String,
        original: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: Option<&str>) -> Self {
            let original = std::env::var(key).ok();
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
            Self {
                key: key.to_string(),
                original,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.original {
                Some(value) => std::env::set_var(&self.key, value),
                None => std::env::remove_var(&self.key),
            }
        }
    }

    /// Clear every known key, then apply `vars`.
    fn isolated_env(vars: &[(&str, &str)]) -> Vec<EnvGuard> {
        let mut guards: Vec<EnvGuard> = ENV_KEYS.iter().map(|k| EnvGuard::set(k, None)).collect();
        guards.extend(vars.iter().map(|(k, v)| EnvGuard::set(k, Some(v))));
        guards
    }

    fn write_yaml(name: &str, yaml: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(name), yaml).unwrap();
        dir
    }

    #[test]
    fn defaults_without_yaml() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guards = isolated_env(&[]);

        let config = Config::from_yaml(YamlConfig::default());
        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.sparql_endpoint(), "http://localhost:7200/repositories/IRA");
        assert_eq!(config.rdf_file, PathBuf::from("dataset.ttl"));
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.query_cache_ttl_secs, 3600);
        assert_eq!(config.answer_cache_ttl_secs, 600);
        assert!(config.hf_api_token.is_empty());
        assert!(config.categories.is_empty());
    }

    #[test]
    fn load_from_yaml() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guards = isolated_env(&[]);
        let dir = write_yaml(
            "config.yml",
            r#"
graph:
  backend: remote
  server: "http://graphdb:7200/"
  repository: "Archivo"
  timeout_secs: 3
inference:
  model: "test/model"
  prompt: brief
  max_new_tokens: 128
pipeline:
  profile: analysis
  strategy: entities
categories:
  vocabulary: ["Teatro", "Puerto"]
cache:
  answer_ttl_secs: 5
"#,
        );

        let config = Config::load_from_file(dir.path().join("config.yml")).unwrap();
        assert_eq!(config.backend, BackendKind::Remote);
        assert_eq!(config.sparql_endpoint(), "http://graphdb:7200/repositories/Archivo");
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.model, "test/model");
        assert_eq!(config.prompt, Prompt::Brief);
        assert_eq!(config.max_new_tokens, Some(128));
        assert_eq!(config.profile, QueryProfile::Analysis);
        assert_eq!(config.strategy, ExtractionStrategy::Entities);
        assert_eq!(config.categories, vec!["Teatro", "Puerto"]);
        assert_eq!(config.answer_cache_ttl_secs, 5);
        assert_eq!(config.query_cache_ttl_secs, 3600);
    }

    #[test]
    fn env_placeholders_are_resolved_from_environment() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guards = isolated_env(&[("ARCHIVE_QA_TEST_TOKEN", "hf_from_env")]);
        let dir = write_yaml(
            "config.yml",
            r#"
inference:
  api_token: "${ARCHIVE_QA_TEST_TOKEN}"
"#,
        );

        let config = Config::load_from_file(dir.path().join("config.yml")).unwrap();
        assert_eq!(config.hf_api_token, "hf_from_env");
    }

    #[test]
    fn well_known_env_vars_override_yaml() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guards = isolated_env(&[
            ("GRAPHDB_SERVER", "http://env:7200"),
            ("REPO_NAME", "EnvRepo"),
            ("MODEL_NAME", "env/model"),
        ]);
        let dir = write_yaml(
            "config.yml",
            r#"
graph:
  server: "http://yaml:7200"
  repository: "YamlRepo"
inference:
  model: "yaml/model"
"#,
        );

        let config = Config::load_from_file(dir.path().join("config.yml")).unwrap();
        assert_eq!(config.sparql_endpoint(), "http://env:7200/repositories/EnvRepo");
        assert_eq!(config.model, "env/model");
    }

    #[test]
    fn unresolved_placeholder_falls_back_to_default() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guards = isolated_env(&[]);
        let dir = write_yaml(
            "config.yml",
            r#"
graph:
  repository: "${ARCHIVE_QA_TEST_TOKEN}"
"#,
        );

        let config = Config::load_from_file(dir.path().join("config.yml")).unwrap();
        assert_eq!(config.repository, DEFAULT_REPOSITORY);
    }

    #[test]
    fn invalid_enum_values_fall_back() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guards = isolated_env(&[]);
        let dir = write_yaml(
            "config.yml",
            "graph:\n  backend: mongo\npipeline:\n  profile: fancy\n",
        );

        let config = Config::load_from_file(dir.path().join("config.yml")).unwrap();
        assert_eq!(config.backend, BackendKind::Local);
        assert_eq!(config.profile, QueryProfile::Catalog);
    }

    #[test]
    fn load_from_file_sees_only_the_process_environment() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _guards = isolated_env(&[]);
        let dir = write_yaml("config.yml", "inference:\n  model: \"yaml/model\"\n");

        let config = Config::load_from_file(dir.path().join("config.yml")).unwrap();
        assert_eq!(config.graphdb_server, DEFAULT_GRAPHDB_SERVER);
        assert_eq!(config.repository, DEFAULT_REPOSITORY);
        assert_eq!(config.model, "yaml/model");
        assert!(config.hf_api_token.is_empty());
        for key in ENV_KEYS {
            assert!(std::env::var(key).is_err(), "{key} leaked into the environment");
        }
    }

    #[test]
    fn missing_or_broken_file_is_an_error() {
        assert!(matches!(
            Config::load_from_file("/nonexistent/config.yml"),
            Err(Error::Config(_))
        ));

        let dir = write_yaml("config.yml", "graph: [unclosed");
        assert!(Config::load_from_file(dir.path().join("config.yml")).is_err());
    }
}

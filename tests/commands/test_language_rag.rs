//! Tests for the language RAG command

use archive_qa::commands::{language_rag_run, LanguageRagArgs};
use archive_qa::rag::{EmbedderSpec, LanguageIndex};
use archive_qa::Config;
use httpmock::prelude::*;
use serde_json::json;

fn dataset() -> String {
    json!([
        {
            "@type": ["http://purl.org/linguistics#Language"],
            "http://www.w3.org/2000/01/rdf-schema#label": [{ "@value": "Quechua" }],
            "http://purl.org/linguistics#glottocode": [{ "@value": "quec1387" }]
        },
        {
            "@type": ["http://purl.org/linguistics#Language"],
            "http://www.w3.org/2000/01/rdf-schema#label": [{ "@value": "Aimara" }],
            "http://purl.org/linguistics#glottocode": [{ "@value": "ayma1253" }]
        }
    ])
    .to_string()
}

fn config(inference_url: &str) -> Config {
    let mut config = Config::default();
    config.hf_api_token = String::new();
    config.hf_api_url = inference_url.to_string();
    config.model = "test/model".to_string();
    config
}

#[tokio::test]
async fn test_language_rag_builds_and_answers() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/models/test/model")
            .body_includes("Lengua: Quechua, Glottocode: quec1387");
        then.status(200)
            .json_body(json!([{ "generated_text": "[/INST] El glottocode es quec1387." }]));
    });

    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("languages.jsonld");
    let index_path = dir.path().join("index.json");
    std::fs::write(&data, dataset()).unwrap();

    language_rag_run(
        LanguageRagArgs {
            dataset: Some(data),
            index_path: index_path.clone(),
            query: Some("Lengua: Quechua".to_string()),
            top_k: 1,
            local: true,
        },
        &config(&server.base_url()),
    )
    .await
    .unwrap();

    mock.assert_calls(1);
    let index = LanguageIndex::load(&index_path, None).unwrap();
    assert_eq!(index.len(), 2);
    assert!(matches!(index.embedder(), EmbedderSpec::Local { .. }));
}

#[tokio::test]
async fn test_language_rag_missing_index_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = language_rag_run(
        LanguageRagArgs {
            dataset: None,
            index_path: dir.path().join("missing.json"),
            query: Some("Quechua".to_string()),
            top_k: 2,
            local: false,
        },
        &config("http://127.0.0.1:9"),
    )
    .await;
    assert!(result.is_err());
}

//! Drives the HTTP clients against a local stand-in server.

use ai_llm_service::{LlmModelConfig, LlmProvider, LlmServiceProfiles};
use axum::{Json, Router, http::StatusCode, routing::post};
use serde_json::{Value, json};

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn openai(endpoint: &str) -> LlmModelConfig {
    LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model: "text-embedding-3-large".into(),
        endpoint: endpoint.into(),
        api_key: Some("sk-test".into()),
        dimensions: Some(3),
        timeout_secs: Some(5),
    }
}

fn cohere(endpoint: &str) -> LlmModelConfig {
    LlmModelConfig {
        provider: LlmProvider::Cohere,
        model: "rerank-english-v3.0".into(),
        endpoint: endpoint.into(),
        api_key: Some("co-test".into()),
        dimensions: None,
        timeout_secs: Some(5),
    }
}

#[tokio::test]
async fn embeds_and_reranks_through_profiles() {
    let router = Router::new()
        .route(
            "/v1/embeddings",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "text-embedding-3-large");
                Json(json!({ "data": [{ "embedding": [0.1, 0.2, 0.3] }] }))
            }),
        )
        .route(
            "/v1/rerank",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["top_n"], 2);
                Json(json!({
                    "results": [
                        { "index": 1, "relevance_score": 0.4 },
                        { "index": 0, "relevance_score": 0.9 }
                    ]
                }))
            }),
        );
    let base = spawn(router).await;

    let svc = LlmServiceProfiles::new(openai(&base), Some(cohere(&base)));
    let v = svc.embed("hello").await.unwrap();
    assert_eq!(v, vec![0.1, 0.2, 0.3]);

    let docs = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let hits = svc.rerank("q", &docs, 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].index, 0);
    assert!(hits[0].relevance_score > hits[1].relevance_score);
}

#[tokio::test]
async fn non_success_status_is_a_provider_error() {
    let router = Router::new().route(
        "/v1/embeddings",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
    );
    let base = spawn(router).await;

    let svc = LlmServiceProfiles::new(openai(&base), None);
    let err = svc.embed("hello").await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("429"), "{msg}");
    assert!(msg.contains("rate limited"), "{msg}");
}

#[tokio::test]
async fn rerank_without_profile_is_a_config_error() {
    let svc = LlmServiceProfiles::new(openai("http://127.0.0.1:9"), None);
    let err = svc.rerank("q", &["a".to_string()], 1).await.unwrap_err();
    assert!(err.to_string().contains("COHERE_API_KEY"));
}

//! Persistence and storage behavior against real files and a local server.

use std::sync::Arc;

use axum::{Json, Router, http::HeaderMap, routing::post};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use user_store::{
    InMemoryUserRepository, JsonFileUserRepository, KnowledgebaseFile, ObjectStorage,
    UploadThingConfig, UploadThingStorage, UserRepository, UserStoreError,
};

fn file(key: &str) -> KnowledgebaseFile {
    KnowledgebaseFile {
        name: "report.pdf".into(),
        url: format!("https://utfs.io/f/{key}"),
        size: 2048,
        key: key.into(),
        date_uploaded: Utc::now() - Duration::minutes(5),
        date_processed: None,
    }
}

async fn exercise(repo: Arc<dyn UserRepository>) {
    assert!(matches!(
        repo.get("u1").await,
        Err(UserStoreError::NotFound(_))
    ));

    let rec = repo.append_file("u1", file("k1")).await.unwrap();
    assert_eq!(rec.files.knowledgebase.len(), 1);
    repo.append_file("u1", file("k2")).await.unwrap();

    let dup = repo.append_file("u1", file("k1")).await;
    assert!(matches!(dup, Err(UserStoreError::DuplicateFile(k)) if k == "k1"));

    let now = Utc::now();
    repo.set_date_processed("u1", "k2", Some(now)).await.unwrap();
    let rec = repo.get("u1").await.unwrap();
    assert!(rec.file("k1").unwrap().date_processed.is_none());
    assert_eq!(rec.file("k2").unwrap().date_processed, Some(now));

    assert!(matches!(
        repo.set_date_processed("u1", "nope", Some(now)).await,
        Err(UserStoreError::FileNotFound(_))
    ));

    assert!(repo.remove_file("u1", "k1").await.unwrap());
    assert!(!repo.remove_file("u1", "k1").await.unwrap());
    assert!(!repo.remove_file("ghost", "k1").await.unwrap());
    let rec = repo.get("u1").await.unwrap();
    assert_eq!(rec.files.knowledgebase.len(), 1);
}

#[tokio::test]
async fn in_memory_repository_lifecycle() {
    exercise(Arc::new(InMemoryUserRepository::new())).await;
}

#[tokio::test]
async fn json_file_repository_lifecycle_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    exercise(Arc::new(JsonFileUserRepository::new(dir.path()))).await;

    // A fresh instance sees what the first one wrote.
    let reopened = JsonFileUserRepository::new(dir.path());
    let rec = reopened.get("u1").await.unwrap();
    assert_eq!(rec.files.knowledgebase[0].key, "k2");

    let raw = std::fs::read_to_string(dir.path().join("u1.json")).unwrap();
    let doc: Value = serde_json::from_str(&raw).unwrap();
    assert!(doc["files"]["knowledgebase"][0]["dateProcessed"].is_string());
    assert_eq!(doc["settings"]["forge"]["chunkingStrategy"], "by_title");
}

#[tokio::test]
async fn json_file_repository_rejects_traversal() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileUserRepository::new(dir.path());
    let err = repo.append_file("../escape", file("k")).await.unwrap_err();
    assert!(matches!(err, UserStoreError::InvalidUserId(_)));
}

#[tokio::test]
async fn concurrent_appends_are_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let repo = Arc::new(JsonFileUserRepository::new(dir.path()));
    let mut handles = Vec::new();
    for i in 0..8 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.append_file("u1", file(&format!("k{i}"))).await
        }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }
    assert_eq!(repo.get("u1").await.unwrap().files.knowledgebase.len(), 8);
}

#[tokio::test]
async fn uploadthing_delete_sends_keys_and_secret() {
    let router = Router::new().route(
        "/v6/deleteFiles",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            assert_eq!(headers["x-uploadthing-api-key"], "sk_live_test");
            let n = body["fileKeys"].as_array().map(|a| a.len()).unwrap_or(0);
            Json(json!({ "success": true, "deletedCount": n }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let storage = UploadThingStorage::new(UploadThingConfig {
        secret: "sk_live_test".into(),
        base_url: format!("http://{addr}"),
    })
    .unwrap();
    let deleted = storage
        .delete_files(&["a".to_string(), "b".to_string()])
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(storage.delete_files(&[]).await.unwrap(), 0);
}

//! Uploaded-object storage: fetching file bytes for parsing and deleting
//! objects once their vectors are gone.

use std::{sync::Arc, time::Duration};

use ai_llm_service::error_handler::make_snippet;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    config::{UploadThingConfig, UserStoreConfig},
    errors::{Result, UserStoreError},
};

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Downloads the object behind a durable file url.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;

    /// Deletes objects by storage key; returns how many the provider removed.
    async fn delete_files(&self, keys: &[String]) -> Result<usize>;
}

fn storage_err(e: reqwest::Error) -> UserStoreError {
    UserStoreError::Storage {
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    }
}

async fn get_bytes(http: &Client, url: &str) -> Result<Vec<u8>> {
    let resp = http.get(url).send().await.map_err(storage_err)?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(UserStoreError::Storage {
            status: Some(status.as_u16()),
            message: format!("GET {url}: {}", make_snippet(&body)),
        });
    }
    let bytes = resp.bytes().await.map_err(storage_err)?;
    debug!(target: "user_store::storage", url, size = bytes.len(), "object fetched");
    Ok(bytes.to_vec())
}

/// UploadThing REST client.
pub struct UploadThingStorage {
    http: Client,
    cfg: UploadThingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteFilesResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    deleted_count: Option<usize>,
}

impl UploadThingStorage {
    pub fn new(cfg: UploadThingConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(storage_err)?;
        Ok(Self { http, cfg })
    }
}

#[async_trait]
impl ObjectStorage for UploadThingStorage {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        get_bytes(&self.http, url).await
    }

    async fn delete_files(&self, keys: &[String]) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let url = format!("{}/v6/deleteFiles", self.cfg.base_url);
        let resp = self
            .http
            .post(&url)
            .header("x-uploadthing-api-key", &self.cfg.secret)
            .json(&json!({ "fileKeys": keys }))
            .send()
            .await
            .map_err(storage_err)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UserStoreError::Storage {
                status: Some(status.as_u16()),
                message: format!("POST {url}: {}", make_snippet(&body)),
            });
        }

        let body: DeleteFilesResponse = resp.json().await.map_err(storage_err)?;
        let deleted = match (body.deleted_count, body.success) {
            (Some(n), _) => n,
            (None, true) => keys.len(),
            (None, false) => 0,
        };
        info!(target: "user_store::storage", requested = keys.len(), deleted, "storage objects deleted");
        Ok(deleted)
    }
}

/// Storage used when no provider secret is configured: objects can still be
/// fetched by url, deletions are acknowledged without a remote call.
pub struct NoopStorage {
    http: Client,
}

impl NoopStorage {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

impl Default for NoopStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStorage for NoopStorage {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        get_bytes(&self.http, url).await
    }

    async fn delete_files(&self, keys: &[String]) -> Result<usize> {
        debug!(target: "user_store::storage", count = keys.len(), "no object storage configured; skipping delete");
        Ok(keys.len())
    }
}

/// Picks UploadThing when a secret is configured, else [`NoopStorage`].
pub fn build_storage(cfg: &UserStoreConfig) -> Result<Arc<dyn ObjectStorage>> {
    match &cfg.uploadthing {
        Some(ut) => Ok(Arc::new(UploadThingStorage::new(ut.clone())?)),
        None => {
            warn!(target: "user_store::storage", "UPLOADTHING_SECRET not set; storage deletes are no-ops");
            Ok(Arc::new(NoopStorage::new()))
        }
    }
}

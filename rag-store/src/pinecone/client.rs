//! Pinecone data-plane client.
//!
//! [`PineconeApi`] is the narrow surface the backend needs; [`HttpPineconeClient`]
//! implements it over the REST API:
//! - `POST /vectors/upsert`
//! - `POST /query`
//! - `GET  /vectors/list?namespace&prefix&limit&paginationToken`
//! - `POST /vectors/delete`

use std::time::Duration;

use ai_llm_service::error_handler::make_snippet;
use async_trait::async_trait;
use reqwest::header;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, error};

use crate::{config::PineconeConfig, errors::RagError, metadata::KEY_USER_ID};

const BACKEND: &str = "pinecone";

/// Vector as sent to Pinecone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PineconeVector {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Map<String, Value>,
}

/// One query match.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PineconeMatch {
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// One page of the id listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub ids: Vec<String>,
    /// Cursor for the next page; `None` on the last page.
    pub next: Option<String>,
}

/// Data-plane calls used by [`super::PineconeStore`].
#[async_trait]
pub trait PineconeApi: Send + Sync {
    /// Upserts vectors into `namespace`; returns the acknowledged count.
    async fn upsert(&self, namespace: &str, vectors: &[PineconeVector]) -> Result<usize, RagError>;

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<PineconeMatch>, RagError>;

    async fn list_page(
        &self,
        namespace: &str,
        prefix: &str,
        limit: u32,
        pagination_token: Option<&str>,
    ) -> Result<ListPage, RagError>;

    async fn delete_ids(&self, namespace: &str, ids: &[String]) -> Result<(), RagError>;
}

/// REST implementation of [`PineconeApi`].
#[derive(Debug, Clone)]
pub struct HttpPineconeClient {
    client: reqwest::Client,
    base: String,
}

impl HttpPineconeClient {
    /// Builds a client with the `Api-Key` and API version headers preset.
    pub fn new(cfg: &PineconeConfig) -> Result<Self, RagError> {
        cfg.validate()?;
        let mut headers = header::HeaderMap::new();
        headers.insert(
            "Api-Key",
            header::HeaderValue::from_str(&cfg.api_key)
                .map_err(|e| RagError::Config(format!("invalid pinecone api key header: {e}")))?,
        );
        headers.insert(
            "X-Pinecone-API-Version",
            header::HeaderValue::from_str(&cfg.api_version)
                .map_err(|e| RagError::Config(format!("invalid pinecone api version: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| RagError::Config(format!("pinecone http client: {e}")))?;

        Ok(Self {
            client,
            base: cfg.index_host.trim_end_matches('/').to_string(),
        })
    }

    async fn send_json<T: for<'de> Deserialize<'de>>(
        &self,
        req: reqwest::RequestBuilder,
        what: &'static str,
    ) -> Result<T, RagError> {
        let resp = req.send().await.map_err(transport)?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(target: "rag_store::pinecone", %status, %snippet, what, "pinecone returned non-success status");
            return Err(RagError::Transport {
                backend: BACKEND,
                status: Some(status.as_u16()),
                message: snippet,
            });
        }
        resp.json::<T>().await.map_err(|e| RagError::Transport {
            backend: BACKEND,
            status: None,
            message: format!("decode {what} response: {e}"),
        })
    }
}

fn transport(e: reqwest::Error) -> RagError {
    RagError::Transport {
        backend: BACKEND,
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    }
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [PineconeVector],
    namespace: &'a str,
}

/// Exact JSON body of an upsert request.
pub(crate) fn upsert_body(namespace: &str, vectors: &[PineconeVector]) -> Result<Vec<u8>, RagError> {
    Ok(serde_json::to_vec(&UpsertRequest { vectors, namespace })?)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    /// Owner filter on top of the namespace.
    filter: Value,
    include_metadata: bool,
    include_values: bool,
}

fn query_request<'a>(namespace: &'a str, vector: &'a [f32], top_k: usize) -> QueryRequest<'a> {
    QueryRequest {
        namespace,
        vector,
        top_k,
        filter: json!({ KEY_USER_ID: { "$eq": namespace } }),
        include_metadata: true,
        include_values: false,
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<PineconeMatch>,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    vectors: Vec<ListedId>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct ListedId {
    id: String,
}

#[derive(Deserialize)]
struct Pagination {
    next: Option<String>,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    ids: &'a [String],
    namespace: &'a str,
}

#[async_trait]
impl PineconeApi for HttpPineconeClient {
    async fn upsert(&self, namespace: &str, vectors: &[PineconeVector]) -> Result<usize, RagError> {
        let url = format!("{}/vectors/upsert", self.base);
        debug!(target: "rag_store::pinecone", namespace, count = vectors.len(), "POST {url}");
        let body = upsert_body(namespace, vectors)?;
        let out: UpsertResponse = self
            .send_json(
                self.client
                    .post(&url)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(body),
                "upsert",
            )
            .await?;
        Ok(out.upserted_count)
    }

    async fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<PineconeMatch>, RagError> {
        let url = format!("{}/query", self.base);
        let body = query_request(namespace, vector, top_k);
        let out: QueryResponse = self
            .send_json(self.client.post(&url).json(&body), "query")
            .await?;
        Ok(out.matches)
    }

    async fn list_page(
        &self,
        namespace: &str,
        prefix: &str,
        limit: u32,
        pagination_token: Option<&str>,
    ) -> Result<ListPage, RagError> {
        let url = format!("{}/vectors/list", self.base);
        let limit = limit.to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("namespace", namespace),
            ("prefix", prefix),
            ("limit", limit.as_str()),
        ];
        if let Some(token) = pagination_token {
            query.push(("paginationToken", token));
        }
        let out: ListResponse = self
            .send_json(self.client.get(&url).query(&query), "list")
            .await?;
        Ok(ListPage {
            ids: out.vectors.into_iter().map(|v| v.id).collect(),
            next: out.pagination.and_then(|p| p.next).filter(|t| !t.is_empty()),
        })
    }

    async fn delete_ids(&self, namespace: &str, ids: &[String]) -> Result<(), RagError> {
        let url = format!("{}/vectors/delete", self.base);
        debug!(target: "rag_store::pinecone", namespace, count = ids.len(), "POST {url}");
        let _: Value = self
            .send_json(
                self.client.post(&url).json(&DeleteRequest { ids, namespace }),
                "delete",
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_filters_on_owner() {
        let body = serde_json::to_value(query_request("u1", &[0.5], 3)).unwrap();
        assert_eq!(body["namespace"], "u1");
        assert_eq!(body["topK"], 3);
        assert_eq!(body["filter"], json!({ "userId": { "$eq": "u1" } }));
        assert_eq!(body["includeMetadata"], true);
    }

    #[test]
    fn upsert_body_matches_wire_shape() {
        let v = PineconeVector {
            id: "a.pdf#k#1".into(),
            values: vec![0.25],
            metadata: Map::new(),
        };
        let body: Value = serde_json::from_slice(&upsert_body("u1", &[v]).unwrap()).unwrap();
        assert_eq!(body["namespace"], "u1");
        assert_eq!(body["vectors"][0]["id"], "a.pdf#k#1");
    }
}

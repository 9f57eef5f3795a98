//! Managed backend: one Pinecone namespace per user.

pub mod client;

use std::sync::Arc;

use async_trait::async_trait;
use services::ids::file_id_prefix;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::PineconeConfig,
    errors::RagError,
    metadata::{KEY_USER_ID, flatten, to_context_item},
    provider::{ProviderKind, VectorStoreProvider},
    record::{Embedding, FileRef, QueryResult, UpsertOptions},
};

pub use client::{HttpPineconeClient, ListPage, PineconeApi, PineconeMatch, PineconeVector};

const BACKEND: &str = "pinecone";

/// [`VectorStoreProvider`] over a Pinecone index.
pub struct PineconeStore {
    api: Arc<dyn PineconeApi>,
    upsert_batch: usize,
    upsert_max_bytes: usize,
    list_page_size: u32,
    delete_batch: usize,
}

impl PineconeStore {
    pub fn new(api: Arc<dyn PineconeApi>, cfg: &PineconeConfig) -> Self {
        Self {
            api,
            upsert_batch: cfg.upsert_batch.max(1),
            upsert_max_bytes: cfg.upsert_max_bytes.max(1),
            list_page_size: cfg.list_page_size.max(1),
            delete_batch: cfg.delete_batch.max(1),
        }
    }

    /// Builds the store over the REST client.
    pub fn from_config(cfg: &PineconeConfig) -> Result<Self, RagError> {
        Ok(Self::new(Arc::new(HttpPineconeClient::new(cfg)?), cfg))
    }

    /// Walks the id listing until the cursor runs out.
    async fn collect_ids(&self, namespace: &str, prefix: &str) -> Result<Vec<String>, RagError> {
        let mut ids = Vec::new();
        let mut token: Option<String> = None;
        let mut pages = 0usize;
        loop {
            let page = self
                .api
                .list_page(namespace, prefix, self.list_page_size, token.as_deref())
                .await?;
            pages += 1;
            ids.extend(page.ids);
            match page.next {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        debug!(target: "rag_store::pinecone", namespace, prefix, pages, ids = ids.len(), "listing complete");
        Ok(ids)
    }
}

/// Splits `vectors` into upsert requests holding at most `max_count` vectors
/// and at most `max_bytes` of serialized body. A single vector over the byte
/// budget still goes out alone.
fn plan_batches(
    namespace: &str,
    vectors: Vec<PineconeVector>,
    max_count: usize,
    max_bytes: usize,
) -> Result<Vec<Vec<PineconeVector>>, RagError> {
    let envelope = client::upsert_body(namespace, &[])?.len();
    let mut batches = Vec::new();
    let mut current: Vec<PineconeVector> = Vec::new();
    let mut size = envelope;

    for v in vectors {
        let len = serde_json::to_vec(&v)?.len();
        if !current.is_empty() && (current.len() >= max_count || size + 1 + len > max_bytes) {
            batches.push(std::mem::take(&mut current));
            size = envelope;
        }
        // Comma between array items.
        size += len + usize::from(!current.is_empty());
        current.push(v);
    }
    if !current.is_empty() {
        batches.push(current);
    }
    Ok(batches)
}

#[async_trait]
impl VectorStoreProvider for PineconeStore {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Pinecone
    }

    #[instrument(skip_all, fields(user_id = %user_id, total = embeddings.len()))]
    async fn upsert_document(
        &self,
        user_id: &str,
        embeddings: &[Embedding],
        _opts: UpsertOptions,
    ) -> Result<usize, RagError> {
        let total = embeddings.len();
        let vectors: Vec<PineconeVector> = embeddings
            .iter()
            .map(|e| PineconeVector {
                id: e.id.clone(),
                values: e.values.clone(),
                metadata: flatten(&e.metadata),
            })
            .collect();
        let batches = plan_batches(user_id, vectors, self.upsert_batch, self.upsert_max_bytes)?;
        debug!(target: "rag_store::pinecone", batches = batches.len(), "upsert planned");

        let mut committed = 0usize;
        for batch in &batches {
            let failure = match self.api.upsert(user_id, batch).await {
                Ok(n) if n == batch.len() => {
                    committed += n;
                    continue;
                }
                Ok(n) => {
                    committed += n.min(batch.len());
                    format!("pinecone acknowledged {n} of {} vectors", batch.len())
                }
                Err(e) => e.to_string(),
            };
            warn!(target: "rag_store::pinecone", committed, total, error = %failure, "upsert batch failed");
            return Err(RagError::PartialUpsert {
                backend: BACKEND,
                user_id: user_id.to_string(),
                committed,
                total,
                message: failure,
            });
        }

        info!(target: "rag_store::pinecone", committed, "upsert complete");
        Ok(committed)
    }

    async fn query(
        &self,
        user_id: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<QueryResult, RagError> {
        let matches = self
            .api
            .query(user_id, vector, top_k)
            .await
            .map_err(|e| e.for_user(BACKEND, user_id, None))?;

        let context = matches
            .into_iter()
            .filter_map(|m| {
                let meta = m.metadata?;
                let owner = meta.get(KEY_USER_ID).and_then(|v| v.as_str());
                if owner.is_some_and(|o| o != user_id) {
                    warn!(target: "rag_store::pinecone", id = %m.id, "dropping match from another owner");
                    return None;
                }
                Some(to_context_item(&meta, m.score))
            })
            .take(top_k)
            .collect();

        Ok(QueryResult { context })
    }

    #[instrument(skip_all, fields(user_id = %user_id, file = %file.name))]
    async fn delete_from_vector_db(
        &self,
        user_id: &str,
        file: &FileRef,
    ) -> Result<usize, RagError> {
        let prefix = file_id_prefix(&file.name, &file.key);
        let ids = self
            .collect_ids(user_id, &prefix)
            .await
            .map_err(|e| e.for_user(BACKEND, user_id, Some(&file.name)))?;
        if ids.is_empty() {
            return Ok(0);
        }

        let mut deleted = 0usize;
        for chunk in ids.chunks(self.delete_batch) {
            self.api
                .delete_ids(user_id, chunk)
                .await
                .map_err(|e| e.for_user(BACKEND, user_id, Some(&file.name)))?;
            deleted += chunk.len();
        }

        info!(target: "rag_store::pinecone", deleted, "vectors deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value};

    use super::*;
    use crate::config::PINECONE_MAX_UPSERT_BYTES;

    fn wide_vector(seq: usize, dim: usize) -> PineconeVector {
        let mut metadata = Map::new();
        metadata.insert("text".into(), Value::String("x".repeat(512)));
        metadata.insert("userId".into(), Value::String("u1".into()));
        PineconeVector {
            id: format!("report.pdf#k1#{seq}"),
            values: (0..dim).map(|i| -0.012_345_678 - i as f32 * 1e-7).collect(),
            metadata,
        }
    }

    #[test]
    fn full_width_batches_fit_the_request_limit() {
        let vectors: Vec<_> = (1..=100).map(|i| wide_vector(i, 3072)).collect();
        let batches = plan_batches("u1", vectors, 100, PINECONE_MAX_UPSERT_BYTES).unwrap();

        assert!(batches.len() > 1);
        assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), 100);
        for batch in &batches {
            let body = client::upsert_body("u1", batch).unwrap();
            assert!(body.len() <= PINECONE_MAX_UPSERT_BYTES, "body {} bytes", body.len());
            assert!(body.len() <= 2 * 1024 * 1024);
        }
        let ids: Vec<&str> = batches.iter().flatten().map(|v| v.id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"report.pdf#k1#1"));
        assert_eq!(ids.last(), Some(&"report.pdf#k1#100"));
    }

    #[test]
    fn small_vectors_are_capped_by_count() {
        let vectors: Vec<_> = (1..=250).map(|i| wide_vector(i, 4)).collect();
        let sizes: Vec<usize> = plan_batches("u1", vectors, 100, PINECONE_MAX_UPSERT_BYTES)
            .unwrap()
            .iter()
            .map(Vec::len)
            .collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[test]
    fn oversized_vector_goes_alone() {
        let vectors = vec![wide_vector(1, 4), wide_vector(2, 3072), wide_vector(3, 4)];
        let sizes: Vec<usize> = plan_batches("u1", vectors, 100, 1_000)
            .unwrap()
            .iter()
            .map(Vec::len)
            .collect();
        assert_eq!(sizes, vec![1, 1, 1]);
    }
}

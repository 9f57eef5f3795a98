//! Self-hosted backend: one shared Qdrant collection filtered by `userId`.

pub mod client;
pub mod filters;
pub mod scheduler;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::OnceCell;
use tracing::{info, instrument, warn};

use crate::{
    config::{QdrantConfig, UpsertSchedule},
    errors::RagError,
    metadata::{KEY_FILENAME, KEY_URL, flatten, to_context_item},
    provider::{ProviderKind, VectorStoreProvider},
    record::{Embedding, FileRef, QueryResult, UpsertOptions},
};

pub use client::{QdrantApi, QdrantFacade, QdrantPoint, ScoredPayload};
pub use filters::PayloadFilter;
pub use scheduler::{RequestLimiter, batch_size_for};

const BACKEND: &str = "qdrant";

/// [`VectorStoreProvider`] over a Qdrant collection.
pub struct QdrantStore {
    api: Arc<dyn QdrantApi>,
    schedule: UpsertSchedule,
    limiter: RequestLimiter,
    dimensions: usize,
    bootstrapped: OnceCell<()>,
}

impl QdrantStore {
    pub fn new(api: Arc<dyn QdrantApi>, schedule: UpsertSchedule, dimensions: usize) -> Self {
        Self {
            api,
            limiter: RequestLimiter::new(schedule.max_concurrent, schedule.min_spacing),
            schedule,
            dimensions,
            bootstrapped: OnceCell::new(),
        }
    }

    /// Builds the store over the gRPC facade.
    pub fn from_config(cfg: &QdrantConfig, dimensions: usize) -> Result<Self, RagError> {
        Ok(Self::new(
            Arc::new(QdrantFacade::new(cfg)?),
            cfg.schedule,
            dimensions,
        ))
    }

    async fn ensure_bootstrapped(&self) -> Result<(), RagError> {
        self.bootstrapped
            .get_or_try_init(|| self.api.ensure_collection(self.dimensions))
            .await
            .map(|_| ())
    }

    async fn upsert_batch(&self, index: usize, points: Vec<QdrantPoint>) -> Result<usize, RagError> {
        let label = format!("upsert batch {index}");
        scheduler::with_retry(&self.schedule, &label, |_| {
            let points = points.clone();
            async move {
                let _permit = self.limiter.acquire().await?;
                self.api.upsert(points).await
            }
        })
        .await
    }
}

#[async_trait]
impl VectorStoreProvider for QdrantStore {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Qdrant
    }

    #[instrument(skip_all, fields(user_id = %user_id, total = embeddings.len()))]
    async fn upsert_document(
        &self,
        user_id: &str,
        embeddings: &[Embedding],
        opts: UpsertOptions,
    ) -> Result<usize, RagError> {
        let total = embeddings.len();
        if total == 0 {
            return Ok(0);
        }
        if let Some(bad) = embeddings.iter().find(|e| e.values.len() != self.dimensions) {
            return Err(RagError::VectorSizeMismatch {
                got: bad.values.len(),
                want: self.dimensions,
            });
        }
        self.ensure_bootstrapped()
            .await
            .map_err(|e| e.for_user(BACKEND, user_id, None))?;

        let size = batch_size_for(total, opts.batch_percent);
        let batches: Vec<Vec<QdrantPoint>> = embeddings
            .chunks(size)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|e| QdrantPoint {
                        id: e.id.clone(),
                        user_id: user_id.to_string(),
                        values: e.values.clone(),
                        payload: flatten(&e.metadata),
                    })
                    .collect()
            })
            .collect();
        let batch_count = batches.len();

        let results: Vec<Result<usize, RagError>> = stream::iter(batches.into_iter().enumerate())
            .map(|(i, points)| self.upsert_batch(i, points))
            .buffer_unordered(self.schedule.max_concurrent.max(1))
            .collect()
            .await;

        let mut committed = 0usize;
        let mut last_error: Option<RagError> = None;
        for r in results {
            match r {
                Ok(n) => committed += n,
                Err(e) => last_error = Some(e),
            }
        }

        if let Some(e) = last_error {
            warn!(target: "rag_store::qdrant", committed, total, error = %e, "upsert exhausted retries");
            return Err(RagError::PartialUpsert {
                backend: BACKEND,
                user_id: user_id.to_string(),
                committed,
                total,
                message: e.to_string(),
            });
        }

        info!(target: "rag_store::qdrant", committed, batches = batch_count, batch_size = size, "upsert complete");
        Ok(committed)
    }

    async fn query(
        &self,
        user_id: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<QueryResult, RagError> {
        let filter = PayloadFilter::for_user(user_id);
        let hits = self
            .api
            .search(vector.to_vec(), top_k as u64, &filter)
            .await
            .map_err(|e| e.for_user(BACKEND, user_id, None))?;

        let context = hits
            .iter()
            .filter(|h| filter.matches(&h.payload))
            .take(top_k)
            .map(|h| to_context_item(&h.payload, h.score))
            .collect();
        Ok(QueryResult { context })
    }

    #[instrument(skip_all, fields(user_id = %user_id, file = %file.name))]
    async fn delete_from_vector_db(
        &self,
        user_id: &str,
        file: &FileRef,
    ) -> Result<usize, RagError> {
        let filter = PayloadFilter::for_user(user_id)
            .and(KEY_URL, &file.url)
            .and(KEY_FILENAME, &file.name);

        let found = self
            .api
            .count(&filter)
            .await
            .map_err(|e| e.for_user(BACKEND, user_id, Some(&file.name)))?;
        if found == 0 {
            return Ok(0);
        }

        self.api
            .delete(&filter)
            .await
            .map_err(|e| e.for_user(BACKEND, user_id, Some(&file.name)))?;

        info!(target: "rag_store::qdrant", deleted = found, "vectors deleted");
        Ok(found as usize)
    }
}

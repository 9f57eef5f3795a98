//! Runtime configuration for the vector backends and the embedding service.

use std::time::Duration;

use ai_llm_service::error_handler::{env_opt, env_or};

use crate::errors::RagError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine distance (recommended for most embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

/// Pacing of the self-hosted upsert path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpsertSchedule {
    /// Max batches in flight at once.
    pub max_concurrent: usize,
    /// Minimum delay between the start of two batch requests.
    pub min_spacing: Duration,
    /// Attempts per batch, first try included.
    pub attempts: u32,
    /// Backoff before the second attempt; doubles for each further attempt.
    pub base_backoff: Duration,
}

impl Default for UpsertSchedule {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            min_spacing: Duration::from_millis(100),
            attempts: 3,
            base_backoff: Duration::from_millis(500),
        }
    }
}

impl UpsertSchedule {
    /// Backoff to wait after failed attempt number `attempt` (1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Pinecone rejects upsert bodies above 2 MiB; stay a little below it.
pub const PINECONE_MAX_UPSERT_BYTES: usize = 2_000_000;

/// Managed backend (Pinecone data plane).
#[derive(Clone, Debug)]
pub struct PineconeConfig {
    pub api_key: String,
    /// Index host, e.g. `https://atlas-abc123.svc.us-east1-gcp.pinecone.io`.
    pub index_host: String,
    pub api_version: String,
    /// Max vectors per upsert request.
    pub upsert_batch: usize,
    /// Max serialized size of one upsert request body.
    pub upsert_max_bytes: usize,
    /// Page size of the id listing used by deletion.
    pub list_page_size: u32,
    /// Max ids per delete request.
    pub delete_batch: usize,
    pub timeout_secs: u64,
}

impl PineconeConfig {
    /// Reads `PINECONE_API_KEY` / `PINECONE_INDEX_HOST`; `None` when either is unset.
    pub fn from_env() -> Option<Self> {
        let api_key = env_opt("PINECONE_API_KEY")?;
        let host = env_opt("PINECONE_INDEX_HOST")?;
        let index_host = if host.starts_with("http://") || host.starts_with("https://") {
            host
        } else {
            format!("https://{host}")
        };
        Some(Self {
            api_key,
            index_host,
            api_version: "2024-07".into(),
            upsert_batch: 100,
            upsert_max_bytes: PINECONE_MAX_UPSERT_BYTES,
            list_page_size: 100,
            delete_batch: 1000,
            timeout_secs: 30,
        })
    }

    pub fn validate(&self) -> Result<(), RagError> {
        if self.api_key.trim().is_empty() {
            return Err(RagError::Config("pinecone api_key is empty".into()));
        }
        if self.upsert_batch == 0
            || self.upsert_max_bytes == 0
            || self.delete_batch == 0
            || self.list_page_size == 0
        {
            return Err(RagError::Config("pinecone batch sizes must be > 0".into()));
        }
        Ok(())
    }
}

/// Self-hosted backend (Qdrant collection).
#[derive(Clone, Debug)]
pub struct QdrantConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub url: String,
    /// Optional API key for Qdrant Cloud.
    pub api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
    /// Exact search flag (false = HNSW ANN).
    pub exact_search: bool,
    pub schedule: UpsertSchedule,
}

impl QdrantConfig {
    /// Creates a sane default config for a given collection name and Qdrant endpoint.
    pub fn new_default(url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
            collection: collection.into(),
            distance: DistanceKind::Cosine,
            exact_search: false,
            schedule: UpsertSchedule::default(),
        }
    }

    /// Reads `QDRANT_URL`, `QDRANT_API_KEY`, `QDRANT_COLLECTION`; `None` without a URL.
    pub fn from_env() -> Option<Self> {
        let url = env_opt("QDRANT_URL")?;
        let mut cfg = Self::new_default(url, env_or("QDRANT_COLLECTION", "atlas"));
        cfg.api_key = env_opt("QDRANT_API_KEY");
        Some(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.url.trim().is_empty() {
            return Err(RagError::Config("qdrant url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        if self.schedule.max_concurrent == 0 || self.schedule.attempts == 0 {
            return Err(RagError::Config(
                "upsert schedule needs max_concurrent > 0 and attempts > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Embedding service pacing and shape checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbeddingConfig {
    /// Pause between two consecutive embedding calls of one document.
    pub delay: Duration,
    /// Expected vector width; `None` skips the check.
    pub dimensions: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(13),
            dimensions: Some(3072),
        }
    }
}

impl EmbeddingConfig {
    /// Reads `EMBEDDING_DELAY_MS` on top of the given dimension.
    pub fn from_env(dimensions: Option<usize>) -> Result<Self, RagError> {
        let delay_ms = match env_opt("EMBEDDING_DELAY_MS") {
            Some(v) => v.trim().parse::<u64>().map_err(|_| {
                RagError::Config("EMBEDDING_DELAY_MS must be an integer".into())
            })?,
            None => 13,
        };
        Ok(Self {
            delay: Duration::from_millis(delay_ms),
            dimensions,
        })
    }
}

/// Everything needed to build the backend registry.
#[derive(Clone, Debug, Default)]
pub struct VectorStoreConfig {
    pub pinecone: Option<PineconeConfig>,
    pub qdrant: Option<QdrantConfig>,
    /// Vector width used when bootstrapping a Qdrant collection.
    pub dimensions: usize,
}

impl VectorStoreConfig {
    pub fn from_env(dimensions: usize) -> Self {
        Self {
            pinecone: PineconeConfig::from_env(),
            qdrant: QdrantConfig::from_env(),
            dimensions,
        }
    }

    pub fn validate(&self) -> Result<(), RagError> {
        if let Some(p) = &self.pinecone {
            p.validate()?;
        }
        if let Some(q) = &self.qdrant {
            q.validate()?;
        }
        if self.dimensions == 0 {
            return Err(RagError::Config("embedding dimension must be > 0".into()));
        }
        Ok(())
    }
}

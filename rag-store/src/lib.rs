//! Vector store layer for the Atlas pipelines.
//!
//! This crate provides:
//! - [`VectorStoreProvider`]: upsert / query / delete scoped to one user namespace
//! - two backends: [`PineconeStore`] (managed, namespace per user) and
//!   [`QdrantStore`] (self-hosted, `userId` payload filter)
//! - [`VectorStoreRegistry`] resolving a backend from a [`ProviderKind`]
//! - [`EmbeddingService`] turning chunks and messages into vectors
//! - the flatten/unflatten boundary for chunk metadata ([`metadata`])

mod config;
mod embed;
mod errors;
pub mod metadata;
pub mod pinecone;
mod provider;
pub mod qdrant;
mod record;

use std::sync::Arc;

use tracing::info;

pub use config::{
    DistanceKind, EmbeddingConfig, PINECONE_MAX_UPSERT_BYTES, PineconeConfig, QdrantConfig,
    UpsertSchedule, VectorStoreConfig,
};
pub use embed::{EmbeddingService, EmbeddingsProvider, ProfilesEmbedder};
pub use errors::RagError;
pub use pinecone::PineconeStore;
pub use provider::{ProviderKind, VectorStoreProvider, VectorStoreRegistry};
pub use qdrant::QdrantStore;
pub use record::{
    Chunk, ChunkMetadata, ContextItem, Embedding, EmbeddingMetadata, FileRef, QueryResult,
    UpsertOptions, citation,
};

/// Builds a registry with every backend that has configuration.
///
/// # Errors
/// Returns `RagError::Config` if a present backend config is invalid or its
/// client cannot be constructed.
pub fn build_registry(cfg: &VectorStoreConfig) -> Result<VectorStoreRegistry, RagError> {
    cfg.validate()?;
    let mut registry = VectorStoreRegistry::new();

    if let Some(p) = &cfg.pinecone {
        registry = registry.with(Arc::new(PineconeStore::from_config(p)?));
    }
    if let Some(q) = &cfg.qdrant {
        registry = registry.with(Arc::new(QdrantStore::from_config(q, cfg.dimensions)?));
    }

    info!(
        target: "rag_store",
        available = ?registry.available(),
        "vector store registry built"
    );
    Ok(registry)
}

//! Backend-agnostic vector store contract and the per-process registry.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    errors::RagError,
    record::{Embedding, FileRef, QueryResult, UpsertOptions},
};

/// Vector store operations every backend provides.
///
/// All calls are scoped to exactly one user namespace.
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> ProviderKind;

    /// Upserts all `embeddings` for `user_id`, batching internally.
    ///
    /// Returns the number of embeddings committed. On failure the error
    /// reports how many were committed before it.
    async fn upsert_document(
        &self,
        user_id: &str,
        embeddings: &[Embedding],
        opts: UpsertOptions,
    ) -> Result<usize, RagError>;

    /// Returns at most `top_k` nearest neighbors inside the user's namespace.
    async fn query(
        &self,
        user_id: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<QueryResult, RagError>;

    /// Deletes every vector of `file` in the user's namespace. Zero matches is `Ok(0)`.
    async fn delete_from_vector_db(&self, user_id: &str, file: &FileRef)
    -> Result<usize, RagError>;
}

/// Closed set of supported backends.
///
/// `Pinecone` is the managed, namespace-partitioned index; `Qdrant` is the
/// self-hosted collection filtered by `userId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Pinecone,
    Qdrant,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Pinecone => "pinecone",
            ProviderKind::Qdrant => "qdrant",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holds the configured backends and resolves one by kind.
#[derive(Clone, Default)]
pub struct VectorStoreRegistry {
    pinecone: Option<Arc<dyn VectorStoreProvider>>,
    qdrant: Option<Arc<dyn VectorStoreProvider>>,
}

impl VectorStoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider` under its own [`VectorStoreProvider::kind`].
    pub fn with(mut self, provider: Arc<dyn VectorStoreProvider>) -> Self {
        match provider.kind() {
            ProviderKind::Pinecone => self.pinecone = Some(provider),
            ProviderKind::Qdrant => self.qdrant = Some(provider),
        }
        self
    }

    /// Resolves the backend for `kind`.
    ///
    /// # Errors
    /// [`RagError::ProviderUnavailable`] when that backend is not configured.
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn VectorStoreProvider>, RagError> {
        let slot = match kind {
            ProviderKind::Pinecone => &self.pinecone,
            ProviderKind::Qdrant => &self.qdrant,
        };
        slot.clone().ok_or(RagError::ProviderUnavailable(kind))
    }

    /// Kinds that are currently available.
    pub fn available(&self) -> Vec<ProviderKind> {
        let mut out = Vec::with_capacity(2);
        if self.pinecone.is_some() {
            out.push(ProviderKind::Pinecone);
        }
        if self.qdrant.is_some() {
            out.push(ProviderKind::Qdrant);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProviderKind::Qdrant).unwrap(),
            "\"qdrant\""
        );
        let k: ProviderKind = serde_json::from_str("\"pinecone\"").unwrap();
        assert_eq!(k, ProviderKind::Pinecone);
    }

    #[test]
    fn missing_backend_is_unavailable() {
        let reg = VectorStoreRegistry::new();
        assert!(matches!(
            reg.get(ProviderKind::Qdrant),
            Err(RagError::ProviderUnavailable(ProviderKind::Qdrant))
        ));
        assert!(reg.available().is_empty());
    }
}

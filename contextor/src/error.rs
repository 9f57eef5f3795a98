//! Typed error for the contextor crate.

use ai_llm_service::AiLlmError;
use thiserror::Error;
use user_store::UserStoreError;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Errors from the underlying rag-store crate.
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// Rerank provider failure.
    #[error("rerank failed: {0}")]
    Rerank(#[from] AiLlmError),

    /// User settings could not be loaded.
    #[error("user lookup failed: {0}")]
    User(#[from] UserStoreError),
}

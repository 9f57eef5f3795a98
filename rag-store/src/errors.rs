//! Unified error types for the crate.

use ai_llm_service::AiLlmError;
use thiserror::Error;

use crate::provider::ProviderKind;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The selected backend has no configuration in this process.
    #[error("vector store provider '{0}' is not configured")]
    ProviderUnavailable(ProviderKind),

    /// Mismatch between a returned vector and the configured dimension.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Embedding provider failure.
    #[error("embedding failed: {0}")]
    Embedding(#[from] AiLlmError),

    /// Raw transport or protocol failure talking to a backend.
    #[error("{backend} request failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        backend: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// Backend call failed on behalf of a user (and file, where known).
    #[error("{backend} failed for user '{user_id}'{}: {message}", .file.as_ref().map(|f| format!(" file '{f}'")).unwrap_or_default())]
    Backend {
        backend: &'static str,
        user_id: String,
        file: Option<String>,
        message: String,
    },

    /// Upsert stopped after some batches were committed.
    #[error("{backend} upsert failed for user '{user_id}' after {committed}/{total} embeddings were committed: {message}")]
    PartialUpsert {
        backend: &'static str,
        user_id: String,
        committed: usize,
        total: usize,
        message: String,
    },
}

impl RagError {
    /// Attaches the owning user (and optional file) to a low-level failure.
    pub fn for_user(self, backend: &'static str, user_id: &str, file: Option<&str>) -> Self {
        match self {
            e @ (RagError::Backend { .. } | RagError::PartialUpsert { .. }) => e,
            other => RagError::Backend {
                backend,
                user_id: user_id.to_string(),
                file: file.map(str::to_string),
                message: other.to_string(),
            },
        }
    }
}

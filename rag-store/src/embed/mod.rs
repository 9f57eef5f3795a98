//! Embedding providers and the document/message embedding service.

use crate::errors::RagError;
use std::{future::Future, pin::Pin};

/// Provider interface for embedding generation.
///
/// Async is required because real providers (OpenAI, Ollama) perform HTTP
/// requests. Implement this trait to plug in another backend or a test fake.
pub trait EmbeddingsProvider: Send + Sync {
    /// Embeds a single text.
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>>;
}

pub mod profiles;
pub mod service;

pub use profiles::ProfilesEmbedder;
pub use service::EmbeddingService;

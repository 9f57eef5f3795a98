//! Embedding provider backed by the shared AI profiles (OpenAI or Ollama).

use std::sync::Arc;

use ai_llm_service::service_profiles::LlmServiceProfiles;

use crate::{EmbeddingsProvider, RagError};

/// Routes embedding calls to the `embedding` profile of [`LlmServiceProfiles`].
#[derive(Clone)]
pub struct ProfilesEmbedder {
    svc: Arc<LlmServiceProfiles>,
}

impl ProfilesEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }
}

impl EmbeddingsProvider for ProfilesEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>>
    {
        Box::pin(async move { Ok(self.svc.embed(text).await?) })
    }
}

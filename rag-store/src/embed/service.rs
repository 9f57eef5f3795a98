//! Embedding service: one provider call per chunk, paced, with id/citation assignment.

use std::{sync::Arc, time::Instant};

use services::ids::embedding_id;
use tracing::{debug, info, instrument};

use crate::{
    config::EmbeddingConfig,
    embed::EmbeddingsProvider,
    errors::RagError,
    record::{Chunk, Embedding, EmbeddingMetadata, FileRef, citation},
};

/// Turns texts into vectors through an [`EmbeddingsProvider`].
#[derive(Clone)]
pub struct EmbeddingService {
    provider: Arc<dyn EmbeddingsProvider>,
    cfg: EmbeddingConfig,
}

impl EmbeddingService {
    pub fn new(provider: Arc<dyn EmbeddingsProvider>, cfg: EmbeddingConfig) -> Self {
        Self { provider, cfg }
    }

    /// Embeds a single chat message.
    pub async fn embed_message(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let v = self.provider.embed(text).await?;
        self.check_dim(&v)?;
        Ok(v)
    }

    /// Embeds every chunk of `file` in order, one call per chunk.
    ///
    /// Ids are `asciiSafe(name)#key#seq` with `seq` starting at 1, so the
    /// same chunk list always yields the same ids. Calls are separated by
    /// the configured delay to stay under the provider's rate limit.
    #[instrument(skip_all, fields(user_id = %user_id, file = %file.name, chunks = chunks.len()))]
    pub async fn embed_document(
        &self,
        user_id: &str,
        file: &FileRef,
        chunks: &[Chunk],
    ) -> Result<Vec<Embedding>, RagError> {
        let started = Instant::now();
        let mut out = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 && !self.cfg.delay.is_zero() {
                tokio::time::sleep(self.cfg.delay).await;
            }
            let values = self.provider.embed(&chunk.text).await?;
            self.check_dim(&values)?;

            let seq = i + 1;
            out.push(Embedding {
                id: embedding_id(&file.name, &file.key, seq),
                values,
                metadata: EmbeddingMetadata {
                    text: chunk.text.clone(),
                    user_id: user_id.to_string(),
                    url: file.url.clone(),
                    citation: citation(&file.name, &file.url, chunk.metadata.page_number),
                    filename: file.name.clone(),
                    chunk: chunk.metadata.clone(),
                },
            });
            debug!(target: "rag_store::embed", seq, "chunk embedded");
        }

        info!(
            target: "rag_store::embed",
            embeddings = out.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "document embedded"
        );
        Ok(out)
    }

    fn check_dim(&self, v: &[f32]) -> Result<(), RagError> {
        match self.cfg.dimensions {
            Some(want) if v.len() != want => Err(RagError::VectorSizeMismatch {
                got: v.len(),
                want,
            }),
            _ => Ok(()),
        }
    }
}

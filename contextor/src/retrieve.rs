//! One chat turn of knowledgebase retrieval.
//!
//! embed(message) → query(top-K in the user's namespace) → rerank(top-N) →
//! threshold → format. Each stage reports a status event. A failure
//! anywhere emits `Error` and degrades to the bare user message; `Done` is
//! always the last event and carries the final context string.

use std::sync::Arc;

use rag_store::{EmbeddingService, VectorStoreRegistry};
use serde::{Deserialize, Serialize};
use services::events::{DEFAULT_EVENT_CAPACITY, EventItem, EventSink};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};
use user_store::UserRepository;

use crate::{
    cfg::RetrievalParams,
    error::ContextorError,
    personalization::personalize,
    prompt,
    rerank::{Reranker, apply_threshold},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetrievalStatus {
    #[serde(rename = "Retrieving context")]
    RetrievingContext,
    #[serde(rename = "Embedding complete")]
    EmbeddingComplete,
    #[serde(rename = "Query complete")]
    QueryComplete,
    #[serde(rename = "Reranking complete")]
    RerankingComplete,
    Error,
    Done,
}

pub type RetrievalSink = EventSink<RetrievalStatus, ContextorError>;
pub type RetrievalEvent = EventItem<RetrievalStatus, ContextorError>;

/// How a turn ended; each variant maps to a distinct context wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalOutcome {
    Documents(usize),
    NoCandidates,
    BelowThreshold,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    pub outcome: RetrievalOutcome,
    pub context: String,
}

pub struct RetrievalPipeline {
    users: Arc<dyn UserRepository>,
    embedder: EmbeddingService,
    stores: Arc<VectorStoreRegistry>,
    reranker: Arc<dyn Reranker>,
}

impl RetrievalPipeline {
    pub fn new(
        users: Arc<dyn UserRepository>,
        embedder: EmbeddingService,
        stores: Arc<VectorStoreRegistry>,
        reranker: Arc<dyn Reranker>,
    ) -> Self {
        Self {
            users,
            embedder,
            stores,
            reranker,
        }
    }

    /// Runs a turn in the background and hands back its event stream.
    pub fn spawn(self: Arc<Self>, user_id: String, message: String) -> mpsc::Receiver<RetrievalEvent> {
        let (sink, rx) = EventSink::channel(DEFAULT_EVENT_CAPACITY);
        tokio::spawn(async move {
            self.run(&user_id, &message, &sink).await;
        });
        rx
    }

    /// Builds the context for `message`. Never fails: errors are reported as
    /// an `Error` event and the context falls back to the message alone.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn run(&self, user_id: &str, message: &str, sink: &RetrievalSink) -> RetrievalResult {
        sink.emit(RetrievalStatus::RetrievingContext, "Retrieving context")
            .await;

        let result = match self.retrieve(user_id, message, sink).await {
            Ok(r) => r,
            Err(e) => {
                warn!(target: "contextor::retrieve", error = %e, "retrieval failed; continuing without context");
                sink.emit(RetrievalStatus::Error, e.to_string()).await;
                RetrievalResult {
                    outcome: RetrievalOutcome::Failed,
                    context: prompt::message_only(message),
                }
            }
        };

        sink.emit(RetrievalStatus::Done, result.context.clone()).await;
        result
    }

    async fn retrieve(
        &self,
        user_id: &str,
        message: &str,
        sink: &RetrievalSink,
    ) -> Result<RetrievalResult, ContextorError> {
        let record = self.users.get(user_id).await?;
        let params = RetrievalParams::from_settings(&record.settings.knowledgebase);
        let store = self
            .stores
            .get(record.settings.forge.vectorization_provider)?;

        let vector = self.embedder.embed_message(message).await?;
        sink.emit(RetrievalStatus::EmbeddingComplete, "Embedding complete")
            .await;

        let candidates = store.query(user_id, &vector, params.top_k).await?.context;
        sink.emit(
            RetrievalStatus::QueryComplete,
            format!("Query complete: {} candidates", candidates.len()),
        )
        .await;

        let (outcome, context) = if candidates.is_empty() {
            (RetrievalOutcome::NoCandidates, prompt::no_candidates(message))
        } else {
            let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
            let hits = self.reranker.rerank(message, &texts, params.top_n).await?;
            let kept = apply_threshold(&candidates, &hits, params.threshold);
            if kept.is_empty() {
                (
                    RetrievalOutcome::BelowThreshold,
                    prompt::below_threshold(message, params.threshold),
                )
            } else {
                (
                    RetrievalOutcome::Documents(kept.len()),
                    prompt::format_documents(message, &kept),
                )
            }
        };

        let context = if record.settings.personalization.enabled {
            personalize(context, &record.profile)
        } else {
            context
        };

        sink.emit(RetrievalStatus::RerankingComplete, context.clone())
            .await;
        info!(target: "contextor::retrieve", outcome = ?outcome, "context built");
        Ok(RetrievalResult { outcome, context })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_use_display_names() {
        let s = serde_json::to_string(&RetrievalStatus::RerankingComplete).unwrap();
        assert_eq!(s, "\"Reranking complete\"");
        assert_eq!(serde_json::to_string(&RetrievalStatus::Done).unwrap(), "\"Done\"");
    }
}

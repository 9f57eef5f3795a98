//! Reranking retrieved candidates and applying the relevance threshold.

use std::sync::Arc;

use ai_llm_service::{AiLlmError, LlmServiceProfiles, RerankHit};
use async_trait::async_trait;
use rag_store::ContextItem;
use tracing::debug;

/// Orders `documents` by relevance to `query`, returning at most `top_n`.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankHit>, AiLlmError>;
}

/// Cohere rerank through the shared provider profiles.
pub struct RerankService {
    svc: Arc<LlmServiceProfiles>,
}

impl RerankService {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }
}

#[async_trait]
impl Reranker for RerankService {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankHit>, AiLlmError> {
        self.svc.rerank(query, documents, top_n).await
    }
}

/// A candidate that survived reranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedDocument {
    pub item: ContextItem,
    pub relevance: f32,
}

/// Keeps hits with `relevance >= threshold`, in rerank order.
///
/// Hits pointing outside `candidates` are dropped.
pub fn apply_threshold(
    candidates: &[ContextItem],
    hits: &[RerankHit],
    threshold: f32,
) -> Vec<RankedDocument> {
    let kept: Vec<RankedDocument> = hits
        .iter()
        .filter(|h| h.relevance_score >= threshold)
        .filter_map(|h| {
            candidates.get(h.index).map(|item| RankedDocument {
                item: item.clone(),
                relevance: h.relevance_score,
            })
        })
        .collect();
    debug!(
        target: "contextor::rerank",
        hits = hits.len(),
        kept = kept.len(),
        threshold,
        "threshold applied"
    );
    kept
}

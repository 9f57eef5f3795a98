//! Retrieval turns over in-memory fakes.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    time::Duration,
};

use ai_llm_service::{AiLlmError, ConfigError, RerankHit};
use async_trait::async_trait;
use contextor::{
    Reranker, RetrievalEvent, RetrievalOutcome, RetrievalPipeline, RetrievalStatus, prompt,
};
use rag_store::{
    ContextItem, Embedding, EmbeddingConfig, EmbeddingService, EmbeddingsProvider, FileRef,
    ProviderKind, QueryResult, RagError, UpsertOptions, VectorStoreProvider, VectorStoreRegistry,
};
use services::events::EventSink;
use tokio::sync::mpsc;
use user_store::{InMemoryUserRepository, UserRecord};

const DIM: usize = 3;
const USER: &str = "u1";

struct FakeEmbedder;

impl EmbeddingsProvider for FakeEmbedder {
    fn embed<'a>(
        &'a self,
        _text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>> {
        Box::pin(async { Ok(vec![0.5; DIM]) })
    }
}

struct FakeStore {
    items: Vec<ContextItem>,
    queried: Mutex<Vec<(String, usize)>>,
}

#[async_trait]
impl VectorStoreProvider for FakeStore {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Qdrant
    }

    async fn upsert_document(
        &self,
        _: &str,
        e: &[Embedding],
        _: UpsertOptions,
    ) -> Result<usize, RagError> {
        Ok(e.len())
    }

    async fn query(&self, user_id: &str, _: &[f32], top_k: usize) -> Result<QueryResult, RagError> {
        self.queried
            .lock()
            .unwrap()
            .push((user_id.to_string(), top_k));
        Ok(QueryResult {
            context: self
                .items
                .iter()
                .filter(|i| i.user_id == user_id)
                .take(top_k)
                .cloned()
                .collect(),
        })
    }

    async fn delete_from_vector_db(&self, _: &str, _: &FileRef) -> Result<usize, RagError> {
        Ok(0)
    }
}

/// Scores candidates in submission order; `None` simulates a provider outage.
struct FakeReranker {
    scores: Option<Vec<f32>>,
}

#[async_trait]
impl Reranker for FakeReranker {
    async fn rerank(
        &self,
        _query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankHit>, AiLlmError> {
        let Some(scores) = &self.scores else {
            return Err(ConfigError::MissingVar("COHERE_API_KEY").into());
        };
        let mut hits: Vec<RerankHit> = scores
            .iter()
            .take(documents.len())
            .enumerate()
            .map(|(index, &relevance_score)| RerankHit {
                index,
                relevance_score,
            })
            .collect();
        hits.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        hits.truncate(top_n);
        Ok(hits)
    }
}

fn candidate(user: &str, n: usize) -> ContextItem {
    ContextItem {
        text: format!("chunk {n}"),
        filename: "report.pdf".into(),
        filetype: "application/pdf".into(),
        languages: "eng".into(),
        page_number: Some(n.to_string()),
        user_id: user.into(),
        url: "https://utfs.io/f/k".into(),
        citation: format!("[report.pdf, page {n}](https://utfs.io/f/k)"),
        score: 0.8,
    }
}

fn record(threshold: u8) -> UserRecord {
    let mut rec = UserRecord::new(USER);
    rec.settings.forge.vectorization_provider = ProviderKind::Qdrant;
    rec.settings.knowledgebase.reranking_threshold = threshold;
    rec.settings.knowledgebase.top_k = 20;
    rec.settings.knowledgebase.top_n = 5;
    rec
}

fn pipeline(
    rec: UserRecord,
    items: Vec<ContextItem>,
    scores: Option<Vec<f32>>,
) -> (RetrievalPipeline, Arc<FakeStore>) {
    let store = Arc::new(FakeStore {
        items,
        queried: Mutex::new(Vec::new()),
    });
    let embedder = EmbeddingService::new(
        Arc::new(FakeEmbedder),
        EmbeddingConfig {
            delay: Duration::ZERO,
            dimensions: Some(DIM),
        },
    );
    let p = RetrievalPipeline::new(
        Arc::new(InMemoryUserRepository::with_user(rec)),
        embedder,
        Arc::new(VectorStoreRegistry::new().with(store.clone())),
        Arc::new(FakeReranker { scores }),
    );
    (p, store)
}

async fn drain(mut rx: mpsc::Receiver<RetrievalEvent>) -> Vec<(RetrievalStatus, String)> {
    let mut out = Vec::new();
    while let Some(Ok(ev)) = rx.recv().await {
        out.push((ev.status, ev.message));
    }
    out
}

#[tokio::test]
async fn threshold_keeps_boundary_scores() {
    let items = (1..=3).map(|n| candidate(USER, n)).collect();
    let (p, _) = pipeline(record(50), items, Some(vec![0.9, 0.5, 0.1]));
    let rx = Arc::new(p).spawn(USER.into(), "What grew?".into());
    let events = drain(rx).await;

    use RetrievalStatus::*;
    let statuses: Vec<_> = events.iter().map(|(s, _)| *s).collect();
    assert_eq!(
        statuses,
        vec![RetrievingContext, EmbeddingComplete, QueryComplete, RerankingComplete, Done]
    );

    let context = &events[3].1;
    assert!(context.starts_with(
        "The following are the top 2 most relevant documents for the user message: \"What grew?\""
    ));
    assert!(context.contains("Text: chunk 1"));
    assert!(context.contains("Text: chunk 2"));
    assert!(!context.contains("Text: chunk 3"));
    assert!(context.contains("Relevance Score: 0.5000"));
    assert_eq!(&events[4].1, context);
}

#[tokio::test]
async fn no_candidates_and_all_filtered_are_distinct() {
    let (empty, _) = pipeline(record(50), Vec::new(), Some(vec![]));
    let (sink, _rx) = EventSink::channel(16);
    let a = empty.run(USER, "hello", &sink).await;
    assert_eq!(a.outcome, RetrievalOutcome::NoCandidates);
    assert_eq!(a.context, prompt::no_candidates("hello"));

    let items = (1..=2).map(|n| candidate(USER, n)).collect();
    let (filtered, _) = pipeline(record(80), items, Some(vec![0.3, 0.2]));
    let (sink, _rx) = EventSink::channel(16);
    let b = filtered.run(USER, "hello", &sink).await;
    assert_eq!(b.outcome, RetrievalOutcome::BelowThreshold);
    assert_eq!(b.context, prompt::below_threshold("hello", 0.8));

    assert_ne!(a.context, b.context);
    assert!(a.context.contains("hello") && b.context.contains("hello"));
}

#[tokio::test]
async fn rerank_failure_degrades_to_message_and_still_finishes() {
    let items = vec![candidate(USER, 1)];
    let (p, _) = pipeline(record(50), items, None);
    let (sink, rx) = EventSink::channel(16);
    let result = p.run(USER, "hello", &sink).await;
    drop(sink);
    let events = drain(rx).await;

    assert_eq!(result.outcome, RetrievalOutcome::Failed);
    assert_eq!(result.context, "User message: \"hello\"");
    let n = events.len();
    assert_eq!(events[n - 2].0, RetrievalStatus::Error);
    assert!(events[n - 2].1.contains("COHERE_API_KEY"));
    assert_eq!(events[n - 1], (RetrievalStatus::Done, result.context.clone()));
}

#[tokio::test]
async fn unknown_user_still_gets_done() {
    let (p, store) = pipeline(record(50), Vec::new(), Some(vec![]));
    let (sink, rx) = EventSink::channel(16);
    p.run("nobody", "hi", &sink).await;
    drop(sink);
    let events = drain(rx).await;
    assert_eq!(events.last().unwrap().0, RetrievalStatus::Done);
    assert!(store.queried.lock().unwrap().is_empty());
}

#[tokio::test]
async fn query_is_scoped_to_the_session_user() {
    let items = vec![candidate("other", 1), candidate(USER, 2)];
    let (p, store) = pipeline(record(0), items, Some(vec![0.9, 0.9]));
    let (sink, _rx) = EventSink::channel(16);
    let r = p.run(USER, "q", &sink).await;
    assert_eq!(r.outcome, RetrievalOutcome::Documents(1));
    assert!(r.context.contains("chunk 2"));
    assert!(!r.context.contains("chunk 1"));
    assert_eq!(store.queried.lock().unwrap()[0], (USER.to_string(), 20));
}

#[tokio::test]
async fn personalization_appends_profile() {
    let mut rec = record(50);
    rec.settings.personalization.enabled = true;
    rec.profile.name = Some("Ada".into());
    rec.profile.country = Some("FR".into());
    rec.profile.language = Some("fr".into());
    let (p, _) = pipeline(rec, vec![candidate(USER, 1)], Some(vec![0.7]));
    let (sink, _rx) = EventSink::channel(16);
    let r = p.run(USER, "q", &sink).await;
    assert!(r.context.contains("End of retrieved documents.\n\nUser profile:\nName: Ada"));
    assert!(r.context.contains("Country: France"));
    assert!(r.context.ends_with("Language: French"));
}

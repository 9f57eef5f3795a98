//! Both backends driven through in-memory fakes of their client traits.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use rag_store::{
    ChunkMetadata, Embedding, EmbeddingMetadata, FileRef, PINECONE_MAX_UPSERT_BYTES,
    PineconeConfig, PineconeStore,
    QdrantStore, RagError, UpsertOptions, UpsertSchedule, VectorStoreProvider,
    pinecone::{ListPage, PineconeApi, PineconeMatch, PineconeVector},
    qdrant::{PayloadFilter, QdrantApi, QdrantPoint, ScoredPayload},
};
use services::ids::embedding_id;

const DIM: usize = 4;

fn file(name: &str, key: &str) -> FileRef {
    FileRef {
        name: name.into(),
        key: key.into(),
        url: format!("https://files/{key}"),
    }
}

fn embeddings(user: &str, f: &FileRef, n: usize) -> Vec<Embedding> {
    (1..=n)
        .map(|seq| Embedding {
            id: embedding_id(&f.name, &f.key, seq),
            values: vec![seq as f32; DIM],
            metadata: EmbeddingMetadata {
                text: format!("chunk {seq}"),
                user_id: user.into(),
                url: f.url.clone(),
                citation: format!("[{}]({})", f.name, f.url),
                filename: f.name.clone(),
                chunk: ChunkMetadata::default(),
            },
        })
        .collect()
}

/* ----------------------------- Pinecone fake ----------------------------- */

#[derive(Default)]
struct FakePinecone {
    /// namespace -> id -> vector
    data: Mutex<BTreeMap<String, BTreeMap<String, PineconeVector>>>,
    list_calls: Mutex<usize>,
    upsert_calls: Mutex<usize>,
    fail_upsert_call: Option<usize>,
    /// This upsert call acknowledges one vector fewer than it was sent.
    short_ack_call: Option<usize>,
}

#[async_trait]
impl PineconeApi for FakePinecone {
    async fn upsert(&self, namespace: &str, vectors: &[PineconeVector]) -> Result<usize, RagError> {
        let call = {
            let mut c = self.upsert_calls.lock().unwrap();
            *c += 1;
            *c
        };
        if self.fail_upsert_call == Some(call) {
            return Err(RagError::Transport {
                backend: "pinecone",
                status: Some(500),
                message: "boom".into(),
            });
        }
        let mut data = self.data.lock().unwrap();
        let ns = data.entry(namespace.to_string()).or_default();
        for v in vectors {
            ns.insert(v.id.clone(), v.clone());
        }
        if self.short_ack_call == Some(call) {
            return Ok(vectors.len() - 1);
        }
        Ok(vectors.len())
    }

    async fn query(
        &self,
        namespace: &str,
        _vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<PineconeMatch>, RagError> {
        let data = self.data.lock().unwrap();
        Ok(data
            .get(namespace)
            .map(|ns| {
                ns.values()
                    .take(top_k)
                    .map(|v| PineconeMatch {
                        id: v.id.clone(),
                        score: 0.5,
                        metadata: Some(v.metadata.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_page(
        &self,
        namespace: &str,
        prefix: &str,
        limit: u32,
        pagination_token: Option<&str>,
    ) -> Result<ListPage, RagError> {
        *self.list_calls.lock().unwrap() += 1;
        let data = self.data.lock().unwrap();
        let ids: Vec<String> = data
            .get(namespace)
            .map(|ns| ns.keys().filter(|k| k.starts_with(prefix)).cloned().collect())
            .unwrap_or_default();
        let start: usize = pagination_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + limit as usize).min(ids.len());
        Ok(ListPage {
            ids: ids[start..end].to_vec(),
            next: (end < ids.len()).then(|| end.to_string()),
        })
    }

    async fn delete_ids(&self, namespace: &str, ids: &[String]) -> Result<(), RagError> {
        let mut data = self.data.lock().unwrap();
        if let Some(ns) = data.get_mut(namespace) {
            for id in ids {
                ns.remove(id);
            }
        }
        Ok(())
    }
}

fn pinecone_cfg() -> PineconeConfig {
    PineconeConfig {
        api_key: "test".into(),
        index_host: "https://index".into(),
        api_version: "2024-07".into(),
        upsert_batch: 100,
        upsert_max_bytes: PINECONE_MAX_UPSERT_BYTES,
        list_page_size: 100,
        delete_batch: 1000,
        timeout_secs: 5,
    }
}

#[tokio::test]
async fn pinecone_deletes_across_many_pages() {
    let fake = Arc::new(FakePinecone::default());
    let store = PineconeStore::new(fake.clone(), &pinecone_cfg());
    let big = file("manual.pdf", "k-big");
    let other = file("other.pdf", "k-other");

    store
        .upsert_document("u1", &embeddings("u1", &big, 250), UpsertOptions::default())
        .await
        .unwrap();
    store
        .upsert_document("u1", &embeddings("u1", &other, 3), UpsertOptions::default())
        .await
        .unwrap();

    let deleted = store.delete_from_vector_db("u1", &big).await.unwrap();
    assert_eq!(deleted, 250);
    assert_eq!(*fake.list_calls.lock().unwrap(), 3);

    let data = fake.data.lock().unwrap();
    let ns = &data["u1"];
    assert_eq!(ns.len(), 3);
    assert!(ns.keys().all(|k| k.starts_with("other.pdf#k-other#")));
}

#[tokio::test]
async fn pinecone_delete_without_matches_returns_zero() {
    let store = PineconeStore::new(Arc::new(FakePinecone::default()), &pinecone_cfg());
    let n = store
        .delete_from_vector_db("u1", &file("ghost.pdf", "k0"))
        .await
        .unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn pinecone_partial_upsert_reports_committed_count() {
    let fake = Arc::new(FakePinecone {
        fail_upsert_call: Some(2),
        ..Default::default()
    });
    let store = PineconeStore::new(fake, &pinecone_cfg());
    let f = file("a.pdf", "k1");

    let err = store
        .upsert_document("u1", &embeddings("u1", &f, 250), UpsertOptions::default())
        .await
        .unwrap_err();
    match err {
        RagError::PartialUpsert {
            user_id,
            committed,
            total,
            ..
        } => {
            assert_eq!(user_id, "u1");
            assert_eq!(committed, 100);
            assert_eq!(total, 250);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn pinecone_short_acknowledgement_is_a_partial_upsert() {
    let fake = Arc::new(FakePinecone {
        short_ack_call: Some(1),
        ..Default::default()
    });
    let store = PineconeStore::new(fake.clone(), &pinecone_cfg());
    let f = file("a.pdf", "k1");

    let err = store
        .upsert_document("u1", &embeddings("u1", &f, 150), UpsertOptions::default())
        .await
        .unwrap_err();
    match err {
        RagError::PartialUpsert {
            committed,
            total,
            message,
            ..
        } => {
            assert_eq!(committed, 99);
            assert_eq!(total, 150);
            assert!(message.contains("99 of 100"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(*fake.upsert_calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn pinecone_query_stays_in_namespace() {
    let fake = Arc::new(FakePinecone::default());
    let store = PineconeStore::new(fake, &pinecone_cfg());
    let fa = file("a.pdf", "ka");
    let fb = file("b.pdf", "kb");
    store
        .upsert_document("alice", &embeddings("alice", &fa, 5), UpsertOptions::default())
        .await
        .unwrap();
    store
        .upsert_document("bob", &embeddings("bob", &fb, 5), UpsertOptions::default())
        .await
        .unwrap();

    let res = store.query("alice", &[0.0; DIM], 100).await.unwrap();
    assert_eq!(res.context.len(), 5);
    assert!(res.context.iter().all(|c| c.user_id == "alice"));
}

/* ------------------------------ Qdrant fake ------------------------------ */

#[derive(Default)]
struct FakeQdrant {
    points: Mutex<Vec<QdrantPoint>>,
    batch_sizes: Mutex<Vec<usize>>,
    ensure_calls: Mutex<usize>,
    /// Any batch containing this id fails every attempt.
    poison_id: Option<String>,
}

#[async_trait]
impl QdrantApi for FakeQdrant {
    async fn ensure_collection(&self, _dim: usize) -> Result<(), RagError> {
        *self.ensure_calls.lock().unwrap() += 1;
        Ok(())
    }

    async fn upsert(&self, points: Vec<QdrantPoint>) -> Result<usize, RagError> {
        if let Some(bad) = &self.poison_id {
            if points.iter().any(|p| &p.id == bad) {
                return Err(RagError::Transport {
                    backend: "qdrant",
                    status: None,
                    message: "payload too large".into(),
                });
            }
        }
        self.batch_sizes.lock().unwrap().push(points.len());
        let n = points.len();
        let mut all = self.points.lock().unwrap();
        for p in points {
            all.retain(|x| !(x.id == p.id && x.user_id == p.user_id));
            all.push(p);
        }
        Ok(n)
    }

    async fn search(
        &self,
        _vector: Vec<f32>,
        top_k: u64,
        filter: &PayloadFilter,
    ) -> Result<Vec<ScoredPayload>, RagError> {
        Ok(self
            .points
            .lock()
            .unwrap()
            .iter()
            .filter(|p| filter.matches(&p.payload))
            .take(top_k as usize)
            .map(|p| ScoredPayload {
                score: 0.7,
                payload: p.payload.clone(),
            })
            .collect())
    }

    async fn count(&self, filter: &PayloadFilter) -> Result<u64, RagError> {
        Ok(self
            .points
            .lock()
            .unwrap()
            .iter()
            .filter(|p| filter.matches(&p.payload))
            .count() as u64)
    }

    async fn delete(&self, filter: &PayloadFilter) -> Result<(), RagError> {
        self.points
            .lock()
            .unwrap()
            .retain(|p| !filter.matches(&p.payload));
        Ok(())
    }
}

fn fast_schedule() -> UpsertSchedule {
    UpsertSchedule {
        max_concurrent: 3,
        min_spacing: Duration::from_millis(1),
        attempts: 3,
        base_backoff: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn qdrant_batches_by_percentage() {
    let fake = Arc::new(FakeQdrant::default());
    let store = QdrantStore::new(fake.clone(), fast_schedule(), DIM);
    let f = file("big.csv", "k1");

    let committed = store
        .upsert_document(
            "u1",
            &embeddings("u1", &f, 1000),
            UpsertOptions { batch_percent: 20 },
        )
        .await
        .unwrap();

    assert_eq!(committed, 1000);
    let sizes = fake.batch_sizes.lock().unwrap().clone();
    assert_eq!(sizes, vec![200; 5]);
    assert_eq!(sizes.iter().sum::<usize>(), 1000);
    assert_eq!(*fake.ensure_calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn qdrant_retry_exhaustion_reports_partial_commit() {
    let f = file("a.pdf", "k1");
    let fake = Arc::new(FakeQdrant {
        poison_id: Some(embedding_id(&f.name, &f.key, 1)),
        ..Default::default()
    });
    let store = QdrantStore::new(fake, fast_schedule(), DIM);

    let err = store
        .upsert_document(
            "u1",
            &embeddings("u1", &f, 10),
            UpsertOptions { batch_percent: 50 },
        )
        .await
        .unwrap_err();
    match err {
        RagError::PartialUpsert {
            committed,
            total,
            message,
            ..
        } => {
            assert_eq!(committed, 5);
            assert_eq!(total, 10);
            assert!(message.contains("payload too large"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn qdrant_query_and_delete_are_user_scoped() {
    let fake = Arc::new(FakeQdrant::default());
    let store = QdrantStore::new(fake.clone(), fast_schedule(), DIM);
    let shared = file("same.pdf", "k-same");

    store
        .upsert_document("alice", &embeddings("alice", &shared, 150), UpsertOptions::default())
        .await
        .unwrap();
    store
        .upsert_document("bob", &embeddings("bob", &shared, 4), UpsertOptions::default())
        .await
        .unwrap();

    let res = store.query("bob", &[0.0; DIM], 100).await.unwrap();
    assert_eq!(res.context.len(), 4);
    assert!(res.context.iter().all(|c| c.user_id == "bob"));

    let deleted = store.delete_from_vector_db("alice", &shared).await.unwrap();
    assert_eq!(deleted, 150);
    assert_eq!(
        store.delete_from_vector_db("alice", &shared).await.unwrap(),
        0
    );
    assert_eq!(store.query("bob", &[0.0; DIM], 100).await.unwrap().context.len(), 4);
}

#[tokio::test]
async fn qdrant_rejects_wrong_dimension() {
    let store = QdrantStore::new(Arc::new(FakeQdrant::default()), fast_schedule(), DIM + 1);
    let err = store
        .upsert_document("u1", &embeddings("u1", &file("a", "k"), 2), UpsertOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::VectorSizeMismatch { .. }));
}

//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! [`QdrantApi`] speaks in crate types (flattened JSON payloads, string ids,
//! [`PayloadFilter`]); [`QdrantFacade`] maps them onto the builder API.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::{
    Payload, Qdrant,
    qdrant::{
        CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
        DeletePointsBuilder, Distance, FieldType, PointStruct, SearchParamsBuilder,
        SearchPointsBuilder, UpsertPointsBuilder, Value as QValue, VectorParamsBuilder,
    },
};
use serde_json::{Map, Value};
use services::uuid::stable_uuid;
use tracing::{debug, info};

use crate::{
    config::{DistanceKind, QdrantConfig},
    errors::RagError,
    metadata::KEY_USER_ID,
    qdrant::filters::{PayloadFilter, to_qdrant_filter},
};

const BACKEND: &str = "qdrant";

/// Payload field carrying the original string id.
pub const KEY_POINT_ID: &str = "id";

/// Point as handed to the facade.
#[derive(Debug, Clone, PartialEq)]
pub struct QdrantPoint {
    /// Original `name#key#seq` id; the facade derives the UUID.
    pub id: String,
    /// Owner; part of the UUID seed so equal ids of two users never collide.
    pub user_id: String,
    pub values: Vec<f32>,
    pub payload: Map<String, Value>,
}

/// Search hit with its payload converted back to JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPayload {
    pub score: f32,
    pub payload: Map<String, Value>,
}

/// Collection operations used by [`super::QdrantStore`].
#[async_trait]
pub trait QdrantApi: Send + Sync {
    /// Creates the collection (and the `userId` index) if missing.
    async fn ensure_collection(&self, dim: usize) -> Result<(), RagError>;

    /// Upserts one batch and waits for it to be applied; returns the batch size.
    async fn upsert(&self, points: Vec<QdrantPoint>) -> Result<usize, RagError>;

    async fn search(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: &PayloadFilter,
    ) -> Result<Vec<ScoredPayload>, RagError>;

    /// Exact count of points matching `filter`.
    async fn count(&self, filter: &PayloadFilter) -> Result<u64, RagError>;

    async fn delete(&self, filter: &PayloadFilter) -> Result<(), RagError>;
}

/// A facade over the Qdrant client to keep the rest of the code clean and stable.
pub struct QdrantFacade {
    client: Qdrant,
    collection: String,
    distance: DistanceKind,
    exact: bool,
}

impl QdrantFacade {
    /// Creates a new facade from the given configuration.
    pub fn new(cfg: &QdrantConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.url);
        if let Some(key) = &cfg.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build().map_err(qerr)?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            distance: cfg.distance,
            exact: cfg.exact_search,
        })
    }
}

fn qerr(e: impl std::fmt::Display) -> RagError {
    RagError::Transport {
        backend: BACKEND,
        status: None,
        message: e.to_string(),
    }
}

#[async_trait]
impl QdrantApi for QdrantFacade {
    async fn ensure_collection(&self, dim: usize) -> Result<(), RagError> {
        if self
            .client
            .collection_exists(self.collection.clone())
            .await
            .map_err(qerr)?
        {
            debug!(target: "rag_store::qdrant", collection = %self.collection, "collection already exists");
            return Ok(());
        }

        let distance = match self.distance {
            DistanceKind::Cosine => Distance::Cosine,
            DistanceKind::Dot => Distance::Dot,
            DistanceKind::Euclid => Distance::Euclid,
        };

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dim as u64, distance)),
            )
            .await
            .map_err(qerr)?;

        self.client
            .create_field_index(
                CreateFieldIndexCollectionBuilder::new(
                    &self.collection,
                    KEY_USER_ID,
                    FieldType::Keyword,
                )
                .wait(true),
            )
            .await
            .map_err(qerr)?;

        info!(target: "rag_store::qdrant", collection = %self.collection, dim, "collection created");
        Ok(())
    }

    async fn upsert(&self, points: Vec<QdrantPoint>) -> Result<usize, RagError> {
        if points.is_empty() {
            return Ok(0);
        }
        let n = points.len();

        let mut structs = Vec::with_capacity(n);
        for p in points {
            let mut payload = p.payload;
            payload.insert(KEY_POINT_ID.into(), Value::String(p.id.clone()));
            let payload = Payload::try_from(Value::Object(payload)).map_err(qerr)?;
            structs.push(PointStruct::new(
                point_uuid(&p.user_id, &p.id),
                p.values,
                payload,
            ));
        }

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, structs).wait(true))
            .await
            .map_err(qerr)?;

        debug!(target: "rag_store::qdrant", points = n, "batch upserted");
        Ok(n)
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: &PayloadFilter,
    ) -> Result<Vec<ScoredPayload>, RagError> {
        let mut builder = SearchPointsBuilder::new(&self.collection, vector, top_k)
            .filter(to_qdrant_filter(filter))
            .with_payload(true);
        if self.exact {
            builder = builder.params(SearchParamsBuilder::default().exact(true));
        }

        let res = self.client.search_points(builder).await.map_err(qerr)?;

        Ok(res
            .result
            .into_iter()
            .map(|r| ScoredPayload {
                score: r.score,
                payload: qpayload_to_json(r.payload),
            })
            .collect())
    }

    async fn count(&self, filter: &PayloadFilter) -> Result<u64, RagError> {
        let res = self
            .client
            .count(
                CountPointsBuilder::new(&self.collection)
                    .filter(to_qdrant_filter(filter))
                    .exact(true),
            )
            .await
            .map_err(qerr)?;
        Ok(res.result.map(|r| r.count).unwrap_or(0))
    }

    async fn delete(&self, filter: &PayloadFilter) -> Result<(), RagError> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(to_qdrant_filter(filter))
                    .wait(true),
            )
            .await
            .map_err(qerr)?;
        Ok(())
    }
}

/// UUIDv5 point id derived from owner and embedding id.
pub fn point_uuid(user_id: &str, id: &str) -> String {
    stable_uuid(&format!("{user_id}/{id}")).to_string()
}

/// Converts a Qdrant payload (`HashMap<String, qdrant::Value>`) into JSON.
fn qpayload_to_json(p: HashMap<String, QValue>) -> Map<String, Value> {
    p.into_iter().map(|(k, v)| (k, qvalue_to_json(v))).collect()
}

fn qvalue_to_json(v: QValue) -> Value {
    use qdrant_client::qdrant::value::Kind as K;
    match v.kind {
        Some(K::StringValue(s)) => Value::String(s),
        Some(K::IntegerValue(i)) => Value::Number(i.into()),
        Some(K::DoubleValue(f)) => serde_json::json!(f),
        Some(K::BoolValue(b)) => Value::Bool(b),
        Some(K::ListValue(l)) => Value::Array(l.values.into_iter().map(qvalue_to_json).collect()),
        Some(K::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, qvalue_to_json(v)))
                .collect(),
        ),
        Some(K::NullValue(_)) | None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::{ListValue, value::Kind};

    #[test]
    fn point_ids_are_stable_and_owner_scoped() {
        let a = point_uuid("u1", "report.pdf#k#1");
        assert_eq!(a, point_uuid("u1", "report.pdf#k#1"));
        assert_ne!(a, point_uuid("u2", "report.pdf#k#1"));
    }

    #[test]
    fn payload_lists_survive_conversion() {
        let langs = QValue {
            kind: Some(Kind::ListValue(ListValue {
                values: vec![QValue {
                    kind: Some(Kind::StringValue("eng".into())),
                }],
            })),
        };
        let mut p = HashMap::new();
        p.insert("languages".to_string(), langs);
        p.insert(
            "page_number".to_string(),
            QValue {
                kind: Some(Kind::StringValue("2".into())),
            },
        );
        let json = qpayload_to_json(p);
        assert_eq!(json["languages"], serde_json::json!(["eng"]));
        assert_eq!(json["page_number"], serde_json::json!("2"));
    }
}

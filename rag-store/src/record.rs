//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Structural metadata of one parsed chunk.
///
/// Known fields are typed; anything else the parser reports lands in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
}

/// One unit of parsed document content. Identity is assigned at embedding time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// The file a set of embeddings belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub name: String,
    pub key: String,
    pub url: String,
}

/// Metadata stored next to each vector, before flattening.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmbeddingMetadata {
    pub text: String,
    pub user_id: String,
    pub url: String,
    pub citation: String,
    pub filename: String,
    pub chunk: ChunkMetadata,
}

/// Atomic unit stored in the vector index.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding {
    /// `asciiSafe(name)#key#seq`
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: EmbeddingMetadata,
}

/// Flat view of a retrieved neighbor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextItem {
    pub text: String,
    pub filename: String,
    pub filetype: String,
    /// Comma-joined list.
    pub languages: String,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "page_number")]
    pub page_number: Option<String>,
    pub user_id: String,
    pub url: String,
    pub citation: String,
    /// Vector similarity reported by the backend.
    pub score: f32,
}

/// Result of a nearest-neighbor query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub context: Vec<ContextItem>,
}

/// Per-call upsert tuning taken from the user's Forge settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpsertOptions {
    /// Batch size as a percentage of the embeddings in the call (1..=100).
    pub batch_percent: u8,
}

impl Default for UpsertOptions {
    fn default() -> Self {
        Self { batch_percent: 20 }
    }
}

/// Human-readable citation: `[name, page n](url)` or `[name](url)`.
pub fn citation(file_name: &str, url: &str, page_number: Option<u32>) -> String {
    match page_number {
        Some(n) => format!("[{file_name}, page {n}]({url})"),
        None => format!("[{file_name}]({url})"),
    }
}

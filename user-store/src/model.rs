//! Persisted user document: profile, knowledgebase files and pipeline settings.

use chrono::{DateTime, Utc};
use rag_store::{FileRef, ProviderKind, UpsertOptions};
use serde::{Deserialize, Serialize};

/// One user-uploaded source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgebaseFile {
    pub name: String,
    pub url: String,
    pub size: u64,
    /// Storage-provider id; also the vector id namespace of the file.
    pub key: String,
    pub date_uploaded: DateTime<Utc>,
    /// `None` until every chunk has been embedded and upserted.
    #[serde(default)]
    pub date_processed: Option<DateTime<Utc>>,
}

impl KnowledgebaseFile {
    pub fn file_ref(&self) -> FileRef {
        FileRef {
            name: self.name.clone(),
            key: self.key.clone(),
            url: self.url.clone(),
        }
    }

    pub fn is_processed(&self) -> bool {
        self.date_processed.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserFiles {
    #[serde(default)]
    pub knowledgebase: Vec<KnowledgebaseFile>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsingProvider {
    #[default]
    Unstructured,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitioningStrategy {
    #[default]
    Auto,
    Fast,
    HiRes,
    OcrOnly,
}

impl PartitioningStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitioningStrategy::Auto => "auto",
            PartitioningStrategy::Fast => "fast",
            PartitioningStrategy::HiRes => "hi_res",
            PartitioningStrategy::OcrOnly => "ocr_only",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    Basic,
    #[default]
    ByTitle,
    ByPage,
    BySimilarity,
}

impl ChunkingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkingStrategy::Basic => "basic",
            ChunkingStrategy::ByTitle => "by_title",
            ChunkingStrategy::ByPage => "by_page",
            ChunkingStrategy::BySimilarity => "by_similarity",
        }
    }
}

/// Ingestion tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForgeSettings {
    pub parsing_provider: ParsingProvider,
    pub partitioning_strategy: PartitioningStrategy,
    pub chunking_strategy: ChunkingStrategy,
    pub min_chunk_size: u32,
    pub max_chunk_size: u32,
    pub chunk_overlap: u32,
    /// Upsert batch size in percent of a file's embeddings.
    pub chunk_batch: u8,
    pub vectorization_provider: ProviderKind,
}

impl Default for ForgeSettings {
    fn default() -> Self {
        Self {
            parsing_provider: ParsingProvider::Unstructured,
            partitioning_strategy: PartitioningStrategy::Auto,
            chunking_strategy: ChunkingStrategy::ByTitle,
            min_chunk_size: 0,
            max_chunk_size: 512,
            chunk_overlap: 0,
            chunk_batch: 20,
            vectorization_provider: ProviderKind::Pinecone,
        }
    }
}

impl ForgeSettings {
    pub fn upsert_options(&self) -> UpsertOptions {
        UpsertOptions {
            batch_percent: self.chunk_batch.clamp(1, 100),
        }
    }
}

/// Retrieval tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KnowledgebaseSettings {
    pub top_k: u32,
    pub top_n: u32,
    /// Minimum relevance in percent (0..=100).
    pub reranking_threshold: u8,
}

impl Default for KnowledgebaseSettings {
    fn default() -> Self {
        Self {
            top_k: 100,
            top_n: 10,
            reranking_threshold: 50,
        }
    }
}

impl KnowledgebaseSettings {
    /// Threshold on the 0..=1 relevance scale.
    pub fn threshold(&self) -> f32 {
        f32::from(self.reranking_threshold.min(100)) / 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalizationSettings {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub forge: ForgeSettings,
    pub knowledgebase: KnowledgebaseSettings,
    pub personalization: PersonalizationSettings,
}

/// Profile fields used when personalization is on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    /// ISO-3166 alpha-2 code.
    pub country: Option<String>,
    /// ISO-639-1 code.
    pub language: Option<String>,
}

/// Whole per-user document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub files: UserFiles,
    #[serde(default)]
    pub settings: Settings,
}

impl UserRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn file(&self, key: &str) -> Option<&KnowledgebaseFile> {
        self.files.knowledgebase.iter().find(|f| f.key == key)
    }

    pub fn file_mut(&mut self, key: &str) -> Option<&mut KnowledgebaseFile> {
        self.files.knowledgebase.iter_mut().find(|f| f.key == key)
    }
}

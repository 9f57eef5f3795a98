//! Document partitioning through the Unstructured API.
//!
//! Files go up as multipart form data together with the user's partitioning
//! and chunking settings; the returned element list becomes the file's
//! ordered [`Chunk`]s.

use std::{collections::BTreeMap, time::Duration};

use ai_llm_service::error_handler::make_snippet;
use async_trait::async_trait;
use rag_store::{Chunk, ChunkMetadata};
use reqwest::{
    Client,
    multipart::{Form, Part},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};
use user_store::{ChunkingStrategy, ForgeSettings, PartitioningStrategy};

use crate::{
    config::ParsingConfig,
    errors::{ForgeError, Result},
};

/// Request parameters derived from the user's forge settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseParams {
    pub strategy: PartitioningStrategy,
    pub combine_under_n_chars: u32,
    /// `None` for tabular files, which are never chunked.
    pub chunking: Option<ChunkingParams>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingParams {
    pub strategy: ChunkingStrategy,
    pub max_characters: u32,
    pub overlap: u32,
}

impl ParseParams {
    pub fn for_file(settings: &ForgeSettings, file_name: &str) -> Self {
        let chunking = (!is_csv(file_name)).then(|| ChunkingParams {
            strategy: settings.chunking_strategy,
            max_characters: settings.max_chunk_size,
            overlap: settings.chunk_overlap,
        });
        Self {
            strategy: settings.partitioning_strategy,
            combine_under_n_chars: settings.min_chunk_size,
            chunking,
        }
    }
}

pub fn is_csv(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("csv"))
}

/// Turns raw file bytes into ordered chunks.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    async fn partition(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        params: &ParseParams,
    ) -> Result<Vec<Chunk>>;
}

/// One element of the partition response.
#[derive(Debug, Deserialize)]
struct Element {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    metadata: Map<String, Value>,
}

/// Unstructured partition client.
pub struct ParsingService {
    http: Client,
    cfg: ParsingConfig,
}

impl ParsingService {
    pub fn new(cfg: ParsingConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| ForgeError::Parsing {
                status: None,
                message: e.to_string(),
            })?;
        Ok(Self { http, cfg })
    }

    fn form(&self, file_name: &str, bytes: Vec<u8>, params: &ParseParams) -> Form {
        let mut form = Form::new()
            .part("files", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("strategy", params.strategy.as_str())
            .text(
                "combine_under_n_chars",
                params.combine_under_n_chars.to_string(),
            );

        if let Some(c) = &params.chunking {
            form = form
                .text("chunking_strategy", c.strategy.as_str())
                .text("max_characters", c.max_characters.to_string())
                .text("overlap", c.overlap.to_string())
                .text("split_pdf_page", "true")
                .text(
                    "split_pdf_concurrency_level",
                    self.cfg.split_pdf_concurrency.to_string(),
                );
        }
        form
    }
}

#[async_trait]
impl DocumentParser for ParsingService {
    #[instrument(skip_all, fields(file = %file_name, size = bytes.len()))]
    async fn partition(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        params: &ParseParams,
    ) -> Result<Vec<Chunk>> {
        let mut req = self
            .http
            .post(&self.cfg.url)
            .header("accept", "application/json")
            .multipart(self.form(file_name, bytes, params));
        if let Some(key) = &self.cfg.api_key {
            req = req.header("unstructured-api-key", key);
        }

        let resp = req.send().await.map_err(|e| ForgeError::Parsing {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        })?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| ForgeError::Parsing {
            status: Some(status.as_u16()),
            message: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(ForgeError::Parsing {
                status: Some(status.as_u16()),
                message: make_snippet(&body),
            });
        }

        let elements: Vec<Element> =
            serde_json::from_str(&body).map_err(|e| ForgeError::Parsing {
                status: Some(status.as_u16()),
                message: format!("decode partition response: {e}"),
            })?;
        debug!(target: "forge::parsing", elements = elements.len(), "partition response decoded");

        let chunks: Vec<Chunk> = elements
            .into_iter()
            .filter(|el| !el.text.trim().is_empty())
            .map(element_to_chunk)
            .collect();
        if chunks.is_empty() {
            return Err(ForgeError::EmptyDocument(file_name.to_string()));
        }

        info!(target: "forge::parsing", chunks = chunks.len(), "document partitioned");
        Ok(chunks)
    }
}

/// Splits element metadata into the known fields and an extension map.
fn element_to_chunk(el: Element) -> Chunk {
    let mut extra: BTreeMap<String, Value> = BTreeMap::new();
    let mut meta = ChunkMetadata {
        element_type: el.kind,
        ..Default::default()
    };

    for (k, v) in el.metadata {
        match k.as_str() {
            "page_number" => meta.page_number = v.as_u64().and_then(|n| u32::try_from(n).ok()),
            "filetype" => meta.filetype = v.as_str().map(str::to_string),
            "languages" => {
                meta.languages = v
                    .as_array()
                    .map(|a| a.iter().filter_map(|l| l.as_str().map(str::to_string)).collect())
                    .unwrap_or_default()
            }
            // Known per-file values the embedding already carries.
            "filename" | "file_directory" | "last_modified" => {}
            _ => {
                extra.insert(k, v);
            }
        }
    }
    meta.extra = extra;

    Chunk {
        text: el.text,
        metadata: meta,
    }
}

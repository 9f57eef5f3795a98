//! Multi-file ingestion run.
//!
//! Files are processed one after another in the order the caller listed
//! them. Each file walks `Processing → Processed → Embedding → Embedded →
//! Upserting → Upserted`; any failure turns into an `Error` event for that
//! file and the run moves on. `dateProcessed` is written only after the
//! upsert for the file has returned successfully.

use std::sync::Arc;

use chrono::Utc;
use rag_store::{EmbeddingService, RagError, VectorStoreProvider, VectorStoreRegistry};
use serde::{Deserialize, Serialize};
use services::events::{DEFAULT_EVENT_CAPACITY, EventItem, EventSink};
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};
use user_store::{ForgeSettings, KnowledgebaseFile, ObjectStorage, UserRepository};

use crate::{
    errors::{ForgeError, Result},
    lease::LeaseRegistry,
    parsing::{DocumentParser, ParseParams},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForgeStatus {
    Processing,
    Processed,
    Embedding,
    Embedded,
    Upserting,
    Upserted,
    Error,
}

pub type ForgeSink = EventSink<ForgeStatus, ForgeError>;
pub type ForgeEvent = EventItem<ForgeStatus, ForgeError>;

/// What happened to each file of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestionSummary {
    /// Keys of files that reached `Upserted`.
    pub upserted: Vec<String>,
    /// `(key, message)` of files that reached `Error`.
    pub failed: Vec<(String, String)>,
    /// Set when the client went away before the run finished.
    pub disconnected: bool,
}

pub struct IngestionPipeline {
    users: Arc<dyn UserRepository>,
    storage: Arc<dyn ObjectStorage>,
    parser: Arc<dyn DocumentParser>,
    embedder: EmbeddingService,
    stores: Arc<VectorStoreRegistry>,
    leases: LeaseRegistry,
}

impl IngestionPipeline {
    pub fn new(
        users: Arc<dyn UserRepository>,
        storage: Arc<dyn ObjectStorage>,
        parser: Arc<dyn DocumentParser>,
        embedder: EmbeddingService,
        stores: Arc<VectorStoreRegistry>,
    ) -> Self {
        Self {
            users,
            storage,
            parser,
            embedder,
            stores,
            leases: LeaseRegistry::new(),
        }
    }

    pub fn leases(&self) -> &LeaseRegistry {
        &self.leases
    }

    /// Starts a run in the background and hands back its event stream.
    pub fn spawn(self: Arc<Self>, user_id: String, file_keys: Vec<String>) -> mpsc::Receiver<ForgeEvent> {
        let (sink, rx) = EventSink::channel(DEFAULT_EVENT_CAPACITY);
        tokio::spawn(async move {
            self.run(&user_id, &file_keys, &sink).await;
        });
        rx
    }

    /// Ingests `file_keys` for `user_id`, reporting progress on `sink`.
    ///
    /// Failing to load the user's settings or to resolve the selected vector
    /// store ends the run with a fatal item on the sink.
    #[instrument(skip_all, fields(user_id = %user_id, files = file_keys.len()))]
    pub async fn run(&self, user_id: &str, file_keys: &[String], sink: &ForgeSink) -> IngestionSummary {
        let mut summary = IngestionSummary::default();

        let record = match self.users.get(user_id).await {
            Ok(r) => r,
            Err(e) => {
                error!(target: "forge::pipeline", error = %e, "user lookup failed");
                sink.fail(e.into()).await;
                return summary;
            }
        };
        let settings = record.settings.forge.clone();
        let store = match self.stores.get(settings.vectorization_provider) {
            Ok(s) => s,
            Err(e) => {
                error!(target: "forge::pipeline", error = %e, "vector store unavailable");
                sink.fail(e.into()).await;
                return summary;
            }
        };

        for key in file_keys {
            if sink.is_closed() {
                summary.disconnected = true;
                break;
            }

            let outcome = match record.file(key) {
                None => Err(ForgeError::UnknownFile(key.clone())),
                Some(file) => match self.leases.try_acquire(user_id, key) {
                    None => Err(ForgeError::AlreadyProcessing(file.name.clone())),
                    Some(_lease) => {
                        self.ingest_file(user_id, file, &settings, store.as_ref(), sink)
                            .await
                    }
                },
            };

            let label = record.file(key).map(|f| f.name.as_str()).unwrap_or(key);
            match outcome {
                Ok(_) => summary.upserted.push(key.clone()),
                Err(ForgeError::Disconnected) => {
                    warn!(target: "forge::pipeline", file = %label, "client disconnected; stopping run");
                    summary.disconnected = true;
                    break;
                }
                Err(e) => {
                    warn!(target: "forge::pipeline", file = %label, error = %e, "file ingestion failed");
                    let message = format!("{label}: {e}");
                    sink.emit(ForgeStatus::Error, message.clone()).await;
                    summary.failed.push((key.clone(), message));
                }
            }
        }

        info!(
            target: "forge::pipeline",
            upserted = summary.upserted.len(),
            failed = summary.failed.len(),
            disconnected = summary.disconnected,
            "ingestion run finished"
        );
        summary
    }

    async fn ingest_file(
        &self,
        user_id: &str,
        file: &KnowledgebaseFile,
        settings: &ForgeSettings,
        store: &dyn VectorStoreProvider,
        sink: &ForgeSink,
    ) -> Result<usize> {
        let name = file.name.as_str();
        let file_ref = file.file_ref();

        step(sink, ForgeStatus::Processing, format!("Processing {name}")).await?;
        let bytes = self.storage.fetch_bytes(&file.url).await?;
        let params = ParseParams::for_file(settings, name);
        let chunks = self.parser.partition(name, bytes, &params).await?;
        step(
            sink,
            ForgeStatus::Processed,
            format!("Parsed {name} into {} chunks", chunks.len()),
        )
        .await?;

        step(sink, ForgeStatus::Embedding, format!("Embedding {name}")).await?;
        let embeddings = self.embedder.embed_document(user_id, &file_ref, &chunks).await?;
        step(
            sink,
            ForgeStatus::Embedded,
            format!("Embedded {} chunks of {name}", embeddings.len()),
        )
        .await?;

        step(
            sink,
            ForgeStatus::Upserting,
            format!("Upserting {name} into {}", store.kind()),
        )
        .await?;
        let upserted = store
            .upsert_document(user_id, &embeddings, settings.upsert_options())
            .await
            .map_err(|e| e.for_user(store.kind().as_str(), user_id, Some(name)))?;
        if upserted != embeddings.len() {
            return Err(RagError::PartialUpsert {
                backend: store.kind().as_str(),
                user_id: user_id.to_string(),
                committed: upserted,
                total: embeddings.len(),
                message: format!("{name} was not fully acknowledged"),
            }
            .into());
        }

        self.users
            .set_date_processed(user_id, &file.key, Some(Utc::now()))
            .await?;

        // Work is committed; a vanished client no longer matters here.
        sink.emit(
            ForgeStatus::Upserted,
            format!("Upserted {upserted} embeddings for {name}"),
        )
        .await;
        Ok(upserted)
    }
}

async fn step(sink: &ForgeSink, status: ForgeStatus, message: String) -> Result<()> {
    if sink.emit(status, message).await {
        Ok(())
    } else {
        Err(ForgeError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_serialize_as_pascal_case() {
        let json = serde_json::to_string(&ForgeStatus::Upserted).unwrap();
        assert_eq!(json, "\"Upserted\"");
    }
}

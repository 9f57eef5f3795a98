//! Removing knowledgebase files.
//!
//! Per file, in order: vectors in the user's active store, then the stored
//! object, then the file record. A step that fails leaves the later ones
//! undone so the file stays listed and the delete can be retried.

use std::sync::Arc;

use rag_store::VectorStoreRegistry;
use serde::Serialize;
use tracing::{info, instrument, warn};
use user_store::{KnowledgebaseFile, ObjectStorage, UserRepository, UserStoreError};

use crate::errors::{ForgeError, Result};

/// `deleted < requested` tells the caller some files may still exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub requested: usize,
    pub deleted: usize,
}

pub struct DeletionService {
    users: Arc<dyn UserRepository>,
    storage: Arc<dyn ObjectStorage>,
    stores: Arc<VectorStoreRegistry>,
}

impl DeletionService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        storage: Arc<dyn ObjectStorage>,
        stores: Arc<VectorStoreRegistry>,
    ) -> Self {
        Self {
            users,
            storage,
            stores,
        }
    }

    /// Deletes every listed file of `user_id`.
    ///
    /// # Errors
    /// Only for failures before any file is touched (empty key list, user
    /// lookup, vector store resolution). Per-file failures are logged and
    /// show up as `deleted < requested`.
    #[instrument(skip_all, fields(user_id = %user_id, requested = file_keys.len()))]
    pub async fn delete_files(&self, user_id: &str, file_keys: &[String]) -> Result<DeletionReport> {
        if file_keys.is_empty() {
            return Err(ForgeError::Validation("fileKeys must not be empty".into()));
        }
        let record = self.users.get(user_id).await?;
        let store = self
            .stores
            .get(record.settings.forge.vectorization_provider)?;

        let mut report = DeletionReport {
            requested: file_keys.len(),
            deleted: 0,
        };

        for key in file_keys {
            let Some(file) = record.file(key) else {
                warn!(target: "forge::deletion", key = %key, "file not registered; skipping");
                continue;
            };
            match self.delete_one(user_id, file, store.as_ref()).await {
                Ok(vectors) => {
                    report.deleted += 1;
                    info!(target: "forge::deletion", file = %file.name, vectors, "file deleted");
                }
                Err(e) => {
                    warn!(target: "forge::deletion", file = %file.name, error = %e, "file deletion failed");
                }
            }
        }

        Ok(report)
    }

    async fn delete_one(
        &self,
        user_id: &str,
        file: &KnowledgebaseFile,
        store: &dyn rag_store::VectorStoreProvider,
    ) -> Result<usize> {
        let vectors = store
            .delete_from_vector_db(user_id, &file.file_ref())
            .await
            .map_err(|e| e.for_user(store.kind().as_str(), user_id, Some(&file.name)))?;

        let removed = match self.storage.delete_files(std::slice::from_ref(&file.key)).await {
            Ok(0) => Err(UserStoreError::Storage {
                status: None,
                message: format!("storage did not delete '{}'", file.key),
            }),
            other => other,
        };
        if let Err(e) = removed {
            // Vectors are gone; make the record say so before giving up.
            if let Err(reset) = self.users.set_date_processed(user_id, &file.key, None).await {
                warn!(target: "forge::deletion", file = %file.name, error = %reset, "could not clear dateProcessed");
            }
            return Err(e.into());
        }

        self.users.remove_file(user_id, &file.key).await?;
        Ok(vectors)
    }
}

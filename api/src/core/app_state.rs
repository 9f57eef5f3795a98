use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use contextor::{RerankService, RetrievalPipeline};
use forge::{DeletionService, IngestionPipeline, ParsingConfig, ParsingService};
use rag_store::{
    EmbeddingConfig, EmbeddingService, ProfilesEmbedder, VectorStoreConfig, build_registry,
};
use tracing::info;
use user_store::{JsonFileUserRepository, UserRepository, UserStoreConfig, build_storage};

use crate::{core::config::ApiConfig, error_handler::AppError};

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub users: Arc<dyn UserRepository>,
    pub ingestion: Arc<IngestionPipeline>,
    pub retrieval: Arc<RetrievalPipeline>,
    pub deletion: Arc<DeletionService>,
}

impl AppState {
    /// Wires every service from environment variables.
    ///
    /// # Errors
    /// [`AppError::Config`] when a required variable is missing or invalid.
    pub fn from_env(config: ApiConfig) -> Result<Self, AppError> {
        let profiles = Arc::new(LlmServiceProfiles::from_env().map_err(config_err)?);
        let dims = profiles.embedding_dimensions();

        let embedder = EmbeddingService::new(
            Arc::new(ProfilesEmbedder::new(profiles.clone())),
            EmbeddingConfig::from_env(dims).map_err(config_err)?,
        );
        let stores = Arc::new(
            build_registry(&VectorStoreConfig::from_env(
                dims.unwrap_or(ai_llm_service::config::default_config::DEFAULT_EMBEDDING_DIM),
            ))
            .map_err(config_err)?,
        );

        let user_cfg = UserStoreConfig::from_env();
        let users: Arc<dyn UserRepository> =
            Arc::new(JsonFileUserRepository::new(user_cfg.dir.clone()));
        let storage = build_storage(&user_cfg).map_err(config_err)?;

        let parser = Arc::new(
            ParsingService::new(ParsingConfig::from_env().map_err(config_err)?)
                .map_err(config_err)?,
        );

        let ingestion = Arc::new(IngestionPipeline::new(
            users.clone(),
            storage.clone(),
            parser,
            embedder.clone(),
            stores.clone(),
        ));
        let retrieval = Arc::new(RetrievalPipeline::new(
            users.clone(),
            embedder,
            stores.clone(),
            Arc::new(RerankService::new(profiles)),
        ));
        let deletion = Arc::new(DeletionService::new(users.clone(), storage, stores.clone()));

        info!(
            target: "api",
            user_store = %user_cfg.dir.display(),
            vector_stores = ?stores.available(),
            "application state ready"
        );

        Ok(Self {
            config,
            users,
            ingestion,
            retrieval,
            deletion,
        })
    }
}

fn config_err(e: impl std::fmt::Display) -> AppError {
    AppError::Config(e.to_string())
}

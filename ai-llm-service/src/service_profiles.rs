//! Shared AI service with two profiles: `embedding` and `rerank`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per config (provider+endpoint+model+key+timeout).
//! - The rerank profile is optional; calling [`LlmServiceProfiles::rerank`]
//!   without one yields a config error.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::info;

use crate::{
    config::{
        default_config::{config_cohere_rerank, config_embedding_from_env},
        llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::{AiLlmError, ConfigError},
    services::{
        cohere_service::{CohereService, RerankHit},
        ollama_service::OllamaService,
        open_ai_service::OpenAiService,
    },
};

/// Shared service that manages the **embedding** and **rerank** profiles.
pub struct LlmServiceProfiles {
    embedding: LlmModelConfig,
    rerank: Option<LlmModelConfig>,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,
    cohere: RwLock<HashMap<ClientKey, Arc<CohereService>>>,
}

impl LlmServiceProfiles {
    /// Creates a new service from explicit profiles.
    pub fn new(embedding: LlmModelConfig, rerank: Option<LlmModelConfig>) -> Self {
        Self {
            embedding,
            rerank,
            ollama: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
            cohere: RwLock::new(HashMap::new()),
        }
    }

    /// Loads both profiles from the environment (see `config::default_config`).
    pub fn from_env() -> Result<Self, AiLlmError> {
        let embedding = config_embedding_from_env()?;
        let rerank = config_cohere_rerank()?;
        info!(
            target: "ai_llm_service::profiles",
            embedding_provider = ?embedding.provider,
            embedding_model = %embedding.model,
            rerank_enabled = rerank.is_some(),
            "AI profiles loaded"
        );
        Ok(Self::new(embedding, rerank))
    }

    /// Computes one embedding using the **embedding** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the provider call fails.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        match self.embedding.provider {
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(&self.embedding).await?;
                cli.embeddings(input).await
            }
            LlmProvider::OpenAI => {
                let cli = self.get_or_init_openai(&self.embedding).await?;
                cli.embeddings(input).await
            }
            LlmProvider::Cohere => Err(ConfigError::UnsupportedProvider(
                "cohere has no embedding profile".into(),
            )
            .into()),
        }
    }

    /// Reranks `documents` against `query` using the **rerank** profile.
    ///
    /// # Errors
    /// - [`ConfigError::MissingVar`] when no rerank profile is configured
    /// - provider errors from the rerank call
    pub async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankHit>, AiLlmError> {
        let cfg = self
            .rerank
            .as_ref()
            .ok_or(ConfigError::MissingVar("COHERE_API_KEY"))?;
        let cli = self.get_or_init_cohere(cfg).await?;
        cli.rerank(query, documents, top_n).await
    }

    /// Returns references to the current profiles `(embedding, rerank)`.
    pub fn profiles(&self) -> (&LlmModelConfig, Option<&LlmModelConfig>) {
        (&self.embedding, self.rerank.as_ref())
    }

    /// Expected embedding width of the embedding profile, if configured.
    pub fn embedding_dimensions(&self) -> Option<usize> {
        self.embedding.dimensions
    }

    /* --------------------- Internals --------------------- */

    async fn get_or_init_ollama(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn get_or_init_openai(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.openai.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn get_or_init_cohere(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<CohereService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.cohere.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.cohere.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(CohereService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

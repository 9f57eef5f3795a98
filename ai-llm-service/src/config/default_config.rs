//! Default model configs loaded strictly from environment variables.
//!
//! Two roles are needed by the pipelines:
//!
//! - **Embedding** → OpenAI (default) or a local Ollama model
//! - **Rerank**    → Cohere
//!
//! # Environment variables
//!
//! Embedding:
//! - `EMBEDDING_PROVIDER` = `openai` | `ollama` (default `openai`)
//! - `EMBEDDING_MODEL`    = model name (default `text-embedding-3-large`)
//! - `EMBEDDING_DIM`      = vector width (default `3072`)
//! - `OPENAI_API_KEY`, `OPENAI_URL` (default `https://api.openai.com`)
//! - `OLLAMA_URL` (required when the provider is `ollama`)
//!
//! Rerank:
//! - `COHERE_API_KEY` (required), `COHERE_URL` (default `https://api.cohere.com`)
//! - `RERANK_MODEL` (default `rerank-english-v3.0`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt, env_or, env_parse_or, must_env, validate_http_endpoint,
    },
};

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";
pub const DEFAULT_EMBEDDING_DIM: usize = 3072;
pub const DEFAULT_COHERE_URL: &str = "https://api.cohere.com";
pub const DEFAULT_RERANK_MODEL: &str = "rerank-english-v3.0";

/// Builds the embedding profile for whichever provider `EMBEDDING_PROVIDER` names.
///
/// # Errors
/// - [`ConfigError::UnsupportedProvider`] for an unknown or non-embedding provider
/// - errors of the provider-specific constructor
pub fn config_embedding_from_env() -> Result<LlmModelConfig, AiLlmError> {
    let provider: LlmProvider = env_or("EMBEDDING_PROVIDER", "openai").parse()?;
    match provider {
        LlmProvider::OpenAI => config_openai_embedding(),
        LlmProvider::Ollama => config_ollama_embedding(),
        LlmProvider::Cohere => Err(ConfigError::UnsupportedProvider(
            "cohere has no embedding profile".into(),
        )
        .into()),
    }
}

/// Constructs the OpenAI embedding profile.
///
/// # Defaults
/// - `timeout_secs = Some(60)`
pub fn config_openai_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let api_key = must_env("OPENAI_API_KEY")?;
    let endpoint = env_or("OPENAI_URL", DEFAULT_OPENAI_URL);
    validate_http_endpoint("OPENAI_URL", &endpoint)?;
    let model = env_or("EMBEDDING_MODEL", DEFAULT_EMBEDDING_MODEL);
    let dimensions = env_parse_or("EMBEDDING_DIM", DEFAULT_EMBEDDING_DIM)?;

    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model,
        endpoint,
        api_key: Some(api_key),
        dimensions: Some(dimensions),
        timeout_secs: Some(60),
    })
}

/// Constructs the Ollama embedding profile.
///
/// `EMBEDDING_MODEL` is required here since the OpenAI default means nothing to Ollama.
pub fn config_ollama_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = must_env("OLLAMA_URL")?;
    validate_http_endpoint("OLLAMA_URL", &endpoint)?;
    let model = must_env("EMBEDDING_MODEL")?;
    let dimensions = env_parse_or("EMBEDDING_DIM", DEFAULT_EMBEDDING_DIM)?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        api_key: None,
        dimensions: Some(dimensions),
        timeout_secs: Some(30),
    })
}

/// Constructs the Cohere rerank profile.
///
/// Returns `Ok(None)` when `COHERE_API_KEY` is not set so the caller can run
/// without a reranker and report it as unavailable on use.
pub fn config_cohere_rerank() -> Result<Option<LlmModelConfig>, AiLlmError> {
    let Some(api_key) = env_opt("COHERE_API_KEY") else {
        return Ok(None);
    };
    let endpoint = env_or("COHERE_URL", DEFAULT_COHERE_URL);
    validate_http_endpoint("COHERE_URL", &endpoint)?;

    Ok(Some(LlmModelConfig {
        provider: LlmProvider::Cohere,
        model: env_or("RERANK_MODEL", DEFAULT_RERANK_MODEL),
        endpoint,
        api_key: Some(api_key),
        dimensions: None,
        timeout_secs: Some(30),
    }))
}

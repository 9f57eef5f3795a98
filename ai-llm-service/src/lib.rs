//! Upstream AI providers used by the Atlas pipelines.
//!
//! - `config`: provider kinds and env-driven [`LlmModelConfig`] constructors.
//! - `services`: thin HTTP clients (OpenAI and Ollama embeddings, Cohere rerank).
//! - [`service_profiles::LlmServiceProfiles`]: shared, cached access to the
//!   `embedding` and `rerank` profiles.
//! - [`error_handler`]: the unified [`AiLlmError`] type and env helpers.

pub mod config;
pub mod error_handler;
pub mod service_profiles;
pub mod services;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, ConfigError, ProviderError};
pub use service_profiles::LlmServiceProfiles;
pub use services::cohere_service::RerankHit;

use crate::config::llm_provider::LlmProvider;

/// Configuration for one upstream model profile.
///
/// # Fields
///
/// - `provider`: which backend serves the model.
/// - `model`: model identifier (e.g., `"text-embedding-3-large"`, `"rerank-english-v3.0"`).
/// - `endpoint`: base URL of the API (no path suffix).
/// - `api_key`: API key for providers that require authentication.
/// - `dimensions`: expected embedding width, for embedding profiles.
/// - `timeout_secs`: optional request timeout in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmModelConfig {
    /// The upstream provider.
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// API base URL (local server or remote API).
    pub endpoint: String,

    /// Optional API key for authentication.
    pub api_key: Option<String>,

    /// Expected output dimension of an embedding model.
    pub dimensions: Option<usize>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

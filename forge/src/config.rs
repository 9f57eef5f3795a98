use ai_llm_service::{
    AiLlmError,
    error_handler::{env_opt, env_or, env_parse_or, validate_http_endpoint},
};

pub const DEFAULT_UNSTRUCTURED_URL: &str = "https://api.unstructuredapp.io/general/v0/general";

/// Unstructured partition endpoint settings.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    pub url: String,
    /// Required by the hosted API, optional for a self-hosted container.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Page-split concurrency requested for non-CSV documents.
    pub split_pdf_concurrency: u32,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_UNSTRUCTURED_URL.to_string(),
            api_key: None,
            timeout_secs: 300,
            split_pdf_concurrency: 15,
        }
    }
}

impl ParsingConfig {
    pub fn from_env() -> Result<Self, AiLlmError> {
        let cfg = Self {
            url: env_or("UNSTRUCTURED_URL", DEFAULT_UNSTRUCTURED_URL),
            api_key: env_opt("UNSTRUCTURED_API_KEY"),
            timeout_secs: env_parse_or("UNSTRUCTURED_TIMEOUT_SECS", 300u64)?,
            split_pdf_concurrency: 15,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AiLlmError> {
        validate_http_endpoint("UNSTRUCTURED_URL", &self.url)
    }
}

use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Represents the upstream provider a [`LlmModelConfig`](super::llm_model_config::LlmModelConfig)
/// targets.
///
/// `OpenAI` and `Ollama` serve embeddings; `Cohere` serves reranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// OpenAI REST API.
    OpenAI,
    /// Local Ollama runtime.
    Ollama,
    /// Cohere rerank API.
    Cohere,
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    /// Parses the value of `EMBEDDING_PROVIDER` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "ollama" => Ok(LlmProvider::Ollama),
            "cohere" => Ok(LlmProvider::Cohere),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_providers() {
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAI);
        assert_eq!(" ollama ".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert!("chatgpt".parse::<LlmProvider>().is_err());
    }
}

//! Cohere rerank client.
//!
//! - `POST {endpoint}/v1/rerank`: scores candidate documents against a query
//!
//! Only the indices and relevance scores are requested back
//! (`return_documents = false`); callers keep the candidate list themselves.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
};

/// One reranked candidate: position in the submitted list plus its score.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RerankHit {
    pub index: usize,
    pub relevance_score: f32,
}

/// Thin client for the Cohere rerank endpoint.
#[derive(Debug)]
pub struct CohereService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_rerank: String,
}

impl CohereService {
    /// Creates a new [`CohereService`] from the given config.
    ///
    /// # Errors
    /// Same validation as the other clients: provider, API key, endpoint scheme.
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Cohere {
            return Err(
                ProviderError::new(Provider::Cohere, ProviderErrorKind::InvalidProvider).into(),
            );
        }
        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::Cohere, ProviderErrorKind::MissingApiKey)
        })?;

        let endpoint = cfg.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ProviderError::new(
                Provider::Cohere,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                ProviderError::new(
                    Provider::Cohere,
                    ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                )
            })?,
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs.unwrap_or(30)))
            .default_headers(headers)
            .build()?;

        let url_rerank = format!("{}/v1/rerank", endpoint.trim_end_matches('/'));
        Ok(Self {
            client,
            cfg,
            url_rerank,
        })
    }

    /// Scores `documents` against `query` and returns the best `top_n`,
    /// highest score first.
    ///
    /// An empty `documents` slice short-circuits to an empty result.
    pub async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> Result<Vec<RerankHit>, AiLlmError> {
        if documents.is_empty() || top_n == 0 {
            return Ok(Vec::new());
        }
        let started = Instant::now();
        let body = RerankRequest {
            model: &self.cfg.model,
            query,
            documents,
            top_n: top_n.min(documents.len()),
            return_documents: false,
        };

        debug!(
            target: "ai_llm_service::cohere",
            model = %self.cfg.model,
            candidates = documents.len(),
            top_n,
            "POST {}", self.url_rerank
        );

        let resp = self.client.post(&self.url_rerank).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_rerank.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);
            error!(
                target: "ai_llm_service::cohere",
                %status, %url, %snippet,
                latency_ms = started.elapsed().as_millis(),
                "Cohere /v1/rerank returned non-success status"
            );
            return Err(ProviderError::new(
                Provider::Cohere,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: RerankResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Cohere,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected `results[]`")),
            )
        })?;

        let mut hits: Vec<RerankHit> = out
            .results
            .into_iter()
            .filter(|h| h.index < documents.len())
            .collect();
        hits.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

        debug!(
            target: "ai_llm_service::cohere",
            hits = hits.len(),
            latency_ms = started.elapsed().as_millis(),
            "rerank completed"
        );
        Ok(hits)
    }
}

#[derive(Debug, Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
    return_documents: bool,
}

#[derive(Debug, Deserialize)]
struct RerankResponse {
    results: Vec<RerankHit>,
}

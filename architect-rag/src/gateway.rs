//! Embedding provider for the platform's hosted AI gateway.
//!
//! The gateway exposes an OpenAI-compatible `/v1/embeddings` endpoint at a
//! deployment-specific base URL. Unlike the OpenAI provider, the output
//! dimensionality depends on whichever model the gateway hosts, so it is
//! supplied by configuration rather than inferred from the model name.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// An [`EmbeddingProvider`] backed by the hosted gateway's embeddings endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use architect_rag::GatewayEmbeddingProvider;
///
/// let provider = GatewayEmbeddingProvider::new(
///     "https://gateway.example.net",
///     "key",
///     "text-embedding-ada-002",
///     1536,
/// )?;
/// ```
pub struct GatewayEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedVector>,
}

#[derive(Deserialize)]
struct EmbedVector {
    embedding: Vec<f32>,
}

impl GatewayEmbeddingProvider {
    /// Create a new gateway provider.
    ///
    /// `base_url` is the gateway root (no trailing path); the provider calls
    /// `{base_url}/v1/embeddings`. `dimensions` must match the model the
    /// gateway serves — the index rejects vectors of any other size.
    pub fn new(
        base_url: impl AsRef<str>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self> {
        let base_url = base_url.as_ref().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(RagError::Config("gateway base URL must not be empty".into()));
        }
        if dimensions == 0 {
            return Err(RagError::Config("gateway embedding dimensions must be non-zero".into()));
        }

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().map_err(|e| {
            RagError::Config(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            endpoint: format!("{base_url}/v1/embeddings"),
            api_key: api_key.into(),
            model: model.into(),
            dimensions,
        })
    }

    fn unavailable(message: impl Into<String>) -> RagError {
        RagError::ProviderUnavailable { provider: "gateway".into(), message: message.into() }
    }
}

#[async_trait]
impl EmbeddingProvider for GatewayEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| Self::unavailable("gateway returned an empty response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "gateway", batch_size = texts.len(), model = %self.model, "embedding batch");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&EmbedRequest { model: &self.model, input: texts.to_vec() })
            .send()
            .await
            .map_err(|e| {
                error!(provider = "gateway", error = %e, "embedding request failed");
                Self::unavailable(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // Gateways wrap errors in a few shapes; surface the raw body if
            // it is not the OpenAI-style {"error": {"message": ...}}.
            let detail = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str().map(String::from)))
                .unwrap_or(body);

            error!(provider = "gateway", %status, "gateway error");
            return Err(Self::unavailable(format!("gateway returned {status}: {detail}")));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            error!(provider = "gateway", error = %e, "failed to parse response");
            Self::unavailable(format!("failed to parse response: {e}"))
        })?;

        if parsed.data.len() != texts.len() {
            return Err(Self::unavailable(format!(
                "gateway returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "gateway"
    }
}

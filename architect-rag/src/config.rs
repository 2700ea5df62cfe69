//! Configuration for the retrieval pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::gateway::GatewayEmbeddingProvider;
use crate::local::LocalEmbeddingProvider;
use crate::openai::OpenAiEmbeddingProvider;

/// Configuration parameters for the retrieval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in bytes.
    pub chunk_size: usize,
    /// Bytes shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Minimum similarity score; results below it are discarded even when
    /// fewer than `top_k` remain.
    pub min_score: f32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { chunk_size: 800, chunk_overlap: 120, top_k: 4, min_score: 0.0 }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in bytes.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in bytes.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity score for retrieval results.
    pub fn min_score(mut self, score: f32) -> Self {
        self.config.min_score = score;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `min_score` is outside `[-1.0, 1.0]`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if !(-1.0..=1.0).contains(&self.config.min_score) {
            return Err(RagError::Config(format!(
                "min_score ({}) must be within [-1.0, 1.0]",
                self.config.min_score
            )));
        }
        Ok(self.config)
    }
}

/// Embedding provider selection, fixed at process start.
///
/// The selection couples to the vector index: vectors stored under one
/// provider are meaningless to another, so changing the provider requires
/// re-ingesting every document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum EmbeddingProviderConfig {
    /// Pretrained ONNX model run in-process (no network dependency).
    Local {
        /// Path to the ONNX model file.
        model_path: PathBuf,
        /// Path to the matching `tokenizer.json`.
        tokenizer_path: PathBuf,
        /// The model's hidden size.
        dimensions: usize,
    },
    /// The OpenAI embeddings API.
    OpenAi {
        /// API key.
        api_key: String,
        /// Embedding model name.
        model: String,
    },
    /// The platform's hosted gateway (OpenAI-compatible wire format).
    Gateway {
        /// Gateway root URL.
        base_url: String,
        /// API key.
        api_key: String,
        /// Embedding model name.
        model: String,
        /// Output dimensionality of the gateway's model.
        dimensions: usize,
    },
}

impl EmbeddingProviderConfig {
    /// Construct the configured [`EmbeddingProvider`].
    pub fn build(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        match self {
            Self::Local { model_path, tokenizer_path, dimensions } => Ok(Arc::new(
                LocalEmbeddingProvider::from_files(model_path, tokenizer_path, *dimensions)?,
            )),
            Self::OpenAi { api_key, model } => {
                Ok(Arc::new(OpenAiEmbeddingProvider::new(api_key.clone())?.with_model(model)))
            }
            Self::Gateway { base_url, api_key, model, dimensions } => Ok(Arc::new(
                GatewayEmbeddingProvider::new(base_url, api_key.clone(), model, *dimensions)?,
            )),
        }
    }
}

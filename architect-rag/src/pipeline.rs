//! Retrieval pipeline: ingestion and query execution over the vector index.
//!
//! The [`RagPipeline`] composes an [`EmbeddingProvider`], a [`VectorIndex`],
//! and a [`Chunker`] into the two index-level workflows: ingesting documents
//! (chunk → embed → replace) and retrieving chunks for a query
//! (embed → search → threshold).
//!
//! # Example
//!
//! ```rust,ignore
//! use architect_rag::{BoundaryChunker, RagConfig, RagPipeline, SqliteVectorIndex};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(provider)
//!     .index(Arc::new(SqliteVectorIndex::open("data/index.db").await?))
//!     .chunker(Arc::new(BoundaryChunker::new(800, 120)))
//!     .build()?;
//!
//! pipeline.ingest(&document).await?;
//! let results = pipeline.retrieve("What is the challenge period?").await?;
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// How many recent user turns participate in query expansion.
const EXPANSION_TURNS: usize = 2;

/// Snapshot of the index and provider state, for health and stats reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of chunks currently stored.
    pub chunk_count: usize,
    /// The configured embedding provider's name.
    pub provider: String,
    /// The provider's embedding dimensionality.
    pub dimensions: usize,
}

/// The retrieval pipeline.
///
/// Ingestion is a batch/offline operation and the only path that writes to
/// the index; query serving never writes. Construct via
/// [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    chunker: Arc<dyn Chunker>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Return a reference to the vector index.
    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Ingest a single document: chunk → embed → replace.
    ///
    /// Atomically replaces any chunks previously stored for the document's
    /// `source_id`, so re-ingesting the same content is idempotent — the
    /// final index state has the same chunk count and no duplicates. A
    /// document whose text chunks to nothing simply clears its prior entries.
    ///
    /// Returns the chunks that were stored, embeddings attached.
    pub async fn ingest(&self, document: &Document) -> Result<Vec<Chunk>> {
        let mut chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            self.index.delete(&document.source_id).await?;
            info!(source_id = %document.source_id, chunk_count = 0, "ingested document (empty)");
            return Ok(chunks);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.provider.embed_batch(&texts).await.inspect_err(|e| {
            error!(source_id = %document.source_id, error = %e, "embedding failed during ingestion");
        })?;

        let expected = self.provider.dimensions();
        for embedding in &embeddings {
            if embedding.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.index.replace(&document.source_id, &chunks).await.inspect_err(|e| {
            error!(source_id = %document.source_id, error = %e, "index write failed during ingestion");
        })?;

        info!(source_id = %document.source_id, chunk_count = chunks.len(), "ingested document");
        Ok(chunks)
    }

    /// Ingest multiple documents.
    ///
    /// Stops at the first document that fails; documents already ingested
    /// stay ingested (each document's replace is individually atomic).
    /// Returns the total number of chunks stored.
    pub async fn ingest_batch(&self, documents: &[Document]) -> Result<usize> {
        let mut total = 0;
        for document in documents {
            total += self.ingest(document).await?.len();
        }
        Ok(total)
    }

    /// Retrieve the chunks most relevant to `query`.
    ///
    /// Embeds the query and searches the index with the configured `top_k`
    /// and `min_score`. An empty result means no chunk scored above the
    /// threshold — a valid outcome, distinct from the error raised when the
    /// embedding provider is unreachable.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let embedding = self.provider.embed(query).await.inspect_err(|e| {
            error!(error = %e, "query embedding failed");
        })?;

        let results =
            self.index.query(&embedding, self.config.top_k, self.config.min_score).await?;

        info!(result_count = results.len(), "retrieval completed");
        Ok(results)
    }

    /// Retrieve with conversational context.
    ///
    /// Expands the query with the most recent user turns before embedding,
    /// so follow-up questions ("what about the batcher?") carry the subject
    /// of the preceding turns into the similarity search. The expansion is a
    /// pure text transform: the same query and history always produce the
    /// same search text.
    pub async fn retrieve_with_context(
        &self,
        query: &str,
        recent_user_turns: &[String],
    ) -> Result<Vec<SearchResult>> {
        let expanded = expand_query(query, recent_user_turns);
        self.retrieve(&expanded).await
    }

    /// Report index and provider state.
    pub async fn stats(&self) -> Result<IndexStats> {
        Ok(IndexStats {
            chunk_count: self.index.count().await?,
            provider: self.provider.name().to_string(),
            dimensions: self.provider.dimensions(),
        })
    }
}

/// Prefix the query with the most recent user turns, oldest first.
///
/// Pure and deterministic; used only to build the text that gets embedded,
/// never shown to the model or the user.
pub fn expand_query(query: &str, recent_user_turns: &[String]) -> String {
    let tail: Vec<&str> = recent_user_turns
        .iter()
        .rev()
        .take(EXPANSION_TURNS)
        .map(String::as_str)
        .collect();

    if tail.is_empty() {
        return query.to_string();
    }

    let mut expanded = String::new();
    for turn in tail.into_iter().rev() {
        expanded.push_str(turn);
        expanded.push('\n');
    }
    expanded.push_str(query);
    expanded
}

/// Builder for constructing a [`RagPipeline`].
///
/// All fields are required. Call [`build()`](RagPipelineBuilder::build) to
/// validate and produce the pipeline.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<Arc<dyn VectorIndex>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the vector index backend.
    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        let provider = self
            .provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let index = self.index.ok_or_else(|| RagError::Config("index is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::Config("chunker is required".to_string()))?;

        Ok(RagPipeline { config, provider, index, chunker })
    }
}

//! In-memory vector index using cosine similarity.
//!
//! [`InMemoryVectorIndex`] keeps everything in a `tokio::sync::RwLock`-guarded
//! table. It offers no durability and is meant for tests and ephemeral use;
//! production deployments use [`SqliteVectorIndex`](crate::SqliteVectorIndex).

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::index::{VectorIndex, cosine_similarity, rank};

#[derive(Debug, Default)]
struct State {
    /// Pinned on first write; all stored and queried vectors must match.
    dimensions: Option<usize>,
    /// Entries in insertion order (ties in query scoring resolve to this order).
    entries: Vec<Chunk>,
}

/// An in-memory [`VectorIndex`] using cosine similarity for search.
///
/// Writers take the lock exclusively, so replaces are atomic with respect to
/// concurrent queries; readers share it.
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    state: RwLock<State>,
}

impl InMemoryVectorIndex {
    /// Create a new empty in-memory index.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn replace(&self, source_id: &str, chunks: &[Chunk]) -> Result<()> {
        let mut state = self.state.write().await;

        // Validate every vector before touching any entry, so a failed
        // replace leaves the index exactly as it was.
        if let Some(first) = chunks.first() {
            let dims = state.dimensions.unwrap_or(first.embedding.len());
            if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dims) {
                return Err(RagError::DimensionMismatch {
                    expected: dims,
                    actual: bad.embedding.len(),
                });
            }
            state.dimensions = Some(dims);
        }

        state.entries.retain(|c| c.source_id != source_id);
        state.entries.extend(chunks.iter().cloned());
        Ok(())
    }

    async fn delete(&self, source_id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        state.entries.retain(|c| c.source_id != source_id);
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let state = self.state.read().await;
        let Some(expected) = state.dimensions else {
            return Ok(Vec::new());
        };
        if embedding.len() != expected {
            return Err(RagError::DimensionMismatch { expected, actual: embedding.len() });
        }

        let scored: Vec<SearchResult> = state
            .entries
            .iter()
            .map(|chunk| SearchResult {
                chunk: chunk.clone(),
                score: cosine_similarity(&chunk.embedding, embedding),
            })
            .collect();

        Ok(rank(scored, top_k, min_score))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.state.read().await.entries.len())
    }

    async fn dimensions(&self) -> Result<Option<usize>> {
        Ok(self.state.read().await.dimensions)
    }
}

//! Vector index trait for storing and searching chunk embeddings.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A storage backend for chunk embeddings with similarity search.
///
/// The index owns its entries: a source's chunks are created by
/// [`replace`](VectorIndex::replace) and destroyed by a later `replace` or
/// [`delete`](VectorIndex::delete) for the same source identifier, so
/// re-ingestion never leaves duplicates or orphans.
///
/// The first write pins the index to its embedding dimension; any vector of
/// a different size — stored or queried — is a hard
/// [`DimensionMismatch`](crate::RagError::DimensionMismatch).
///
/// # Example
///
/// ```rust,ignore
/// use architect_rag::{SqliteVectorIndex, VectorIndex};
///
/// let index = SqliteVectorIndex::open("data/index.db").await?;
/// index.replace("docs/deploy", &chunks).await?;
/// let results = index.query(&query_embedding, 4, 0.0).await?;
/// ```
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Atomically replace all chunks for `source_id` with the given chunks.
    ///
    /// Chunks must have embeddings set. Passing an empty slice is equivalent
    /// to [`delete`](VectorIndex::delete).
    async fn replace(&self, source_id: &str, chunks: &[Chunk]) -> Result<()>;

    /// Delete all chunks for `source_id`. Deleting an unknown source is a no-op.
    async fn delete(&self, source_id: &str) -> Result<()>;

    /// Return the `top_k` chunks most similar to `embedding`, skipping any
    /// scoring below `min_score`.
    ///
    /// Results are ordered by descending cosine similarity, ties broken by
    /// insertion order. An empty result is valid — fewer than `top_k`
    /// matches above the threshold is not an error.
    async fn query(&self, embedding: &[f32], top_k: usize, min_score: f32)
    -> Result<Vec<SearchResult>>;

    /// Number of chunks currently stored.
    async fn count(&self) -> Result<usize>;

    /// The pinned embedding dimension, or `None` if nothing has been stored yet.
    async fn dimensions(&self) -> Result<Option<usize>>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Rank scored results: descending score, ties by insertion order, then
/// apply the threshold and the `top_k` bound.
///
/// Callers pass results in insertion order; the stable sort preserves that
/// order among equal scores.
pub(crate) fn rank(
    mut scored: Vec<SearchResult>,
    top_k: usize,
    min_score: f32,
) -> Vec<SearchResult> {
    scored.retain(|r| r.score >= min_score);
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}

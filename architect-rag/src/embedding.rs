//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific embedding backend — an in-process model
/// ([`LocalEmbeddingProvider`](crate::LocalEmbeddingProvider)), the OpenAI
/// API ([`OpenAiEmbeddingProvider`](crate::OpenAiEmbeddingProvider)), or the
/// platform gateway ([`GatewayEmbeddingProvider`](crate::GatewayEmbeddingProvider))
/// — behind one async interface. The provider is chosen by configuration at
/// process start and fixed for the process lifetime: vectors from different
/// providers are not comparable, so switching providers invalidates any
/// index populated with the old one.
///
/// Batch calls preserve input order and produce exactly one vector per input
/// string. Empty strings embed to a well-defined vector, never an error.
///
/// # Example
///
/// ```rust,ignore
/// use architect_rag::EmbeddingProvider;
///
/// let embedding = provider.embed("challenge period").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The default implementation calls [`embed`](EmbeddingProvider::embed)
    /// sequentially for each input. Backends with native batching should
    /// override it.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// A short name identifying the provider, used in logs and health reports.
    fn name(&self) -> &str;
}

//! Error types for the `architect-rag` crate.

use thiserror::Error;

/// Errors that can occur during ingestion and retrieval.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding provider could not be reached or failed to produce embeddings.
    #[error("embedding provider unavailable ({provider}): {message}")]
    ProviderUnavailable {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector index could not be read or written.
    #[error("vector index unavailable ({backend}): {message}")]
    IndexUnavailable {
        /// The index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An embedding's dimension disagrees with the dimension already in use.
    ///
    /// Unrecoverable for the affected index: the stored vectors were produced
    /// by a different provider or model, and the index must be re-ingested
    /// with a consistent one. Vectors are never truncated or padded to fit.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimension the index (or configuration) expects.
        expected: usize,
        /// The dimension that was actually produced.
        actual: usize,
    },

    /// A configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;

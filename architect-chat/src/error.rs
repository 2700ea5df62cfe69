//! Error types for the `architect-chat` crate.

use thiserror::Error;

use architect_model::ModelError;
use architect_rag::RagError;

/// Errors that can surface from the answer orchestrator.
///
/// With the default degrade policy most retrieval and generation failures
/// never reach the caller — they become degraded [`Answer`](crate::Answer)s
/// instead. What does propagate is either unrecoverable (a dimension
/// mismatch) or explicitly requested via
/// [`FailurePolicy::Fail`](crate::FailurePolicy::Fail).
#[derive(Debug, Error)]
pub enum ChatError {
    /// A retrieval-side failure (embedding provider, vector index).
    #[error(transparent)]
    Retrieval(#[from] RagError),

    /// A generation-side failure (completion service).
    #[error(transparent)]
    Generation(#[from] ModelError),

    /// A configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A convenience result type for chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;

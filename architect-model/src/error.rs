//! Error types for the `architect-model` crate.

use thiserror::Error;

/// Errors that can occur when talking to the completion service.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The completion service was unreachable, timed out, or refused the request.
    ///
    /// Recoverable by policy: the orchestrator decides whether to surface an
    /// apology or fail the request.
    #[error("generation unavailable: {message}")]
    GenerationUnavailable {
        /// A description of the failure.
        message: String,
    },

    /// The service answered, but with a payload we could not use.
    #[error("invalid completion response: {0}")]
    InvalidResponse(String),

    /// A configuration validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A convenience result type for completion operations.
pub type Result<T> = std::result::Result<T, ModelError>;

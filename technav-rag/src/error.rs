//! Error types for the `technav-rag` crate.

use thiserror::Error;

/// Errors that can occur in storage, retrieval and answer generation.
///
/// Every variant maps to one failure kind a caller may want to react to
/// differently: fix the input, fix the setup, or try again later.
#[derive(Debug, Error)]
pub enum RagError {
    /// Caller-supplied input violates a precondition (empty content, missing owner).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The embedding provider was unreachable or rejected the input.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A document store write failed.
    #[error("Persistence error ({backend}): {message}")]
    Persistence {
        /// The document store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A document store query or ranking call failed.
    #[error("Retrieval error ({backend}): {message}")]
    Retrieval {
        /// The document store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// Something is misconfigured (missing credential, invalid parameter).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A network-level failure or timeout. Safe to retry with backoff.
    #[error("Transient error during {operation}: {message}")]
    Transient {
        /// The operation that was in flight.
        operation: String,
        /// A description of the failure.
        message: String,
    },

    /// Any generative model failure not otherwise classified.
    #[error("Generation error ({model}): {message}")]
    Generation {
        /// The model that produced the error.
        model: String,
        /// A description of the failure.
        message: String,
    },
}

impl RagError {
    /// Returns `true` when the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RagError::Transient { .. })
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

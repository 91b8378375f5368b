//! Error types for the `docqa` crate.

use thiserror::Error;

/// Errors that can occur while indexing a document or answering a question.
#[derive(Debug, Error)]
pub enum QaError {
    /// The embedding provider failed (auth, network, quota or timeout).
    #[error("Embedding provider error ({provider}): {message}")]
    EmbeddingProvider {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The completion provider failed (auth, network, quota or timeout).
    #[error("Completion provider error ({provider}): {message}")]
    CompletionProvider {
        /// The completion provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Retrieval was attempted against an index with no sections.
    #[error("The knowledge index is empty")]
    EmptyIndex,

    /// A question was asked before any document was loaded.
    #[error("No document loaded")]
    NoDocument,

    /// The uploaded document could not be read as text.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QaError {
    pub(crate) fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingProvider { provider: provider.into(), message: message.into() }
    }

    pub(crate) fn completion(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CompletionProvider { provider: provider.into(), message: message.into() }
    }

    /// Whether a session can keep going after this error.
    ///
    /// Everything raised on the per-turn path leaves the index and memory in
    /// their last-good state, so only configuration errors are fatal.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

/// A convenience result type for `docqa` operations.
pub type Result<T> = std::result::Result<T, QaError>;

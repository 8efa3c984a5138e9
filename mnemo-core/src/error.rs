//! Error types for the memory service

use thiserror::Error;

/// Result type alias for memory operations
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Errors that can occur across the memory service
///
/// `Storage`, `NotFound`, and `InvalidInput` surface to clients (500/404/400);
/// `Cache`, `Embedding`, and `Blob` are internal and must never leak past the
/// tool-endpoint boundary.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Durable store error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Cache backend error
    #[error("Cache error: {0}")]
    Cache(String),

    /// Embedding generation error
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Blob store error
    #[error("Blob error: {0}")]
    Blob(String),

    /// Entry, attachment, or scope not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MemoryError {
    /// True when the error maps to a client-visible 404
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

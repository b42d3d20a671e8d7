//! Error types for the retrieval pipeline.

use std::time::Duration;

use thiserror::Error;

/// Errors from an embedding provider.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an error status.
    #[error("embedding API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response was missing data or had the wrong shape.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    /// The vector length differs from the provider's declared dimensions.
    #[error("expected {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The provider could not be configured.
    #[error("embedding provider misconfigured: {0}")]
    Config(String),
}

/// Errors from a vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A record's vector length differs from the store's dimensionality.
    #[error("record {id} has {actual} dimensions, store holds {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    /// Stored data could not be decoded.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// An in-memory lock was poisoned by a panicking writer.
    #[error("vector store lock poisoned")]
    Poisoned,
}

/// Errors that fail an ingest call. Nothing is guaranteed to be stored.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The text contains no tokens.
    #[error("document {0} contains no text")]
    EmptyDocument(String),

    /// Embedding a chunk failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Writing to the vector store failed.
    #[error("vector store failed: {0}")]
    Store(#[from] StoreError),

    /// An embedding or store call exceeded its deadline.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// The file type is not one of the accepted kinds.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Text could not be extracted from the uploaded file.
    #[error("could not extract text: {0}")]
    Extraction(String),
}

/// Query-side failure. Callers of the fail-open search never see this;
/// it is logged and replaced with an empty result.
#[derive(Debug, Error)]
pub enum RetrievalUnavailable {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store failed: {0}")]
    Store(#[from] StoreError),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
}

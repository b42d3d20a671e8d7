//! Vector store abstraction.
//!
//! A store persists `(id, vector, text, metadata)` records and answers
//! k-nearest-neighbour queries by cosine similarity.
//!
//! | Implementation | Backend |
//! |----------------|---------|
//! | [`InMemoryVectorStore`] | brute-force scan under a lock |
//! | [`crate::db::PgVectorStore`] | PostgreSQL + pgvector |
//!
//! Contract shared by all implementations:
//!
//! - `upsert` is all-or-nothing per call
//! - an upsert of an existing id replaces the record in place (last write wins)
//! - results are ordered by descending score, ties by insertion order

mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use merchant_assistant_core::DocumentId;

use super::error::StoreError;

pub use memory::InMemoryVectorStore;

/// Metadata stored with each chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub document_id: DocumentId,
    pub filename: String,
    pub sequence_index: usize,
}

/// One record to upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub id: String,
    pub text: String,
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// One query hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f32,
}

/// Similarity backend.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace a batch of records atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if any record is rejected; no record from the batch
    /// is stored in that case.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), StoreError>;

    /// The `k` records most similar to `vector`, best first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>, StoreError>;
}

//! Knowledge-base retrieval.
//!
//! Documents are split into overlapping token windows ([`chunker`]), each
//! chunk is embedded ([`embeddings`]) and written to a [`store::VectorStore`].
//! Queries embed the question and return the nearest chunks.
//!
//! # Modules
//!
//! - `chunker` - Token-window chunking
//! - `embeddings` - Embedding providers
//! - `extract` - Text extraction for uploaded files
//! - `pipeline` - Ingest and search over an embedder and a store
//! - `store` - Vector store trait and in-memory backend

pub mod chunker;
pub mod embeddings;
mod error;
pub mod extract;
mod pipeline;
pub mod store;

pub use chunker::{ChunkingConfig, ChunkingConfigError, TextChunk, chunk_text};
pub use embeddings::{Embedder, HashingEmbedder, OpenAiEmbedder};
pub use error::{EmbeddingError, IngestionError, RetrievalUnavailable, StoreError};
pub use pipeline::{
    DEFAULT_EMBED_CONCURRENCY, DEFAULT_RETRIEVAL_TIMEOUT, DEFAULT_TOP_K, Document, IngestReport,
    RetrievalConfig, RetrievalPipeline,
};
pub use store::{ChunkMetadata, InMemoryVectorStore, ScoredChunk, VectorRecord, VectorStore};

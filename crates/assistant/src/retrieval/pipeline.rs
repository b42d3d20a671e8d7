//! Ingestion and query over an embedder and a vector store.

use std::sync::Arc;
use std::time::Duration;

use futures::{StreamExt, TryStreamExt, stream};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use merchant_assistant_core::DocumentId;

use super::chunker::{ChunkingConfig, chunk_text};
use super::embeddings::{Embedder, check_dimensions};
use super::error::{EmbeddingError, IngestionError, RetrievalUnavailable};
use super::extract::{DocumentKind, extract_text};
use super::store::{ChunkMetadata, ScoredChunk, VectorRecord, VectorStore};

/// Default number of chunks returned by a search.
pub const DEFAULT_TOP_K: usize = 5;
/// Default concurrent embedding calls during ingestion.
pub const DEFAULT_EMBED_CONCURRENCY: usize = 4;
/// Default deadline for each embedding or store call.
pub const DEFAULT_RETRIEVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Retrieval tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrievalConfig {
    /// Window and overlap for chunking.
    pub chunking: ChunkingConfig,
    /// Concurrent embedding calls during ingestion (minimum 1).
    pub embed_concurrency: usize,
    /// Deadline for each embedding or store call.
    pub timeout: Duration,
    /// Chunks returned by the knowledge search tool.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            embed_concurrency: DEFAULT_EMBED_CONCURRENCY,
            timeout: DEFAULT_RETRIEVAL_TIMEOUT,
            top_k: DEFAULT_TOP_K,
        }
    }
}

/// An ingested document. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub filename: String,
    /// Chunk IDs in sequence order.
    pub chunk_ids: Vec<String>,
}

/// Outcome of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub document: Document,
    pub chunk_count: usize,
}

/// Chunk → embed → upsert on the way in; embed → rank on the way out.
#[derive(Clone)]
pub struct RetrievalPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    config: RetrievalConfig,
}

impl std::fmt::Debug for RetrievalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalPipeline")
            .field("embedder", &self.embedder.model())
            .field("dimensions", &self.embedder.dimensions())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetrievalPipeline {
    /// Create a pipeline.
    #[must_use]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Chunk, embed and store `text` as a new document.
    ///
    /// All chunks are written in one batch after every embedding succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is empty or any embedding or the store
    /// write fails or times out. The caller must not assume anything was
    /// stored in that case.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn ingest(&self, text: &str, filename: &str) -> Result<IngestReport, IngestionError> {
        let chunks = chunk_text(text, self.config.chunking);
        if chunks.is_empty() {
            return Err(IngestionError::EmptyDocument(filename.to_string()));
        }

        let document_id = DocumentId::generate();
        debug!(%document_id, chunks = chunks.len(), "Embedding chunks");

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embedder = Arc::clone(&self.embedder);
        let timeout = self.config.timeout;
        let vectors: Vec<Vec<f32>> = stream::iter(texts)
            .map(move |text| embed_timed(Arc::clone(&embedder), text, timeout))
            .buffered(self.config.embed_concurrency.max(1))
            .try_collect()
            .await
            .map_err(|e| match e {
                Timed::Elapsed => IngestionError::Timeout {
                    operation: "embedding",
                    timeout: self.config.timeout,
                },
                Timed::Failed(e) => IngestionError::Embedding(e),
            })?;

        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| VectorRecord {
                id: document_id.chunk_id(chunk.sequence_index),
                text: chunk.text,
                vector,
                metadata: ChunkMetadata {
                    document_id,
                    filename: filename.to_string(),
                    sequence_index: chunk.sequence_index,
                },
            })
            .collect();
        let chunk_ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();

        tokio::time::timeout(self.config.timeout, self.store.upsert(records))
            .await
            .map_err(|_| IngestionError::Timeout {
                operation: "vector store upsert",
                timeout: self.config.timeout,
            })??;

        info!(%document_id, filename, chunks = chunk_ids.len(), "Document ingested");

        Ok(IngestReport {
            chunk_count: chunk_ids.len(),
            document: Document {
                id: document_id,
                filename: filename.to_string(),
                chunk_ids,
            },
        })
    }

    /// Extract text from an uploaded file and ingest it.
    ///
    /// # Errors
    ///
    /// Returns an error for unsupported file types, extraction failures, or
    /// anything [`Self::ingest`] rejects.
    pub async fn ingest_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<IngestReport, IngestionError> {
        let kind = DocumentKind::from_filename(filename)
            .ok_or_else(|| IngestionError::UnsupportedFileType(filename.to_string()))?;

        let text = tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
            .await
            .map_err(|e| IngestionError::Extraction(format!("extraction task failed: {e}")))??;

        self.ingest(&text, filename).await
    }

    /// Rank stored chunks against `query`, returning hits with scores.
    ///
    /// A blank query returns no hits without calling the embedder.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedder or store fails or times out.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn search_scored(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>, RetrievalUnavailable> {
        if query.trim().is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embed(query).await.map_err(|e| match e {
            Timed::Elapsed => RetrievalUnavailable::Timeout {
                operation: "embedding",
                timeout: self.config.timeout,
            },
            Timed::Failed(e) => RetrievalUnavailable::Embedding(e),
        })?;

        let hits = tokio::time::timeout(self.config.timeout, self.store.query(&vector, k))
            .await
            .map_err(|_| RetrievalUnavailable::Timeout {
                operation: "vector store query",
                timeout: self.config.timeout,
            })?
            .map_err(RetrievalUnavailable::Store)?;

        debug!(hits = hits.len(), "Knowledge search complete");
        Ok(hits)
    }

    /// Texts of the `k` best chunks for `query`, best first.
    ///
    /// Never fails: when the embedder or store is unavailable the error is
    /// logged and an empty list is returned.
    pub async fn search(&self, query: &str, k: usize) -> Vec<String> {
        match self.search_scored(query, k).await {
            Ok(hits) => hits.into_iter().map(|h| h.text).collect(),
            Err(e) => {
                warn!(error = %e, "Knowledge base unavailable, returning no results");
                Vec::new()
            }
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Timed<EmbeddingError>> {
        embed_timed(Arc::clone(&self.embedder), text.to_string(), self.config.timeout).await
    }
}

/// Embed one owned text under `timeout`, checking the vector length.
async fn embed_timed(
    embedder: Arc<dyn Embedder>,
    text: String,
    timeout: Duration,
) -> Result<Vec<f32>, Timed<EmbeddingError>> {
    let vector = tokio::time::timeout(timeout, embedder.embed(&text))
        .await
        .map_err(|_| Timed::Elapsed)?
        .map_err(Timed::Failed)?;
    check_dimensions(embedder.dimensions(), vector).map_err(Timed::Failed)
}

/// A fallible call that may also run out of time.
#[derive(Debug)]
enum Timed<E> {
    Elapsed,
    Failed(E),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::retrieval::embeddings::HashingEmbedder;
    use crate::retrieval::store::InMemoryVectorStore;

    fn pipeline(store: Arc<InMemoryVectorStore>) -> RetrievalPipeline {
        RetrievalPipeline::new(
            Arc::new(HashingEmbedder::new(128)),
            store,
            RetrievalConfig::default(),
        )
    }

    struct CountingEmbedder {
        inner: HashingEmbedder,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model(&self) -> &str {
            "counting"
        }
        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.inner.embed_sync(text))
        }
    }

    struct WrongSizeEmbedder;

    #[async_trait]
    impl Embedder for WrongSizeEmbedder {
        fn model(&self) -> &str {
            "wrong"
        }
        fn dimensions(&self) -> usize {
            4
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0; 3])
        }
    }

    struct SlowEmbedder;

    #[async_trait]
    impl Embedder for SlowEmbedder {
        fn model(&self) -> &str {
            "slow"
        }
        fn dimensions(&self) -> usize {
            1
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![1.0])
        }
    }

    /// Records the most embedding calls that were in flight at once.
    struct GatedEmbedder {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for GatedEmbedder {
        fn model(&self) -> &str {
            "gated"
        }
        fn dimensions(&self) -> usize {
            1
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![1.0])
        }
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[tokio::test]
    async fn test_ingest_assigns_sequential_chunk_ids() {
        let store = Arc::new(InMemoryVectorStore::new());
        let report = pipeline(store.clone())
            .ingest(&words(1200), "playbook.txt")
            .await
            .unwrap();

        assert_eq!(report.chunk_count, 3);
        let id = report.document.id;
        assert_eq!(
            report.document.chunk_ids,
            [id.chunk_id(0), id.chunk_id(1), id.chunk_id(2)]
        );
        assert_eq!(store.len().unwrap(), 3);

        let stored = store.get(&id.chunk_id(2)).unwrap().unwrap();
        assert_eq!(stored.metadata.sequence_index, 2);
        assert_eq!(stored.metadata.filename, "playbook.txt");
        assert_eq!(stored.metadata.document_id, id);
    }

    #[tokio::test]
    async fn test_one_embedding_call_per_chunk() {
        let embedder = Arc::new(CountingEmbedder {
            inner: HashingEmbedder::new(32),
            calls: AtomicUsize::new(0),
        });
        let pipeline = RetrievalPipeline::new(
            embedder.clone(),
            Arc::new(InMemoryVectorStore::new()),
            RetrievalConfig::default(),
        );
        pipeline.ingest(&words(2000), "big.txt").await.unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_embedding_concurrency_is_bounded() {
        let embedder = Arc::new(GatedEmbedder {
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        });
        let config = RetrievalConfig {
            chunking: ChunkingConfig::new(10, 0).unwrap(),
            embed_concurrency: 2,
            ..RetrievalConfig::default()
        };
        let pipeline =
            RetrievalPipeline::new(embedder.clone(), Arc::new(InMemoryVectorStore::new()), config);

        let report = pipeline.ingest(&words(120), "many.txt").await.unwrap();

        assert_eq!(report.chunk_count, 12);
        assert_eq!(embedder.max_in_flight.load(Ordering::SeqCst), 2);
        assert_eq!(embedder.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ingest_runs_on_spawned_task() {
        let store = Arc::new(InMemoryVectorStore::new());
        let pipeline = pipeline(store.clone());

        let report = tokio::spawn(async move { pipeline.ingest(&words(1200), "spawned.txt").await })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.chunk_count, 3);
        assert_eq!(store.len().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reingest_creates_new_document() {
        let store = Arc::new(InMemoryVectorStore::new());
        let pipeline = pipeline(store.clone());
        let first = pipeline.ingest("safety stock", "a.md").await.unwrap();
        let second = pipeline.ingest("safety stock", "a.md").await.unwrap();
        assert_ne!(first.document.id, second.document.id);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_document_is_rejected() {
        let store = Arc::new(InMemoryVectorStore::new());
        let err = pipeline(store.clone()).ingest(" \n ", "blank.txt").await.unwrap_err();
        assert!(matches!(err, IngestionError::EmptyDocument(ref name) if name == "blank.txt"));
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_fails_ingest() {
        let store = Arc::new(InMemoryVectorStore::new());
        let pipeline = RetrievalPipeline::new(
            Arc::new(WrongSizeEmbedder),
            store.clone(),
            RetrievalConfig::default(),
        );
        let err = pipeline.ingest("lead time", "x.txt").await.unwrap_err();
        assert!(matches!(
            err,
            IngestionError::Embedding(EmbeddingError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_embedding_timeout() {
        let pipeline = RetrievalPipeline::new(
            Arc::new(SlowEmbedder),
            Arc::new(InMemoryVectorStore::new()),
            RetrievalConfig::default(),
        );
        let err = pipeline.ingest("lead time", "x.txt").await.unwrap_err();
        assert!(matches!(
            err,
            IngestionError::Timeout {
                operation: "embedding",
                ..
            }
        ));

        // Query side fails open.
        assert!(pipeline.search("lead time", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_exact_text_ranks_first_with_score_one() {
        let store = Arc::new(InMemoryVectorStore::new());
        let pipeline = pipeline(store);
        pipeline
            .ingest("Reorder point equals lead time demand plus safety stock", "a.md")
            .await
            .unwrap();
        let report = pipeline
            .ingest("Safety stock absorbs forecast error", "b.md")
            .await
            .unwrap();

        let hits = pipeline
            .search_scored("Safety stock absorbs forecast error", 5)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, report.document.chunk_ids[0]);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_blank_query_skips_embedder() {
        let embedder = Arc::new(CountingEmbedder {
            inner: HashingEmbedder::new(8),
            calls: AtomicUsize::new(0),
        });
        let pipeline = RetrievalPipeline::new(
            embedder.clone(),
            Arc::new(InMemoryVectorStore::new()),
            RetrievalConfig::default(),
        );
        assert!(pipeline.search("   ", 5).await.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ingest_file_rejects_unknown_type() {
        let pipeline = pipeline(Arc::new(InMemoryVectorStore::new()));
        let err = pipeline
            .ingest_file("data.csv", b"a,b".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::UnsupportedFileType(_)));

        let report = pipeline
            .ingest_file("notes.md", b"# Cadence\nWeekly".to_vec())
            .await
            .unwrap();
        assert_eq!(report.chunk_count, 1);
    }
}

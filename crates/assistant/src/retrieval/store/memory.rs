//! In-memory vector store.
//!
//! Records live in a `Vec` behind a `std::sync::RwLock`, in insertion order.
//! Queries are a brute-force cosine scan followed by a stable sort, so equal
//! scores keep insertion order.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{ScoredChunk, StoreError, VectorRecord, VectorStore};
use crate::retrieval::embeddings::cosine_similarity;

#[derive(Debug, Default)]
struct Inner {
    records: Vec<VectorRecord>,
    positions: HashMap<String, usize>,
    dimensions: Option<usize>,
}

/// Brute-force store for tests and offline runs.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    inner: RwLock<Inner>,
}

impl InMemoryVectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if a writer panicked.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().map_err(|_| StoreError::Poisoned)?.records.len())
    }

    /// Whether the store is empty.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if a writer panicked.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        self.len().map(|n| n == 0)
    }

    /// Look up a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if a writer panicked.
    pub fn get(&self, id: &str) -> Result<Option<VectorRecord>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner
            .positions
            .get(id)
            .and_then(|&i| inner.records.get(i))
            .cloned())
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        // Validate the whole batch before touching anything.
        let expected = inner
            .dimensions
            .or_else(|| records.first().map(|r| r.vector.len()));
        if let Some(expected) = expected {
            if let Some(bad) = records.iter().find(|r| r.vector.len() != expected) {
                return Err(StoreError::DimensionMismatch {
                    id: bad.id.clone(),
                    expected,
                    actual: bad.vector.len(),
                });
            }
        }
        if !records.is_empty() {
            inner.dimensions = expected;
        }

        for record in records {
            match inner.positions.get(&record.id).copied() {
                Some(position) => {
                    if let Some(slot) = inner.records.get_mut(position) {
                        *slot = record;
                    }
                }
                None => {
                    let position = inner.records.len();
                    inner.positions.insert(record.id.clone(), position);
                    inner.records.push(record);
                }
            }
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>, StoreError> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;

        let mut scored: Vec<(f32, &VectorRecord)> = inner
            .records
            .iter()
            .map(|r| (cosine_similarity(vector, &r.vector), r))
            .collect();
        // `sort_by` is stable: ties stay in insertion order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, r)| ScoredChunk {
                id: r.id.clone(),
                text: r.text.clone(),
                metadata: r.metadata.clone(),
                score,
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use merchant_assistant_core::DocumentId;

    use super::*;
    use crate::retrieval::store::ChunkMetadata;

    fn record(id: &str, text: &str, vector: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            text: text.to_string(),
            vector,
            metadata: ChunkMetadata {
                document_id: DocumentId::generate(),
                filename: "guide.md".to_string(),
                sequence_index: 0,
            },
        }
    }

    #[tokio::test]
    async fn test_query_orders_by_score() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                record("a", "east", vec![1.0, 0.0]),
                record("b", "north", vec![0.0, 1.0]),
                record("c", "north-east", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = store.query(&[0.0, 1.0], 2).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["b", "c"]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                record("first", "x", vec![1.0, 0.0]),
                record("second", "y", vec![2.0, 0.0]),
                record("third", "z", vec![3.0, 0.0]),
            ])
            .await
            .unwrap();

        let hits = store.query(&[1.0, 0.0], 3).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                record("a", "old", vec![1.0, 0.0]),
                record("b", "other", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();
        store
            .upsert(vec![record("a", "new", vec![1.0, 0.0])])
            .await
            .unwrap();

        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.get("a").unwrap().unwrap().text, "new");
        let hits = store.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[0].text, "new");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejects_whole_batch() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![record("a", "x", vec![1.0, 0.0])])
            .await
            .unwrap();

        let err = store
            .upsert(vec![
                record("b", "y", vec![0.0, 1.0]),
                record("c", "z", vec![0.0, 1.0, 0.0]),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { ref id, .. } if id == "c"));
        assert_eq!(store.len().unwrap(), 1);
        assert!(store.get("b").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_batch_must_be_consistent() {
        let store = InMemoryVectorStore::new();
        let err = store
            .upsert(vec![
                record("a", "x", vec![1.0, 0.0]),
                record("b", "y", vec![1.0]),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { .. }));
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_query_empty_store() {
        let store = InMemoryVectorStore::new();
        assert!(store.query(&[1.0], 5).await.unwrap().is_empty());
    }
}

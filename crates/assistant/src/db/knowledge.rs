//! pgvector-backed knowledge chunk store.
//!
//! `SQLx` has no pgvector type, so vectors travel as their text form
//! (`[0.1,0.2,...]`) and are cast with `::vector` in SQL.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use merchant_assistant_core::DocumentId;

use crate::retrieval::{ChunkMetadata, ScoredChunk, StoreError, VectorRecord, VectorStore};

/// Vector store over the `knowledge_chunks` table.
///
/// Each row carries a `BIGSERIAL` `seq` assigned on first insert. Updates
/// keep it, so ties in similarity fall back to original insertion order.
#[derive(Debug, Clone)]
pub struct PgVectorStore {
    pool: PgPool,
    dimensions: usize,
}

impl PgVectorStore {
    /// Create a store that accepts vectors of exactly `dimensions` values.
    #[must_use]
    pub const fn new(pool: PgPool, dimensions: usize) -> Self {
        Self { pool, dimensions }
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), StoreError> {
        if let Some(bad) = records.iter().find(|r| r.vector.len() != self.dimensions) {
            return Err(StoreError::DimensionMismatch {
                id: bad.id.clone(),
                expected: self.dimensions,
                actual: bad.vector.len(),
            });
        }

        let mut tx = self.pool.begin().await?;
        for record in &records {
            let sequence_index = i32::try_from(record.metadata.sequence_index).map_err(|_| {
                StoreError::DataCorruption(format!(
                    "sequence index {} out of range",
                    record.metadata.sequence_index
                ))
            })?;

            sqlx::query(
                r"
                INSERT INTO knowledge_chunks
                    (id, document_id, filename, sequence_index, content, embedding)
                VALUES ($1, $2, $3, $4, $5, $6::vector)
                ON CONFLICT (id) DO UPDATE SET
                    document_id = EXCLUDED.document_id,
                    filename = EXCLUDED.filename,
                    sequence_index = EXCLUDED.sequence_index,
                    content = EXCLUDED.content,
                    embedding = EXCLUDED.embedding
                ",
            )
            .bind(&record.id)
            .bind(record.metadata.document_id.as_uuid())
            .bind(&record.metadata.filename)
            .bind(sequence_index)
            .bind(&record.text)
            .bind(format_embedding(&record.vector))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("Chunks upserted");
        Ok(())
    }

    #[instrument(skip(self, vector))]
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT id, document_id, filename, sequence_index, content,
                   1 - (embedding <=> $1::vector) AS score
            FROM knowledge_chunks
            ORDER BY embedding <=> $1::vector, seq
            LIMIT $2
            ",
        )
        .bind(format_embedding(vector))
        .bind(i64::try_from(k).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<ScoredChunk, StoreError> {
                let document_id: Uuid = row.try_get("document_id")?;
                let sequence_index: i32 = row.try_get("sequence_index")?;
                // NULL when either vector has zero norm.
                let score: Option<f64> = row.try_get("score")?;
                #[allow(clippy::cast_possible_truncation)]
                let score = score.unwrap_or(0.0) as f32;

                Ok(ScoredChunk {
                    id: row.try_get("id")?,
                    text: row.try_get("content")?,
                    metadata: ChunkMetadata {
                        document_id: DocumentId::from_uuid(document_id),
                        filename: row.try_get("filename")?,
                        sequence_index: usize::try_from(sequence_index).map_err(|_| {
                            StoreError::DataCorruption(format!(
                                "negative sequence index {sequence_index}"
                            ))
                        })?,
                    },
                    score,
                })
            })
            .collect()
    }
}

/// Format an embedding vector for pgvector.
fn format_embedding(embedding: &[f32]) -> String {
    let values: Vec<String> = embedding.iter().map(ToString::to_string).collect();
    format!("[{}]", values.join(","))
}

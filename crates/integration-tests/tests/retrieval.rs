//! Knowledge-base ingestion and search through the public pipeline API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use merchant_assistant::retrieval::{InMemoryVectorStore, IngestionError, VectorStore};
use merchant_assistant_integration_tests::{FailingVectorStore, pipeline_with};

fn words(prefix: &str, count: usize) -> String {
    (0..count)
        .map(|i| format!("{prefix}{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::test]
async fn test_long_document_chunks_with_overlap() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(store.clone());

    let report = pipeline
        .ingest(&words("w", 1200), "handbook.txt")
        .await
        .unwrap();

    // Windows of 500 tokens every 450: [0,500) [450,950) [900,1200)
    assert_eq!(report.chunk_count, 3);
    assert_eq!(store.len().unwrap(), 3);

    let ids = &report.document.chunk_ids;
    assert!(ids[0].ends_with("-0"));
    assert!(ids[2].ends_with("-2"));

    let last = store.get(&ids[2]).unwrap().unwrap();
    assert!(last.text.starts_with("w900 "));
    assert!(last.text.ends_with(" w1199"));
    assert_eq!(last.metadata.filename, "handbook.txt");
    assert_eq!(last.metadata.sequence_index, 2);
}

#[tokio::test]
async fn test_exact_text_ranks_first() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(store);

    pipeline
        .ingest("Lead time is the days between ordering and receiving stock.", "a.md")
        .await
        .unwrap();
    pipeline
        .ingest("Restock cadence is how often purchase orders are placed.", "b.md")
        .await
        .unwrap();

    let hits = pipeline
        .search_scored("Restock cadence is how often purchase orders are placed.", 2)
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].metadata.filename, "b.md");
    assert!((hits[0].score - 1.0).abs() < 1e-5);
    assert!(hits[1].score < hits[0].score);
}

#[tokio::test]
async fn test_reingest_keeps_both_documents() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(store.clone());

    let first = pipeline.ingest("same text", "dup.txt").await.unwrap();
    let second = pipeline.ingest("same text", "dup.txt").await.unwrap();

    assert_ne!(first.document.id, second.document.id);
    assert_eq!(store.len().unwrap(), 2);
    assert_eq!(pipeline.search("same text", 5).await.len(), 2);
}

#[tokio::test]
async fn test_whitespace_document_is_rejected() {
    let pipeline = pipeline_with(Arc::new(InMemoryVectorStore::new()));

    let err = pipeline.ingest(" \n\t ", "blank.txt").await.unwrap_err();

    assert!(matches!(err, IngestionError::EmptyDocument(_)));
}

#[tokio::test]
async fn test_store_failure_fails_ingest_but_not_search() {
    let pipeline = pipeline_with(Arc::new(FailingVectorStore));

    let err = pipeline.ingest("anything", "x.txt").await.unwrap_err();
    assert!(matches!(err, IngestionError::Store(_)));

    assert!(pipeline.search("anything", 3).await.is_empty());
}

#[tokio::test]
async fn test_ingest_file_markdown() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(store.clone());

    let report = pipeline
        .ingest_file("notes.MD", b"# Reorder point\n\nDemand during lead time.".to_vec())
        .await
        .unwrap();

    assert_eq!(report.chunk_count, 1);
    let hits = store
        .query(&vec![0.0; merchant_assistant_integration_tests::TEST_DIMENSIONS], 1)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
}

//! Database operations for the assistant's `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `skus` - Stocked product lines and their replenishment parameters
//! - `knowledge_chunks` - Embedded knowledge-base chunks (pgvector)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/assistant/migrations/` and run via:
//! ```bash
//! cargo run -p merchant-assistant-cli -- migrate
//! ```

pub mod knowledge;
pub mod skus;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use knowledge::PgVectorStore;
pub use skus::SkuRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Round-trip a trivial query to check the database is reachable.
///
/// # Errors
///
/// Returns `sqlx::Error` if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}

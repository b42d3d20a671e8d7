//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Database readiness check
//!
//! POST /api/chat               - Answer a merchant message
//! GET  /api/inventory          - All SKUs with restock projections
//! GET  /api/documents          - Uploaded knowledge-base files
//! POST /api/documents/upload   - Upload and ingest a PDF, TXT or MD file
//! ```

pub mod chat;
pub mod documents;
pub mod health;
pub mod inventory;

use axum::Router;

use crate::state::AppState;

/// Build the application router with state applied.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(chat::router())
        .merge(inventory::router())
        .merge(documents::router())
        .with_state(state)
}

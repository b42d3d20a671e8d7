//! Unified error handling for the HTTP surface.
//!
//! Every failure reaches the client as `{"error": "..."}` with a fixed,
//! opaque message per route. Details go to the log and to Sentry.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::retrieval::IngestionError;
use crate::services::OrchestratorError;

/// Application-level error type for HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// The chat run failed.
    #[error("Chat error: {0}")]
    Chat(#[from] OrchestratorError),

    /// Reading the SKU catalog failed.
    #[error("Inventory error: {0}")]
    Inventory(#[from] RepositoryError),

    /// Ingesting an uploaded document failed.
    #[error("Ingestion error: {0}")]
    Ingestion(#[from] IngestionError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Chat(_) | Self::Inventory(_) | Self::Ingestion(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the client. Never includes internal details.
    fn public_message(&self) -> String {
        match self {
            Self::Chat(_) => "Failed to process chat".to_string(),
            Self::Inventory(_) => "Failed to fetch inventory".to_string(),
            Self::Ingestion(_) => "Failed to process document".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            Self::BadRequest(message) => message.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            if matches!(self, Self::Chat(OrchestratorError::Cancelled)) {
                tracing::info!("Chat run cancelled by shutdown");
            } else {
                let event_id = sentry::capture_error(&self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Request error"
                );
            }
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

//! Chat route handler.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Request body for a chat turn.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

/// Response body for a chat turn.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Build the chat router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/chat", post(chat))
}

/// Answer one merchant message.
///
/// POST /api/chat
#[instrument(skip_all)]
async fn chat(
    State(state): State<AppState>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = request.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let message = request.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("Message is required".to_string()));
    }

    let output = state
        .orchestrator()
        .run(message, Vec::new(), state.shutdown())
        .await?;

    Ok(Json(ChatResponse {
        response: output.answer,
    }))
}

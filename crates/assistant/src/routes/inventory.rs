//! Inventory route handler.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::error::AppError;
use crate::models::InventoryItem;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub inventory: Vec<InventoryItem>,
}

/// Build the inventory router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/inventory", get(list_inventory))
}

/// Every SKU with its restock projection.
///
/// GET /api/inventory
async fn list_inventory(
    State(state): State<AppState>,
) -> Result<Json<InventoryResponse>, AppError> {
    let inventory = state.inventory().inventory().await?;
    Ok(Json(InventoryResponse { inventory }))
}

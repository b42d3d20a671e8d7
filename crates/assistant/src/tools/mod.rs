//! Tools the assistant model may call.
//!
//! # Tools
//!
//! | Name | Handler |
//! |------|---------|
//! | `get_inventory` | [`GetInventoryTool`] |
//! | `get_sku` | [`GetSkuTool`] |
//! | `calculate_restock` | [`CalculateRestockTool`] |
//! | `search_knowledge` | [`SearchKnowledgeTool`] |

mod error;
mod inventory;
mod knowledge;
mod registry;
mod schema;

use std::sync::Arc;

pub use error::{RegistryError, ToolError};
pub use inventory::{CalculateRestockTool, GetInventoryTool, GetSkuTool};
pub use knowledge::SearchKnowledgeTool;
pub use registry::{ToolHandler, ToolRegistry};
pub use schema::{ParamSpec, ParamType, ToolArguments, ToolSpec};

use crate::retrieval::RetrievalPipeline;
use crate::services::InventoryService;

/// Build the registry with the four standard tools.
///
/// # Errors
///
/// Returns an error only if a built-in spec is invalid.
pub fn build_registry(
    inventory: &InventoryService,
    knowledge: &RetrievalPipeline,
    top_k: usize,
) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry.register(
        GetInventoryTool::spec(),
        Arc::new(GetInventoryTool::new(inventory.clone())),
    )?;
    registry.register(GetSkuTool::spec(), Arc::new(GetSkuTool::new(inventory.clone())))?;
    registry.register(
        CalculateRestockTool::spec(),
        Arc::new(CalculateRestockTool::new(inventory.clone())),
    )?;
    registry.register(
        SearchKnowledgeTool::spec(),
        Arc::new(SearchKnowledgeTool::new(knowledge.clone(), top_k)),
    )?;
    Ok(registry)
}

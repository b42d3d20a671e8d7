//! Business logic services.
//!
//! # Services
//!
//! - `inventory` - SKU lookups and restock projections
//! - `orchestrator` - Tool-calling loop over the language model

pub mod inventory;
pub mod orchestrator;

pub use inventory::{InMemorySkuCatalog, InventoryService, SkuCatalog};
pub use orchestrator::{
    AbortSignal, Orchestrator, OrchestratorConfig, OrchestratorError, RunOutput,
    render_system_prompt,
};

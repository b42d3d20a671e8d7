//! Domain models for the assistant.

pub mod sku;

pub use sku::{InventoryItem, Sku, UpsertSkuInput};

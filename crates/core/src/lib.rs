//! Merchant Assistant Core - Shared types library.
//!
//! This crate provides common types used across the merchant assistant:
//! - `assistant` - Orchestrator, retrieval pipeline and HTTP surface
//! - `cli` - Command-line tools for migrations, seeding and ingestion
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, SKU numbers, and health statuses
//! - [`restock`] - The restock recommendation formula

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod restock;
pub mod types;

pub use restock::{RestockError, RestockInputs, RestockOverrides, RestockResult};
pub use types::*;

//! Core types for the merchant assistant.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod sku;
pub mod status;

pub use id::*;
pub use sku::{SkuNumber, SkuNumberError};
pub use status::*;

//! Merchant assistant library.
//!
//! A conversational inventory assistant: an orchestrator drives a chat model
//! through bounded rounds of tool calls against the SKU catalog and a
//! retrieval-backed knowledge base. The HTTP surface in [`routes`] and the
//! `ma-cli` binary both build on this crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod models;
pub mod retrieval;
pub mod routes;
pub mod services;
pub mod state;
pub mod tools;

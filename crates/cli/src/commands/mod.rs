//! Subcommand implementations.

pub mod knowledge;
pub mod migrate;
pub mod seed;

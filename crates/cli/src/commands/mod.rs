//! CLI command implementations.

pub mod order;

//! Bergamot Core - Shared types library.
//!
//! This crate provides common types used across all Bergamot Checkout
//! components:
//! - `checkout` - Commerce API client and order state derivation
//! - `cli` - Command-line tools for driving the checkout flow
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe resource IDs and language
//!   codes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

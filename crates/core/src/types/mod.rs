//! Core types for Bergamot Checkout.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod language;

pub use id::*;
pub use language::{LanguageCode, LanguageCodeError};

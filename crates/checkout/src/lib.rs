//! Bergamot Checkout - commerce API client and order state derivation.
//!
//! This crate is the core of the checkout front-end. Given an order
//! identifier and an access token it fetches the order graph (addresses,
//! shipments, shipping methods, payment method, customer and saved
//! addresses) from the remote commerce platform, normalizes incomplete
//! state, and derives a flat [`state::CheckoutSummary`] that tells a
//! renderer which checkout step to show.
//!
//! # Architecture
//!
//! - The commerce platform is the source of truth - no local persistence,
//!   direct API calls over JSON:API
//! - [`commerce`] - typed client for the platform's resource API
//! - [`state`] - the order state deriver: fetch, then normalize, then
//!   summarize, with independent failure handling per step

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod commerce;
pub mod config;
pub mod state;

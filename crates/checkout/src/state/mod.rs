//! Order state derivation.
//!
//! The deriver answers one question: given an order id and an access
//! token, which step of checkout should the UI show? It fetches the order
//! graph, runs two normalization steps (default-address cloning and
//! sole-shipping-method auto-assignment), and produces a flat
//! [`CheckoutSummary`] of booleans and values.
//!
//! The pipeline is explicitly two-phase: fetch, then normalize, with
//! independent failure handling per normalization step. Deriving state can
//! therefore mutate remote state - callers must treat it as non-idempotent.

mod derive;
mod rules;
mod summary;

pub use derive::{OrderApi, derive_checkout_state};
pub use rules::{has_same_addresses, is_new_address};
pub use summary::{CheckoutState, CheckoutSummary, ShipmentSelection};

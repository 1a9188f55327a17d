//! UI-ready checkout summary types.

use serde::Serialize;

use bergamot_core::{LanguageCode, ShipmentId, ShippingMethodId};

use crate::commerce::Address;

/// A shipment paired with its selected shipping method, if any.
///
/// Reflects the state of the order at fetch time; the sole-method
/// auto-assignment step does not rewrite these entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentSelection {
    /// The shipment's ID.
    pub shipment_id: ShipmentId,
    /// The selected shipping method's ID, if one is set.
    pub shipping_method_id: Option<ShippingMethodId>,
}

/// Flat summary of "what step of checkout should be shown".
///
/// Serialized field names are camelCase: this structure is the read-only
/// contract handed to renderers as display props.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSummary {
    /// Whether the order is a guest order.
    pub is_guest: bool,
    /// Whether the customer has at least one saved address.
    pub has_customer_addresses: bool,
    /// Whether the billing address does not match a saved address.
    pub is_using_new_billing_address: bool,
    /// Whether the shipping address does not match a saved address.
    pub is_using_new_shipping_address: bool,
    /// Whether shipping and billing address names match.
    pub has_same_addresses: bool,
    /// Whether the order carries a customer email.
    pub has_email_address: bool,
    /// The customer email, empty string when absent.
    pub email_address: String,
    /// Whether the order has a shipping address.
    pub has_shipping_address: bool,
    /// The shipping address, if set.
    pub shipping_address: Option<Address>,
    /// Whether the order has a billing address.
    pub has_billing_address: bool,
    /// The billing address, if set.
    pub billing_address: Option<Address>,
    /// Whether every shipment has a shipping method.
    pub has_shipping_method: bool,
    /// The order's shipments with their selected methods.
    pub shipments: Vec<ShipmentSelection>,
    /// Always `false`: payment selection is handled downstream.
    pub has_payment_method: bool,
}

impl CheckoutSummary {
    /// The fixed summary returned when the order cannot be retrieved.
    ///
    /// Everything absent or false except the two "new address" flags,
    /// which default to true so the UI restarts the address-entry flow
    /// instead of showing a hard error.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            is_guest: false,
            has_customer_addresses: false,
            is_using_new_billing_address: true,
            is_using_new_shipping_address: true,
            has_same_addresses: false,
            has_email_address: false,
            email_address: String::new(),
            has_shipping_address: false,
            shipping_address: None,
            has_billing_address: false,
            billing_address: None,
            has_shipping_method: false,
            shipments: Vec::new(),
            has_payment_method: false,
        }
    }
}

/// The deriver's full output: the summary plus an explicit instruction to
/// switch the display language, left to the caller to apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutState {
    /// The derived summary.
    pub summary: CheckoutSummary,
    /// Display language to switch to, taken from the order.
    pub set_language: Option<LanguageCode>,
}

//! Pure derivation rules.
//!
//! Everything here is side-effect free so the policy can be tested without
//! a client. Address matching compares the platform-computed `name` field;
//! two absent names compare equal.

use crate::commerce::{Address, CustomerAddress, OrderGraph, ShippingMethod};

use super::summary::ShipmentSelection;

/// Classify an order address as "new" (not matching any saved customer
/// address).
///
/// Policy:
/// - Guest orders are always "new" - guests have no saved addresses to
///   compare against.
/// - Otherwise an address matches when some saved address has the same
///   `name`.
/// - With more than one saved address and no match: "new" when an address
///   is present, NOT "new" when it is absent. The absent case is an
///   intentional asymmetry kept for parity with the address-book UI.
/// - With zero or one saved address: "new" iff no match was found.
#[must_use]
pub fn is_new_address(
    address: Option<&Address>,
    customer_addresses: &[CustomerAddress],
    is_guest: bool,
) -> bool {
    if is_guest {
        return true;
    }

    let address_name = address.and_then(|a| a.name.as_deref());
    let matches_saved = customer_addresses
        .iter()
        .any(|saved| saved.name.as_deref() == address_name);

    if !matches_saved && customer_addresses.len() > 1 && address.is_some() {
        return true;
    }
    if !matches_saved && customer_addresses.len() > 1 && address.is_none() {
        return false;
    }
    !matches_saved
}

/// Whether the shipping and billing addresses carry the same `name`.
///
/// Both absent counts as equal.
#[must_use]
pub fn has_same_addresses(
    shipping_address: Option<&Address>,
    billing_address: Option<&Address>,
) -> bool {
    shipping_address.and_then(|a| a.name.as_deref())
        == billing_address.and_then(|a| a.name.as_deref())
}

/// Whether the order qualifies for default-address normalization: a
/// non-guest order with exactly one saved address and neither order
/// address slot set.
#[must_use]
pub(super) fn needs_default_address(graph: &OrderGraph) -> bool {
    !graph.order.guest.unwrap_or(false)
        && graph.customer_addresses.len() == 1
        && graph.shipping_address.is_none()
        && graph.billing_address.is_none()
}

/// The sole shipping method to auto-assign, when no real choice exists:
/// both addresses set, at least one shipment without a method, exactly one
/// method available, and at least one shipment to assign it to.
#[must_use]
pub(super) fn sole_assignable_method<'a>(
    has_billing_address: bool,
    has_shipping_address: bool,
    selections: &[ShipmentSelection],
    methods: &'a [ShippingMethod],
) -> Option<&'a ShippingMethod> {
    let any_unassigned = selections.iter().any(|s| s.shipping_method_id.is_none());

    if has_billing_address
        && has_shipping_address
        && any_unassigned
        && methods.len() == 1
        && !selections.is_empty()
    {
        methods.first()
    } else {
        None
    }
}

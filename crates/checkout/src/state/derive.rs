//! The derivation pipeline: fetch, normalize, summarize.

use std::future::Future;

use futures::future;

use bergamot_core::{AddressId, CustomerAddressId, LanguageCode, OrderId, ShipmentId, ShippingMethodId};

use crate::commerce::{CommerceClient, CommerceError, OrderGraph, ShippingMethod};

use super::rules;
use super::summary::{CheckoutState, CheckoutSummary, ShipmentSelection};

/// The order operations the deriver needs.
///
/// [`CommerceClient`] is the production implementation; tests substitute
/// their own to exercise the pipeline without a network.
pub trait OrderApi: Send + Sync {
    /// Fetch an order and its full relationship graph.
    fn get_order(
        &self,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<OrderGraph, CommerceError>> + Send;

    /// Clone a saved address onto the order's billing and shipping slots,
    /// returning the updated graph with the new addresses included.
    fn clone_order_addresses(
        &self,
        order_id: &OrderId,
        address_id: &AddressId,
    ) -> impl Future<Output = Result<OrderGraph, CommerceError>> + Send;

    /// Stamp an address with the saved customer address it was cloned from.
    fn set_address_reference(
        &self,
        address_id: &AddressId,
        reference: &CustomerAddressId,
    ) -> impl Future<Output = Result<(), CommerceError>> + Send;

    /// Select a shipping method on a shipment.
    fn set_shipment_shipping_method(
        &self,
        shipment_id: &ShipmentId,
        shipping_method_id: &ShippingMethodId,
    ) -> impl Future<Output = Result<(), CommerceError>> + Send;

    /// List all shipping methods available to the current market.
    fn list_shipping_methods(
        &self,
    ) -> impl Future<Output = Result<Vec<ShippingMethod>, CommerceError>> + Send;
}

impl OrderApi for CommerceClient {
    async fn get_order(&self, order_id: &OrderId) -> Result<OrderGraph, CommerceError> {
        self.get_order(order_id).await
    }

    async fn clone_order_addresses(
        &self,
        order_id: &OrderId,
        address_id: &AddressId,
    ) -> Result<OrderGraph, CommerceError> {
        self.clone_order_addresses(order_id, address_id).await
    }

    async fn set_address_reference(
        &self,
        address_id: &AddressId,
        reference: &CustomerAddressId,
    ) -> Result<(), CommerceError> {
        self.set_address_reference(address_id, reference).await
    }

    async fn set_shipment_shipping_method(
        &self,
        shipment_id: &ShipmentId,
        shipping_method_id: &ShippingMethodId,
    ) -> Result<(), CommerceError> {
        self.set_shipment_shipping_method(shipment_id, shipping_method_id)
            .await
    }

    async fn list_shipping_methods(&self) -> Result<Vec<ShippingMethod>, CommerceError> {
        self.list_shipping_methods().await
    }
}

/// Derive the checkout state for an order.
///
/// Never returns an error: any failure retrieving the order resolves to
/// the fixed fallback summary so the UI can render a degraded-but-valid
/// checkout. Normalization steps can mutate remote state as a byproduct,
/// so repeated calls are not pure reads.
pub async fn derive_checkout_state<A: OrderApi>(api: &A, order_id: &OrderId) -> CheckoutState {
    match derive_inner(api, order_id).await {
        Ok(state) => state,
        Err(error) => {
            tracing::error!(
                order_id = %order_id,
                error = %error,
                "error retrieving order, returning fallback summary"
            );
            CheckoutState {
                summary: CheckoutSummary::fallback(),
                set_language: None,
            }
        }
    }
}

async fn derive_inner<A: OrderApi>(
    api: &A,
    order_id: &OrderId,
) -> Result<CheckoutState, CommerceError> {
    let mut graph = api.get_order(order_id).await?;

    if rules::needs_default_address(&graph) {
        // A failure here degrades gracefully: checkout continues without a
        // preselected address.
        if let Err(error) = apply_default_address(api, &mut graph).await {
            tracing::warn!(
                order_id = %order_id,
                error = %error,
                "failed to assign default address to order"
            );
        }
    }

    let is_guest = graph.order.guest.unwrap_or(false);
    let has_customer_addresses = !graph.customer_addresses.is_empty();

    let has_shipping_address = graph.shipping_address.is_some();
    let has_billing_address = graph.billing_address.is_some();

    let has_email_address = graph
        .order
        .customer_email
        .as_deref()
        .is_some_and(|email| !email.is_empty());
    let email_address = graph.order.customer_email.clone().unwrap_or_default();

    let methods = api.list_shipping_methods().await?;

    let shipments: Vec<ShipmentSelection> = graph
        .shipments
        .iter()
        .map(|shipment| ShipmentSelection {
            shipment_id: shipment.id.clone(),
            shipping_method_id: shipment
                .shipping_method
                .as_ref()
                .map(|method| method.id.clone()),
        })
        .collect();

    let mut has_shipping_method = shipments
        .iter()
        .all(|selection| selection.shipping_method_id.is_some());

    // When both addresses are set and only one shipping method exists,
    // select it on every shipment so the UI can skip the shipping step.
    // The flag flips only if every update succeeds; updates that already
    // went through are not rolled back.
    if let Some(method) =
        rules::sole_assignable_method(has_billing_address, has_shipping_address, &shipments, &methods)
    {
        let updates = graph
            .shipments
            .iter()
            .map(|shipment| api.set_shipment_shipping_method(&shipment.id, &method.id));

        // Every update runs to completion; a failure anywhere leaves the
        // flag at its pre-attempt value without rolling back the rest.
        let results = future::join_all(updates).await;
        match results.into_iter().find_map(Result::err) {
            None => has_shipping_method = true,
            Some(error) => {
                tracing::warn!(
                    order_id = %order_id,
                    error = %error,
                    "error updating shipments with sole shipping method"
                );
            }
        }
    }

    let has_payment_method = false; // graph.payment_method.is_some()

    let is_using_new_billing_address = rules::is_new_address(
        graph.billing_address.as_ref(),
        &graph.customer_addresses,
        is_guest,
    );
    let is_using_new_shipping_address = rules::is_new_address(
        graph.shipping_address.as_ref(),
        &graph.customer_addresses,
        is_guest,
    );

    let has_same_addresses = rules::has_same_addresses(
        graph.shipping_address.as_ref(),
        graph.billing_address.as_ref(),
    );

    let set_language = graph
        .order
        .language_code
        .as_deref()
        .and_then(|code| LanguageCode::parse(code).ok());

    Ok(CheckoutState {
        summary: CheckoutSummary {
            is_guest,
            has_customer_addresses,
            is_using_new_billing_address,
            is_using_new_shipping_address,
            has_same_addresses,
            has_email_address,
            email_address,
            has_shipping_address,
            shipping_address: graph.shipping_address,
            has_billing_address,
            billing_address: graph.billing_address,
            has_shipping_method,
            shipments,
            has_payment_method,
        },
        set_language,
    })
}

/// Clone the customer's sole saved address onto both order address slots
/// and stamp each clone with a back-reference to the saved address.
async fn apply_default_address<A: OrderApi>(
    api: &A,
    graph: &mut OrderGraph,
) -> Result<(), CommerceError> {
    let Some(saved) = graph.customer_addresses.first() else {
        return Ok(());
    };
    let saved_id = saved.id.clone();
    let Some(address_id) = saved.address.as_ref().map(|address| address.id.clone()) else {
        return Ok(());
    };

    let updated = api.clone_order_addresses(&graph.order.id, &address_id).await?;

    let mut billing_address = updated.billing_address;
    let mut shipping_address = updated.shipping_address;

    if let Some(billing) = billing_address.as_mut() {
        api.set_address_reference(&billing.id, &saved_id).await?;
        billing.reference = Some(saved_id.as_str().to_owned());
    }
    if let Some(shipping) = shipping_address.as_mut() {
        api.set_address_reference(&shipping.id, &saved_id).await?;
        shipping.reference = Some(saved_id.as_str().to_owned());
    }

    graph.billing_address = billing_address;
    graph.shipping_address = shipping_address;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::commerce::{Address, ApiError, Customer, CustomerAddress, Order, Shipment};
    use bergamot_core::CustomerId;

    // ─────────────────────────────────────────────────────────────────────
    // Mock API
    // ─────────────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct MockApi {
        order: Option<OrderGraph>,
        clone_result: Option<OrderGraph>,
        methods: Vec<ShippingMethod>,
        fail_clone: bool,
        fail_assignment: bool,
        reference_calls: Mutex<Vec<(AddressId, CustomerAddressId)>>,
        assignment_calls: Mutex<Vec<(ShipmentId, ShippingMethodId)>>,
    }

    fn remote_failure() -> CommerceError {
        CommerceError::Api(vec![ApiError {
            title: Some("Unprocessable entity".to_string()),
            detail: None,
            code: None,
            status: Some("422".to_string()),
        }])
    }

    impl OrderApi for MockApi {
        async fn get_order(&self, order_id: &OrderId) -> Result<OrderGraph, CommerceError> {
            self.order
                .clone()
                .ok_or_else(|| CommerceError::NotFound(format!("order {order_id}")))
        }

        async fn clone_order_addresses(
            &self,
            _order_id: &OrderId,
            _address_id: &AddressId,
        ) -> Result<OrderGraph, CommerceError> {
            if self.fail_clone {
                return Err(remote_failure());
            }
            Ok(self.clone_result.clone().expect("clone result configured"))
        }

        async fn set_address_reference(
            &self,
            address_id: &AddressId,
            reference: &CustomerAddressId,
        ) -> Result<(), CommerceError> {
            self.reference_calls
                .lock()
                .unwrap()
                .push((address_id.clone(), reference.clone()));
            Ok(())
        }

        async fn set_shipment_shipping_method(
            &self,
            shipment_id: &ShipmentId,
            shipping_method_id: &ShippingMethodId,
        ) -> Result<(), CommerceError> {
            if self.fail_assignment {
                return Err(remote_failure());
            }
            self.assignment_calls
                .lock()
                .unwrap()
                .push((shipment_id.clone(), shipping_method_id.clone()));
            Ok(())
        }

        async fn list_shipping_methods(&self) -> Result<Vec<ShippingMethod>, CommerceError> {
            Ok(self.methods.clone())
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Fixtures
    // ─────────────────────────────────────────────────────────────────────

    fn order(guest: Option<bool>) -> Order {
        Order {
            id: OrderId::new("ord_1"),
            guest,
            customer_email: Some("jo@example.com".to_string()),
            language_code: Some("en".to_string()),
            cart_url: None,
            updated_at: None,
        }
    }

    fn address(id: &str, name: &str) -> Address {
        Address {
            id: AddressId::new(id),
            name: Some(name.to_owned()),
            first_name: None,
            last_name: None,
            line_1: None,
            line_2: None,
            city: None,
            zip_code: None,
            state_code: None,
            country_code: None,
            phone: None,
            reference: None,
        }
    }

    fn saved(id: &str, address_id: &str, name: &str) -> CustomerAddress {
        CustomerAddress {
            id: CustomerAddressId::new(id),
            name: Some(name.to_owned()),
            address: Some(address(address_id, name)),
        }
    }

    fn shipment(id: &str, method: Option<&str>) -> Shipment {
        Shipment {
            id: ShipmentId::new(id),
            shipping_method: method.map(|m| ShippingMethod {
                id: ShippingMethodId::new(m),
                name: None,
                price_amount_cents: None,
            }),
        }
    }

    fn method(id: &str) -> ShippingMethod {
        ShippingMethod {
            id: ShippingMethodId::new(id),
            name: Some("Standard".to_string()),
            price_amount_cents: Some(700),
        }
    }

    fn graph(order: Order) -> OrderGraph {
        OrderGraph {
            order,
            shipping_address: None,
            billing_address: None,
            shipments: Vec::new(),
            payment_method: None,
            customer: Some(Customer {
                id: CustomerId::new("cst_1"),
                email: Some("jo@example.com".to_string()),
            }),
            customer_addresses: Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tests
    // ─────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_guest_order_always_uses_new_addresses() {
        let mut g = graph(order(Some(true)));
        g.shipping_address = Some(address("adr_s", "Jo Doe"));
        g.billing_address = Some(address("adr_b", "Jo Doe"));
        g.customer_addresses = vec![saved("cua_1", "adr_1", "Jo Doe")];

        let api = MockApi {
            order: Some(g),
            ..MockApi::default()
        };

        let state = derive_checkout_state(&api, &OrderId::new("ord_1")).await;
        assert!(state.summary.is_guest);
        assert!(state.summary.is_using_new_billing_address);
        assert!(state.summary.is_using_new_shipping_address);
    }

    #[tokio::test]
    async fn test_default_address_cloned_and_referenced() {
        let mut g = graph(order(Some(false)));
        g.customer_addresses = vec![saved("cua_1", "adr_saved", "Jo Doe")];

        let mut cloned = graph(order(Some(false)));
        cloned.shipping_address = Some(address("adr_new_s", "Jo Doe"));
        cloned.billing_address = Some(address("adr_new_b", "Jo Doe"));

        let api = MockApi {
            order: Some(g),
            clone_result: Some(cloned),
            ..MockApi::default()
        };

        let state = derive_checkout_state(&api, &OrderId::new("ord_1")).await;
        let summary = &state.summary;

        assert!(summary.has_shipping_address);
        assert!(summary.has_billing_address);
        assert_eq!(
            summary.shipping_address.as_ref().unwrap().reference.as_deref(),
            Some("cua_1")
        );
        assert_eq!(
            summary.billing_address.as_ref().unwrap().reference.as_deref(),
            Some("cua_1")
        );

        // Both cloned addresses were stamped remotely too.
        let calls = api.reference_calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, r)| r.as_str() == "cua_1"));

        // The clone matches the sole saved address by name.
        assert!(!summary.is_using_new_billing_address);
        assert!(!summary.is_using_new_shipping_address);
        assert!(summary.has_same_addresses);
    }

    #[tokio::test]
    async fn test_default_address_clone_failure_degrades() {
        let mut g = graph(order(Some(false)));
        g.customer_addresses = vec![saved("cua_1", "adr_saved", "Jo Doe")];

        let api = MockApi {
            order: Some(g),
            fail_clone: true,
            ..MockApi::default()
        };

        let state = derive_checkout_state(&api, &OrderId::new("ord_1")).await;
        // The clone failure is swallowed; the rest of the summary is intact.
        assert!(!state.summary.has_shipping_address);
        assert!(!state.summary.has_billing_address);
        assert!(state.summary.has_customer_addresses);
        assert!(state.summary.has_email_address);
    }

    #[tokio::test]
    async fn test_no_default_address_for_multiple_saved() {
        let mut g = graph(order(Some(false)));
        g.customer_addresses = vec![
            saved("cua_1", "adr_1", "Jo Doe"),
            saved("cua_2", "adr_2", "Alex Ray"),
        ];

        let api = MockApi {
            order: Some(g),
            ..MockApi::default()
        };

        let state = derive_checkout_state(&api, &OrderId::new("ord_1")).await;
        // No clone attempted: clone_result is None and would panic if used.
        assert!(!state.summary.has_shipping_address);
        // Asymmetric classification: absent address with multiple saved
        // addresses is not "new".
        assert!(!state.summary.is_using_new_billing_address);
        assert!(!state.summary.is_using_new_shipping_address);
    }

    #[tokio::test]
    async fn test_matching_saved_address_not_new() {
        let mut g = graph(order(Some(false)));
        g.shipping_address = Some(address("adr_s", "Jo Doe"));
        g.billing_address = Some(address("adr_b", "Jo Doe"));
        g.customer_addresses = vec![saved("cua_1", "adr_1", "Jo Doe")];

        let api = MockApi {
            order: Some(g),
            ..MockApi::default()
        };

        let state = derive_checkout_state(&api, &OrderId::new("ord_1")).await;
        assert!(!state.summary.is_using_new_billing_address);
        assert!(!state.summary.is_using_new_shipping_address);
        assert!(state.summary.has_same_addresses);
    }

    #[tokio::test]
    async fn test_sole_method_assigned_to_all_shipments() {
        let mut g = graph(order(Some(false)));
        g.shipping_address = Some(address("adr_s", "Jo Doe"));
        g.billing_address = Some(address("adr_b", "Jo Doe"));
        g.shipments = vec![shipment("shp_1", None), shipment("shp_2", Some("smm_1"))];

        let api = MockApi {
            order: Some(g),
            methods: vec![method("smm_1")],
            ..MockApi::default()
        };

        let state = derive_checkout_state(&api, &OrderId::new("ord_1")).await;
        assert!(state.summary.has_shipping_method);

        // Every shipment gets the method, including the one already set.
        let calls = api.assignment_calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, m)| m.as_str() == "smm_1"));

        // The selection list reflects fetch-time state, not the
        // auto-assignment.
        assert_eq!(state.summary.shipments.len(), 2);
        assert!(state.summary.shipments[0].shipping_method_id.is_none());
    }

    #[tokio::test]
    async fn test_sole_method_assignment_failure_keeps_flag() {
        let mut g = graph(order(Some(false)));
        g.shipping_address = Some(address("adr_s", "Jo Doe"));
        g.billing_address = Some(address("adr_b", "Jo Doe"));
        g.shipments = vec![shipment("shp_1", None)];

        let api = MockApi {
            order: Some(g),
            methods: vec![method("smm_1")],
            fail_assignment: true,
            ..MockApi::default()
        };

        let state = derive_checkout_state(&api, &OrderId::new("ord_1")).await;
        assert!(!state.summary.has_shipping_method);
    }

    #[tokio::test]
    async fn test_no_assignment_with_multiple_methods() {
        let mut g = graph(order(Some(false)));
        g.shipping_address = Some(address("adr_s", "Jo Doe"));
        g.billing_address = Some(address("adr_b", "Jo Doe"));
        g.shipments = vec![shipment("shp_1", None)];

        let api = MockApi {
            order: Some(g),
            methods: vec![method("smm_1"), method("smm_2")],
            ..MockApi::default()
        };

        let state = derive_checkout_state(&api, &OrderId::new("ord_1")).await;
        assert!(!state.summary.has_shipping_method);
        assert!(api.assignment_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_shipments_with_methods() {
        let mut g = graph(order(Some(false)));
        g.shipments = vec![
            shipment("shp_1", Some("smm_1")),
            shipment("shp_2", Some("smm_1")),
        ];

        let api = MockApi {
            order: Some(g),
            methods: vec![method("smm_1")],
            ..MockApi::default()
        };

        let state = derive_checkout_state(&api, &OrderId::new("ord_1")).await;
        assert!(state.summary.has_shipping_method);
        assert!(api.assignment_calls.lock().unwrap().is_empty());
        assert_eq!(
            state.summary.shipments[0].shipping_method_id.as_ref().unwrap().as_str(),
            "smm_1"
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_returns_fallback() {
        let api = MockApi::default();

        let state = derive_checkout_state(&api, &OrderId::new("ord_missing")).await;
        assert_eq!(state.summary, CheckoutSummary::fallback());
        assert!(state.set_language.is_none());
    }

    #[tokio::test]
    async fn test_payment_method_always_reported_absent() {
        let mut g = graph(order(Some(false)));
        g.payment_method = Some(crate::commerce::PaymentMethod {
            id: bergamot_core::PaymentMethodId::new("pym_1"),
            name: Some("Credit card".to_string()),
            payment_source_type: Some("credit_cards".to_string()),
        });

        let api = MockApi {
            order: Some(g),
            ..MockApi::default()
        };

        let state = derive_checkout_state(&api, &OrderId::new("ord_1")).await;
        assert!(!state.summary.has_payment_method);
    }

    #[tokio::test]
    async fn test_language_instruction() {
        let api = MockApi {
            order: Some(graph(order(Some(false)))),
            ..MockApi::default()
        };

        let state = derive_checkout_state(&api, &OrderId::new("ord_1")).await;
        assert_eq!(state.set_language.unwrap().as_str(), "en");
    }

    #[tokio::test]
    async fn test_email_flags() {
        let mut o = order(Some(true));
        o.customer_email = None;
        let api = MockApi {
            order: Some(graph(o)),
            ..MockApi::default()
        };

        let state = derive_checkout_state(&api, &OrderId::new("ord_1")).await;
        assert!(!state.summary.has_email_address);
        assert!(state.summary.email_address.is_empty());
    }

    #[tokio::test]
    async fn test_email_passed_through_unvalidated() {
        let mut o = order(Some(true));
        o.customer_email = Some("not-an-email".to_string());
        let api = MockApi {
            order: Some(graph(o)),
            ..MockApi::default()
        };

        let state = derive_checkout_state(&api, &OrderId::new("ord_1")).await;
        assert!(state.summary.has_email_address);
        assert_eq!(state.summary.email_address, "not-an-email");
    }
}

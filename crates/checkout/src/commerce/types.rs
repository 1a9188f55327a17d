//! Typed projections of commerce API resources.
//!
//! All entities are owned by the remote platform; these types hold only
//! request-scoped snapshots assembled from a compound document. Partial
//! update payloads for the three mutations the checkout performs live here
//! too so their wire shape can be tested in isolation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bergamot_core::{
    AddressId, CustomerAddressId, CustomerId, OrderId, PaymentMethodId, ShipmentId,
    ShippingMethodId,
};

use super::CommerceError;
use super::document::{Document, Resource, ResourceIndex};

// ─────────────────────────────────────────────────────────────────────────────
// Resources
// ─────────────────────────────────────────────────────────────────────────────

/// The checkout transaction being completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    /// The order's unique ID.
    pub id: OrderId,
    /// Whether the order is not associated with a registered customer.
    pub guest: Option<bool>,
    /// The buyer's email address.
    pub customer_email: Option<String>,
    /// The language the checkout should be displayed in.
    pub language_code: Option<String>,
    /// Link back to the cart that created this order, if any.
    pub cart_url: Option<String>,
    /// When the order was last updated.
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct OrderAttributes {
    guest: Option<bool>,
    customer_email: Option<String>,
    language_code: Option<String>,
    cart_url: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

impl Order {
    pub(crate) fn from_resource(resource: &Resource) -> Result<Self, CommerceError> {
        let attributes: OrderAttributes = resource.parse_attributes()?;
        Ok(Self {
            id: OrderId::new(resource.id.clone()),
            guest: attributes.guest,
            customer_email: attributes.customer_email,
            language_code: attributes.language_code,
            cart_url: attributes.cart_url,
            updated_at: attributes.updated_at,
        })
    }
}

/// A shipping or billing address attached to an order.
///
/// The two roles share this shape; they differ only in the relationship
/// they hang off the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    /// The address's unique ID.
    pub id: AddressId,
    /// Full name as the platform computes it; used to match an order
    /// address against a customer's saved addresses.
    pub name: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Street address, line 1.
    pub line_1: Option<String>,
    /// Street address, line 2.
    pub line_2: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Postal/ZIP code.
    pub zip_code: Option<String>,
    /// State/province code.
    pub state_code: Option<String>,
    /// Country code.
    pub country_code: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Free-form back-reference; the deriver stamps the originating saved
    /// customer address id here after cloning.
    pub reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddressAttributes {
    name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    line_1: Option<String>,
    line_2: Option<String>,
    city: Option<String>,
    zip_code: Option<String>,
    state_code: Option<String>,
    country_code: Option<String>,
    phone: Option<String>,
    reference: Option<String>,
}

impl Address {
    pub(crate) fn from_resource(resource: &Resource) -> Result<Self, CommerceError> {
        let attributes: AddressAttributes = resource.parse_attributes()?;
        Ok(Self {
            id: AddressId::new(resource.id.clone()),
            name: attributes.name,
            first_name: attributes.first_name,
            last_name: attributes.last_name,
            line_1: attributes.line_1,
            line_2: attributes.line_2,
            city: attributes.city,
            zip_code: attributes.zip_code,
            state_code: attributes.state_code,
            country_code: attributes.country_code,
            phone: attributes.phone,
            reference: attributes.reference,
        })
    }

    /// Format the address as a single line.
    #[must_use]
    pub fn formatted_single_line(&self) -> String {
        let mut parts = Vec::new();

        if let Some(line_1) = &self.line_1
            && !line_1.is_empty()
        {
            parts.push(line_1.clone());
        }
        if let Some(line_2) = &self.line_2
            && !line_2.is_empty()
        {
            parts.push(line_2.clone());
        }
        if let Some(city) = &self.city
            && !city.is_empty()
        {
            parts.push(city.clone());
        }
        if let Some(state) = &self.state_code
            && !state.is_empty()
        {
            parts.push(state.clone());
        }
        if let Some(zip) = &self.zip_code
            && !zip.is_empty()
        {
            parts.push(zip.clone());
        }
        if let Some(country) = &self.country_code
            && !country.is_empty()
        {
            parts.push(country.clone());
        }

        parts.join(", ")
    }
}

/// A saved address belonging to a registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerAddress {
    /// The saved address record's unique ID, used as the clone reference.
    pub id: CustomerAddressId,
    /// Full name of the saved address; matched against order address names.
    pub name: Option<String>,
    /// The underlying address record, when included.
    pub address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct CustomerAddressAttributes {
    name: Option<String>,
}

impl CustomerAddress {
    pub(crate) fn from_resource(
        resource: &Resource,
        index: &ResourceIndex<'_>,
    ) -> Result<Self, CommerceError> {
        let attributes: CustomerAddressAttributes = resource.parse_attributes()?;
        let address = index
            .one(resource, "address")
            .map(Address::from_resource)
            .transpose()?;
        Ok(Self {
            id: CustomerAddressId::new(resource.id.clone()),
            name: attributes.name,
            address,
        })
    }
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    /// The customer's unique ID.
    pub id: CustomerId,
    /// The customer's email address.
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerAttributes {
    email: Option<String>,
}

impl Customer {
    pub(crate) fn from_resource(resource: &Resource) -> Result<Self, CommerceError> {
        let attributes: CustomerAttributes = resource.parse_attributes()?;
        Ok(Self {
            id: CustomerId::new(resource.id.clone()),
            email: attributes.email,
        })
    }
}

/// A unit of an order's line items requiring its own shipping method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shipment {
    /// The shipment's unique ID.
    pub id: ShipmentId,
    /// The selected shipping method, if any.
    pub shipping_method: Option<ShippingMethod>,
}

impl Shipment {
    pub(crate) fn from_resource(
        resource: &Resource,
        index: &ResourceIndex<'_>,
    ) -> Result<Self, CommerceError> {
        let shipping_method = index
            .one(resource, "shipping_method")
            .map(ShippingMethod::from_resource)
            .transpose()?;
        Ok(Self {
            id: ShipmentId::new(resource.id.clone()),
            shipping_method,
        })
    }
}

/// A selectable delivery option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingMethod {
    /// The shipping method's unique ID.
    pub id: ShippingMethodId,
    /// Display name.
    pub name: Option<String>,
    /// Price in cents; display-only, pricing stays on the platform.
    pub price_amount_cents: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ShippingMethodAttributes {
    name: Option<String>,
    price_amount_cents: Option<i64>,
}

impl ShippingMethod {
    pub(crate) fn from_resource(resource: &Resource) -> Result<Self, CommerceError> {
        let attributes: ShippingMethodAttributes = resource.parse_attributes()?;
        Ok(Self {
            id: ShippingMethodId::new(resource.id.clone()),
            name: attributes.name,
            price_amount_cents: attributes.price_amount_cents,
        })
    }
}

/// The payment method selected for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMethod {
    /// The payment method's unique ID.
    pub id: PaymentMethodId,
    /// Display name.
    pub name: Option<String>,
    /// The payment source type, e.g. `credit_cards`.
    pub payment_source_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PaymentMethodAttributes {
    name: Option<String>,
    payment_source_type: Option<String>,
}

impl PaymentMethod {
    pub(crate) fn from_resource(resource: &Resource) -> Result<Self, CommerceError> {
        let attributes: PaymentMethodAttributes = resource.parse_attributes()?;
        Ok(Self {
            id: PaymentMethodId::new(resource.id.clone()),
            name: attributes.name,
            payment_source_type: attributes.payment_source_type,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Order graph
// ─────────────────────────────────────────────────────────────────────────────

/// The fully-resolved order graph the deriver operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderGraph {
    /// The order itself.
    pub order: Order,
    /// The order's shipping address, if set.
    pub shipping_address: Option<Address>,
    /// The order's billing address, if set.
    pub billing_address: Option<Address>,
    /// The order's shipments with their selected shipping methods.
    pub shipments: Vec<Shipment>,
    /// The selected payment method, if any.
    pub payment_method: Option<PaymentMethod>,
    /// The registered customer, if the order is not a guest order.
    pub customer: Option<Customer>,
    /// The customer's saved addresses.
    pub customer_addresses: Vec<CustomerAddress>,
}

impl OrderGraph {
    /// Assemble the order graph from a compound document.
    ///
    /// # Errors
    ///
    /// Returns an error if the primary resource is not an order or any
    /// resolved resource has unexpected attribute shape.
    pub fn from_document(document: &Document) -> Result<Self, CommerceError> {
        let resource = &document.data;
        if resource.kind != "orders" {
            return Err(CommerceError::MalformedResource {
                kind: resource.kind.clone(),
                detail: "expected primary resource of type orders".to_string(),
            });
        }

        let index = ResourceIndex::new(&document.included);

        let order = Order::from_resource(resource)?;

        let shipping_address = index
            .one(resource, "shipping_address")
            .map(Address::from_resource)
            .transpose()?;
        let billing_address = index
            .one(resource, "billing_address")
            .map(Address::from_resource)
            .transpose()?;

        let shipments = index
            .many(resource, "shipments")
            .into_iter()
            .map(|shipment| Shipment::from_resource(shipment, &index))
            .collect::<Result<Vec<_>, _>>()?;

        let payment_method = index
            .one(resource, "payment_method")
            .map(PaymentMethod::from_resource)
            .transpose()?;

        let customer_resource = index.one(resource, "customer");
        let customer = customer_resource
            .map(Customer::from_resource)
            .transpose()?;
        let customer_addresses = customer_resource
            .map(|customer| {
                index
                    .many(customer, "customer_addresses")
                    .into_iter()
                    .map(|saved| CustomerAddress::from_resource(saved, &index))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            order,
            shipping_address,
            billing_address,
            shipments,
            payment_method,
            customer,
            customer_addresses,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Partial update payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Payload cloning a saved address onto both order address slots.
///
/// The platform interprets the `_billing_address_clone_id` and
/// `_shipping_address_clone_id` trigger attributes by copying the given
/// address record into new order-owned addresses.
#[must_use]
pub fn order_clone_addresses_payload(
    order_id: &OrderId,
    address_id: &AddressId,
) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "id": order_id,
            "type": "orders",
            "attributes": {
                "_billing_address_clone_id": address_id,
                "_shipping_address_clone_id": address_id,
            }
        }
    })
}

/// Payload stamping an address with its originating saved-address id.
#[must_use]
pub fn address_reference_payload(
    address_id: &AddressId,
    reference: &CustomerAddressId,
) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "id": address_id,
            "type": "addresses",
            "attributes": {
                "reference": reference,
            }
        }
    })
}

/// Payload selecting a shipping method on a shipment.
#[must_use]
pub fn shipment_shipping_method_payload(
    shipment_id: &ShipmentId,
    shipping_method_id: &ShippingMethodId,
) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "id": shipment_id,
            "type": "shipments",
            "relationships": {
                "shipping_method": {
                    "data": {
                        "type": "shipping_methods",
                        "id": shipping_method_id,
                    }
                }
            }
        }
    })
}

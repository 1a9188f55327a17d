//! Commerce API client implementation.
//!
//! Thin JSON:API client over `reqwest`. No caching: every entity the
//! checkout touches is remote, mutable state.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use bergamot_core::{AddressId, CustomerAddressId, OrderId, ShipmentId, ShippingMethodId};

use crate::config::CommerceConfig;

use super::document::{Document, ErrorDocument, ListDocument};
use super::types::{
    OrderGraph, ShippingMethod, address_reference_payload, order_clone_addresses_payload,
    shipment_shipping_method_payload,
};
use super::{ApiError, CommerceError};

const MEDIA_TYPE: &str = "application/vnd.api+json";

/// Relationship includes for the order fetch. Everything the deriver
/// needs arrives in one compound document.
const ORDER_INCLUDES: &str = "shipping_address,billing_address,shipments,\
    shipments.shipping_method,payment_method,customer,\
    customer.customer_addresses,customer.customer_addresses.address";

/// Includes for the address-clone update: only the two address slots the
/// deriver reads back.
const CLONE_INCLUDES: &str = "shipping_address,billing_address";

/// Client for the commerce platform's resource API.
///
/// One client per access token; construction is cheap and the inner state
/// is shared on clone.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    endpoint: Url,
    access_token: SecretString,
}

impl CommerceClient {
    /// Create a new commerce API client for the given access token.
    #[must_use]
    pub fn new(config: &CommerceConfig, access_token: &str) -> Self {
        Self {
            inner: Arc::new(CommerceClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint.clone(),
                access_token: SecretString::from(access_token),
            }),
        }
    }

    fn url(&self, path: &str) -> Result<Url, CommerceError> {
        self.inner.endpoint.join(path).map_err(|e| {
            CommerceError::MalformedResource {
                kind: "url".to_string(),
                detail: format!("{path}: {e}"),
            }
        })
    }

    /// Send a request and parse the JSON:API response body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, CommerceError> {
        let response = request
            .header("Accept", MEDIA_TYPE)
            .header(
                "Authorization",
                format!("Bearer {}", self.inner.access_token.expose_secret()),
            )
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CommerceError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Commerce API returned non-success status"
            );

            if let Ok(error_document) = serde_json::from_str::<ErrorDocument>(&response_text)
                && !error_document.errors.is_empty()
            {
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(CommerceError::NotFound(
                        CommerceError::Api(error_document.errors).to_string(),
                    ));
                }
                return Err(CommerceError::Api(error_document.errors));
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(CommerceError::NotFound(format!("HTTP {status}")));
            }
            return Err(CommerceError::Api(vec![ApiError {
                title: Some(format!("HTTP {status}")),
                detail: Some(response_text.chars().take(200).collect()),
                code: None,
                status: Some(status.as_u16().to_string()),
            }]));
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse commerce API response"
            );
            CommerceError::Parse(e)
        })
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Fetch an order and its full relationship graph in one request.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the API request fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: &OrderId) -> Result<OrderGraph, CommerceError> {
        let url = self.url(&format!("/api/orders/{order_id}"))?;
        let request = self
            .inner
            .client
            .get(url)
            .query(&[("include", ORDER_INCLUDES)]);

        let document: Document = self.send(request).await?;
        OrderGraph::from_document(&document)
    }

    /// Clone a saved address onto the order's billing and shipping slots.
    ///
    /// Returns the updated order graph with the two freshly-created
    /// addresses included.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is rejected or the API request fails.
    #[instrument(skip(self), fields(order_id = %order_id, address_id = %address_id))]
    pub async fn clone_order_addresses(
        &self,
        order_id: &OrderId,
        address_id: &AddressId,
    ) -> Result<OrderGraph, CommerceError> {
        let url = self.url(&format!("/api/orders/{order_id}"))?;
        let request = self
            .inner
            .client
            .patch(url)
            .query(&[("include", CLONE_INCLUDES)])
            .header("Content-Type", MEDIA_TYPE)
            .json(&order_clone_addresses_payload(order_id, address_id));

        let document: Document = self.send(request).await?;
        OrderGraph::from_document(&document)
    }

    // =========================================================================
    // Address Methods
    // =========================================================================

    /// Stamp an order address with the saved customer address it was
    /// cloned from.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is rejected or the API request fails.
    #[instrument(skip(self), fields(address_id = %address_id))]
    pub async fn set_address_reference(
        &self,
        address_id: &AddressId,
        reference: &CustomerAddressId,
    ) -> Result<(), CommerceError> {
        let url = self.url(&format!("/api/addresses/{address_id}"))?;
        let request = self
            .inner
            .client
            .patch(url)
            .header("Content-Type", MEDIA_TYPE)
            .json(&address_reference_payload(address_id, reference));

        let _: Document = self.send(request).await?;
        Ok(())
    }

    // =========================================================================
    // Shipment Methods
    // =========================================================================

    /// Select a shipping method on a shipment.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is rejected or the API request fails.
    #[instrument(skip(self), fields(shipment_id = %shipment_id, shipping_method_id = %shipping_method_id))]
    pub async fn set_shipment_shipping_method(
        &self,
        shipment_id: &ShipmentId,
        shipping_method_id: &ShippingMethodId,
    ) -> Result<(), CommerceError> {
        let url = self.url(&format!("/api/shipments/{shipment_id}"))?;
        let request = self
            .inner
            .client
            .patch(url)
            .header("Content-Type", MEDIA_TYPE)
            .json(&shipment_shipping_method_payload(
                shipment_id,
                shipping_method_id,
            ));

        let _: Document = self.send(request).await?;
        Ok(())
    }

    // =========================================================================
    // Shipping Method Methods
    // =========================================================================

    /// List all shipping methods available to the current market.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_shipping_methods(&self) -> Result<Vec<ShippingMethod>, CommerceError> {
        let url = self.url("/api/shipping_methods")?;
        let request = self.inner.client.get(url);

        let document: ListDocument = self.send(request).await?;
        document
            .data
            .iter()
            .map(ShippingMethod::from_resource)
            .collect()
    }
}

//! Commerce platform API client.
//!
//! # Architecture
//!
//! - Speaks JSON:API against the platform's resource endpoints
//! - The platform is source of truth - NO local sync, direct API calls
//! - One client per access token; tokens arrive per checkout session
//!
//! # Operations
//!
//! - Fetch an order by id with relationship includes
//! - List all shipping methods
//! - Partial updates on orders (address cloning), addresses (reference
//!   stamping) and shipments (shipping method selection)
//!
//! # Example
//!
//! ```rust,ignore
//! use bergamot_checkout::commerce::CommerceClient;
//!
//! let client = CommerceClient::new(&config.commerce, access_token);
//!
//! // Fetch the order graph
//! let graph = client.get_order(&order_id).await?;
//!
//! // Select a shipping method on a shipment
//! client
//!     .set_shipment_shipping_method(&shipment_id, &method_id)
//!     .await?;
//! ```

mod auth;
mod client;
mod document;
pub mod types;

pub use auth::{SalesChannelToken, mint_sales_channel_token};
pub use client::CommerceClient;
pub use document::{Document, Linkage, Resource, ResourceIdentifier};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the commerce API.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned an error document.
    #[error("API errors: {}", format_api_errors(.0))]
    Api(Vec<ApiError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A resource in a compound document had unexpected shape.
    #[error("Malformed resource of type {kind}: {detail}")]
    MalformedResource {
        /// JSON:API resource type.
        kind: String,
        /// What was wrong with it.
        detail: String,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the platform.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// OAuth token minting failed.
    #[error("OAuth error: {0}")]
    OAuth(String),
}

/// A JSON:API error object returned by the commerce API.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiError {
    /// Short, human-readable summary.
    pub title: Option<String>,
    /// Human-readable explanation specific to this occurrence.
    pub detail: Option<String>,
    /// Application-specific error code.
    pub code: Option<String>,
    /// HTTP status code as a string.
    pub status: Option<String>,
}

fn format_api_errors(errors: &[ApiError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if let Some(title) = &e.title
                && !title.is_empty()
            {
                parts.push(title.clone());
            }

            if let Some(detail) = &e.detail
                && !detail.is_empty()
            {
                parts.push(detail.clone());
            }

            if let Some(code) = &e.code
                && !code.is_empty()
            {
                parts.push(format!("code: {code}"));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" - ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commerce_error_display() {
        let err = CommerceError::NotFound("order ord_123".to_string());
        assert_eq!(err.to_string(), "Not found: order ord_123");
    }

    #[test]
    fn test_api_error_formatting() {
        let errors = vec![
            ApiError {
                title: Some("Record not found".to_string()),
                detail: None,
                code: Some("RECORD_NOT_FOUND".to_string()),
                status: Some("404".to_string()),
            },
            ApiError {
                title: Some("Invalid token".to_string()),
                detail: None,
                code: None,
                status: None,
            },
        ];
        let err = CommerceError::Api(errors);
        assert_eq!(
            err.to_string(),
            "API errors: Record not found - code: RECORD_NOT_FOUND; Invalid token"
        );
    }

    #[test]
    fn test_api_error_title_and_detail() {
        let errors = vec![ApiError {
            title: Some("Unprocessable entity".to_string()),
            detail: Some("shipping_method - can't be blank".to_string()),
            code: None,
            status: Some("422".to_string()),
        }];
        let err = CommerceError::Api(errors);
        assert_eq!(
            err.to_string(),
            "API errors: Unprocessable entity - shipping_method - can't be blank"
        );
    }

    #[test]
    fn test_api_error_no_details() {
        let errors = vec![ApiError {
            title: None,
            detail: None,
            code: None,
            status: None,
        }];
        let err = CommerceError::Api(errors);
        assert_eq!(err.to_string(), "API errors: [error 1]: (no details)");
    }

    #[test]
    fn test_api_error_empty_vec() {
        let err = CommerceError::Api(vec![]);
        assert_eq!(err.to_string(), "API errors: (no error details provided)");
    }

    #[test]
    fn test_rate_limited_error() {
        let err = CommerceError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }
}

//! Order inspection commands.
//!
//! # Usage
//!
//! ```bash
//! # Derive the checkout state with an existing access token
//! bgm-cli order status <order-id> --token <access-token>
//!
//! # Mint a sales channel token from environment credentials
//! bgm-cli order status <order-id>
//! ```

use thiserror::Error;

use bergamot_checkout::commerce::{CommerceClient, CommerceError, mint_sales_channel_token};
use bergamot_checkout::config::CheckoutConfig;
use bergamot_checkout::state::derive_checkout_state;
use bergamot_core::OrderId;

/// Errors that can occur while inspecting orders.
#[derive(Debug, Error)]
pub enum OrderCommandError {
    /// Token minting or API error.
    #[error("Commerce API error: {0}")]
    Commerce(#[from] CommerceError),

    /// The derived state could not be serialized for output.
    #[error("Failed to serialize checkout state: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Derive the checkout state for an order and print it as JSON.
///
/// When `token` is absent, a sales channel token is minted from the
/// configured client credentials first.
#[allow(clippy::print_stdout)]
pub async fn status(
    config: &CheckoutConfig,
    order_id: &str,
    token: Option<&str>,
    compact: bool,
) -> Result<(), OrderCommandError> {
    let access_token = match token {
        Some(token) => token.to_owned(),
        None => {
            tracing::info!("No token supplied, minting a sales channel token...");
            mint_sales_channel_token(&config.commerce).await?.access_token
        }
    };

    let client = CommerceClient::new(&config.commerce, &access_token);
    let order_id = OrderId::new(order_id);

    let state = derive_checkout_state(&client, &order_id).await;

    if let Some(language) = &state.set_language {
        tracing::info!("Order requests display language: {language}");
    }

    let output = if compact {
        serde_json::to_string(&state)?
    } else {
        serde_json::to_string_pretty(&state)?
    };
    println!("{output}");
    Ok(())
}

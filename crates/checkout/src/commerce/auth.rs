//! Sales-channel OAuth token minting.
//!
//! Checkout sessions normally arrive with an access token already minted
//! by the host storefront. The CLI and local development mint one directly
//! via the client-credentials grant.

use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::CommerceConfig;

use super::CommerceError;

/// An access token for the commerce API.
#[derive(Debug, Clone, Deserialize)]
pub struct SalesChannelToken {
    /// The bearer token for API requests.
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: Option<i64>,
    /// Granted scope.
    pub scope: Option<String>,
    /// Token type, normally `bearer`.
    pub token_type: Option<String>,
}

/// Mint a sales-channel access token via the client-credentials grant.
///
/// # Errors
///
/// Returns [`CommerceError::OAuth`] if credentials are missing from the
/// configuration or the token endpoint rejects the request.
pub async fn mint_sales_channel_token(
    config: &CommerceConfig,
) -> Result<SalesChannelToken, CommerceError> {
    let client_id = config
        .client_id
        .as_deref()
        .ok_or_else(|| CommerceError::OAuth("COMMERCE_CLIENT_ID is not configured".to_string()))?;

    let url = config
        .endpoint
        .join("/oauth/token")
        .map_err(|e| CommerceError::OAuth(format!("invalid token endpoint: {e}")))?;

    let mut params = vec![
        ("grant_type", "client_credentials".to_string()),
        ("client_id", client_id.to_string()),
    ];
    if let Some(secret) = &config.client_secret {
        params.push(("client_secret", secret.expose_secret().to_string()));
    }
    if let Some(scope) = &config.scope {
        params.push(("scope", scope.clone()));
    }

    let response = reqwest::Client::new().post(url).form(&params).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(CommerceError::OAuth(format!(
            "token request failed ({status}): {text}"
        )));
    }

    let token: SalesChannelToken = response.json().await?;
    Ok(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_parses() {
        let token: SalesChannelToken = serde_json::from_str(
            r#"{
                "access_token": "eyJhbGciOi...",
                "token_type": "bearer",
                "expires_in": 7200,
                "scope": "market:1234"
            }"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "eyJhbGciOi...");
        assert_eq!(token.expires_in, Some(7200));
        assert_eq!(token.scope.as_deref(), Some("market:1234"));
    }

    #[test]
    fn test_token_response_minimal() {
        let token: SalesChannelToken =
            serde_json::from_str(r#"{ "access_token": "abc" }"#).unwrap();
        assert_eq!(token.access_token, "abc");
        assert!(token.expires_in.is_none());
    }
}

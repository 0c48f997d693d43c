//! Authorization URL construction and token endpoint exchanges.

use crate::config::DonationAlertsConfig;
use crate::types::TokenResponse;
use chrono::Utc;
use once_cell::sync::Lazy;
use ras_identity_core::{IdentityError, IdentityResult, Token};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

static DEFAULT_HTTP_CLIENT: Lazy<Client> = Lazy::new(Client::new);

/// The process-wide client used by providers that were not given one.
pub fn default_http_client() -> &'static Client {
    &DEFAULT_HTTP_CLIENT
}

pub(crate) fn build_http_client(timeout_seconds: u64) -> IdentityResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| IdentityError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Talks to the authorization and token endpoints on behalf of one provider.
pub struct AuthClient<'a> {
    http_client: &'a Client,
    config: &'a DonationAlertsConfig,
}

impl<'a> AuthClient<'a> {
    pub fn new(http_client: &'a Client, config: &'a DonationAlertsConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Builds the URL the end user is redirected to. `state` is sent verbatim.
    pub fn authorization_url(&self, state: &str) -> IdentityResult<String> {
        let mut url = Url::parse(&self.config.authorization_endpoint).map_err(|e| {
            IdentityError::Config(format!(
                "Invalid authorization endpoint {}: {}",
                self.config.authorization_endpoint, e
            ))
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scope_param())
            .append_pair("state", state);

        debug!(
            "Generated authorization URL for endpoint {}",
            self.config.authorization_endpoint
        );

        Ok(url.to_string())
    }

    /// Exchange authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> IdentityResult<Token> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let token = self.request_token(&params, None).await?;
        info!("Successfully exchanged code for tokens");
        Ok(token)
    }

    /// Trades a refresh token for a fresh access token. When the provider does
    /// not rotate the refresh token, the one passed in is kept.
    pub async fn refresh(&self, refresh_token: &str) -> IdentityResult<Token> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let token = self.request_token(&params, Some(refresh_token)).await?;
        info!("Successfully refreshed access token");
        Ok(token)
    }

    async fn request_token(
        &self,
        params: &[(&str, &str)],
        current_refresh_token: Option<&str>,
    ) -> IdentityResult<Token> {
        let response = self
            .http_client
            .post(&self.config.token_endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(params)
            .send()
            .await
            .map_err(|e| IdentityError::TokenExchange(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| IdentityError::TokenExchange(e.to_string()))?;

        if !status.is_success() {
            error!("Token exchange failed with status {}: {}", status, body);
            return Err(IdentityError::TokenExchange(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            IdentityError::TokenExchange(format!("malformed token response: {}", e))
        })?;

        let now = Utc::now();
        let mut token = token_response.into_token(now)?;
        if token.refresh_token.is_none() {
            token.refresh_token = current_refresh_token
                .filter(|refresh| !refresh.is_empty())
                .map(String::from);
        }

        if let Err(e) = token.validate(now) {
            warn!("Rejected token from provider: {}", e);
            return Err(e);
        }

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn test_config() -> DonationAlertsConfig {
        DonationAlertsConfig::new(
            "test_client_id",
            "test_secret",
            "http://localhost:3000/callback",
            vec!["oauth-user-show".to_string(), "oauth-donation-index".to_string()],
        )
    }

    #[test]
    fn test_authorization_url_generation() {
        let config = test_config();
        let http_client = Client::new();
        let client = AuthClient::new(&http_client, &config);

        let auth_url = client.authorization_url("test_state").unwrap();

        assert!(auth_url.starts_with("https://www.donationalerts.com/oauth/authorize?"));
        assert!(auth_url.contains("scope=oauth-user-show+oauth-donation-index"));

        let url = Url::parse(&auth_url).unwrap();
        let params: HashMap<_, _> = url.query_pairs().collect();
        assert_eq!(params.get("response_type"), Some(&"code".into()));
        assert_eq!(params.get("client_id"), Some(&"test_client_id".into()));
        assert_eq!(
            params.get("redirect_uri"),
            Some(&"http://localhost:3000/callback".into())
        );
        assert_eq!(params.get("state"), Some(&"test_state".into()));
        assert_eq!(
            params.get("scope"),
            Some(&"oauth-user-show oauth-donation-index".into())
        );
    }

    #[test]
    fn test_state_round_trips_through_encoding() {
        let config = test_config();
        let http_client = Client::new();
        let client = AuthClient::new(&http_client, &config);

        let state = "a b&c=d/é";
        let url = Url::parse(&client.authorization_url(state).unwrap()).unwrap();
        let params: HashMap<_, _> = url.query_pairs().collect();
        assert_eq!(params.get("state"), Some(&state.into()));
    }

    #[test]
    fn test_invalid_authorization_endpoint() {
        let config = test_config().with_authorization_endpoint("not a url");
        let http_client = Client::new();
        let client = AuthClient::new(&http_client, &config);

        let result = client.authorization_url("state");
        assert!(matches!(result, Err(IdentityError::Config(_))));
    }
}

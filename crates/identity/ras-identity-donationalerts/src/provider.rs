//! DonationAlerts identity provider implementation.

use crate::client::{AuthClient, build_http_client, default_http_client};
use crate::config::DonationAlertsConfig;
use crate::profile::ProfileFetcher;
use crate::session::DonationAlertsSession;
use crate::PROVIDER_NAME;
use async_trait::async_trait;
use ras_identity_core::{IdentityResult, Provider, Token, User};
use reqwest::Client;
use tracing::info;

/// DonationAlerts provider that implements [`Provider`].
///
/// Read-only once built; share it behind an `Arc` or a reference across any
/// number of concurrent logins.
#[derive(Debug, Clone)]
pub struct DonationAlertsProvider {
    config: DonationAlertsConfig,
    name: String,
    http_client: Option<Client>,
}

impl DonationAlertsProvider {
    /// Creates a provider against the production endpoints using the shared
    /// default HTTP client. An empty scope list requests `oauth-user-show`.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            config: DonationAlertsConfig::new(client_id, client_secret, redirect_uri, scopes),
            name: PROVIDER_NAME.to_string(),
            http_client: None,
        }
    }

    /// Creates a provider with its own HTTP client honoring the configured timeout.
    pub fn from_config(config: DonationAlertsConfig) -> IdentityResult<Self> {
        let http_client = build_http_client(config.http_timeout_seconds)?;
        Ok(Self {
            config,
            name: PROVIDER_NAME.to_string(),
            http_client: Some(http_client),
        })
    }

    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn config(&self) -> &DonationAlertsConfig {
        &self.config
    }

    /// The injected client, or the process-wide default.
    pub fn client(&self) -> &Client {
        self.http_client
            .as_ref()
            .unwrap_or_else(|| default_http_client())
    }

    fn auth_client(&self) -> AuthClient<'_> {
        AuthClient::new(self.client(), &self.config)
    }

    pub(crate) async fn exchange_code(&self, code: &str) -> IdentityResult<Token> {
        self.auth_client().exchange_code(code).await
    }
}

#[async_trait]
impl Provider for DonationAlertsProvider {
    type Session = DonationAlertsSession;

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn begin_auth(&self, state: &str) -> IdentityResult<DonationAlertsSession> {
        let auth_url = self.auth_client().authorization_url(state)?;
        info!("Started OAuth2 flow for provider: {}", self.name);
        Ok(DonationAlertsSession::with_auth_url(auth_url))
    }

    fn unmarshal_session(&self, data: &str) -> IdentityResult<DonationAlertsSession> {
        DonationAlertsSession::unmarshal(data)
    }

    async fn fetch_user(&self, session: &DonationAlertsSession) -> IdentityResult<User> {
        let fetcher = ProfileFetcher::new(self.client(), &self.config.profile_endpoint, &self.name);
        let mut user = fetcher.fetch_user(&session.access_token).await?;

        user.refresh_token = session.refresh_token.clone();
        user.expires_at = session.expires_at;
        Ok(user)
    }

    async fn refresh_token(&self, refresh_token: &str) -> IdentityResult<Token> {
        self.auth_client().refresh(refresh_token).await
    }

    fn refresh_token_available(&self) -> bool {
        true
    }
}

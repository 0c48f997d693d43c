//! User profile retrieval and normalization.

use crate::types::ProfileResponse;
use ras_identity_core::{IdentityError, IdentityResult, User};
use reqwest::Client;
use tracing::{error, info};

/// Fetches the authenticated user's profile from the DonationAlerts API.
pub struct ProfileFetcher<'a> {
    http_client: &'a Client,
    endpoint: &'a str,
    provider_name: &'a str,
}

impl<'a> ProfileFetcher<'a> {
    pub fn new(http_client: &'a Client, endpoint: &'a str, provider_name: &'a str) -> Self {
        Self {
            http_client,
            endpoint,
            provider_name,
        }
    }

    /// Issues one bearer-authenticated GET and decodes the profile. The
    /// returned user carries `access_token`; refresh token and expiry are left
    /// for the caller to fill in from its session.
    pub async fn fetch_user(&self, access_token: &str) -> IdentityResult<User> {
        let response = self
            .http_client
            .get(self.endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| IdentityError::Network(e.to_string()))?;

        if !status.is_success() {
            error!(
                "User info request failed with status {}: {}",
                status,
                String::from_utf8_lossy(&body)
            );
            return Err(IdentityError::Network(format!(
                "profile endpoint returned {}",
                status
            )));
        }

        let mut user = User {
            provider: self.provider_name.to_string(),
            access_token: access_token.to_string(),
            ..User::default()
        };
        decode_user_data(&body, &mut user)?;

        info!(
            "Successfully retrieved {} profile for user {}",
            self.provider_name, user.user_id
        );
        Ok(user)
    }
}

/// Captures the body verbatim as `raw_data`, then extracts the known fields
/// of its `data` object.
pub(crate) fn decode_user_data(body: &[u8], user: &mut User) -> IdentityResult<()> {
    let raw_data: serde_json::Map<String, serde_json::Value> =
        serde_json::from_slice(body).map_err(|e| IdentityError::Decode(e.to_string()))?;

    let profile: ProfileResponse =
        serde_json::from_slice(body).map_err(|e| IdentityError::Decode(e.to_string()))?;
    let data = profile.data;

    user.raw_data = raw_data;
    user.user_id = data.id.to_string();
    user.nick_name = data.code.unwrap_or_default();
    user.name = data.name.unwrap_or_default();
    user.avatar_url = data.avatar.unwrap_or_default();
    user.email = data.email.unwrap_or_default();

    Ok(())
}

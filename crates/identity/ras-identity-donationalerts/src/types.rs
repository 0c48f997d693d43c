//! Wire types for the DonationAlerts token and profile endpoints.

use chrono::{DateTime, Duration, Utc};
use ras_identity_core::{IdentityError, IdentityResult, Token};
use serde::Deserialize;

/// OAuth2 token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    pub token_type: Option<String>,
    /// Lifetime in seconds from the moment the response was received.
    pub expires_in: Option<i64>,
    /// Absolute expiry, sent by some deployments instead of `expires_in`.
    #[serde(alias = "expires_at")]
    pub expiry: Option<DateTime<Utc>>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Converts the response into a [`Token`], resolving `expires_in` against
    /// `received_at`. A zero `expires_in` means the token does not expire; a
    /// lifetime that does not fit in a timestamp is a malformed response.
    pub fn into_token(self, received_at: DateTime<Utc>) -> IdentityResult<Token> {
        let expires_at = match (self.expiry, self.expires_in) {
            (Some(expiry), _) => Some(expiry),
            (None, Some(seconds)) if seconds != 0 => Some(
                Duration::try_seconds(seconds)
                    .and_then(|lifetime| received_at.checked_add_signed(lifetime))
                    .ok_or_else(|| {
                        IdentityError::TokenExchange(format!(
                            "malformed token response: expires_in {} is out of range",
                            seconds
                        ))
                    })?,
            ),
            _ => None,
        };

        Ok(Token {
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self.refresh_token.filter(|token| !token.is_empty()),
            expires_at,
        })
    }
}

/// The `/api/v1/user/oauth` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub data: ProfileData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileData {
    pub id: i64,
    pub code: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub email: Option<String>,
}

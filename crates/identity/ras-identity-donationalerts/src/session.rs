//! Per-login session state carried across the authorization redirect.

use crate::provider::DonationAlertsProvider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ras_identity_core::{CallbackParams, IdentityError, IdentityResult, Session, SessionPhase};
use serde::{Deserialize, Serialize};

/// Serialized as a flat JSON object with the fields `AuthURL`, `AccessToken`,
/// `RefreshToken` and `ExpiresAt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationAlertsSession {
    #[serde(rename = "AuthURL", default)]
    pub auth_url: String,
    #[serde(rename = "AccessToken", default)]
    pub access_token: String,
    #[serde(rename = "RefreshToken", default)]
    pub refresh_token: String,
    #[serde(rename = "ExpiresAt", default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl DonationAlertsSession {
    pub(crate) fn with_auth_url(auth_url: String) -> Self {
        Self {
            auth_url,
            ..Self::default()
        }
    }

    pub fn unmarshal(data: &str) -> IdentityResult<Self> {
        serde_json::from_str(data).map_err(|e| IdentityError::InvalidSession(e.to_string()))
    }
}

#[async_trait]
impl Session<DonationAlertsProvider> for DonationAlertsSession {
    fn auth_url(&self) -> IdentityResult<&str> {
        if self.auth_url.is_empty() {
            return Err(IdentityError::MissingAuthUrl);
        }
        Ok(&self.auth_url)
    }

    fn marshal(&self) -> IdentityResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn phase(&self) -> SessionPhase {
        if !self.access_token.is_empty() {
            SessionPhase::Authorized
        } else if !self.auth_url.is_empty() {
            SessionPhase::AuthUrlSet
        } else {
            SessionPhase::Empty
        }
    }

    /// The session is only written once the exchange has fully succeeded, so a
    /// failed call can be retried on the same session.
    async fn authorize(
        &mut self,
        provider: &DonationAlertsProvider,
        params: &CallbackParams,
    ) -> IdentityResult<String> {
        if let Some(error) = params.get("error") {
            let description = params.get("error_description").unwrap_or("No description");
            return Err(IdentityError::Callback(format!("{}: {}", error, description)));
        }

        let code = params
            .get("code")
            .filter(|code| !code.is_empty())
            .ok_or(IdentityError::MissingAuthorizationCode)?;

        let token = provider.exchange_code(code).await?;

        self.access_token = token.access_token.clone();
        self.refresh_token = token.refresh_token.unwrap_or_default();
        self.expires_at = token.expires_at;

        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_auth_url_missing_on_fresh_session() {
        let session = DonationAlertsSession::default();
        assert!(matches!(
            session.auth_url(),
            Err(IdentityError::MissingAuthUrl)
        ));
        assert_eq!(session.phase(), SessionPhase::Empty);
    }

    #[test]
    fn test_phase_transitions() {
        let mut session = DonationAlertsSession::with_auth_url("https://example.com/auth".into());
        assert_eq!(session.phase(), SessionPhase::AuthUrlSet);
        assert_eq!(session.auth_url().unwrap(), "https://example.com/auth");

        session.access_token = "token".to_string();
        assert_eq!(session.phase(), SessionPhase::Authorized);
    }

    #[test]
    fn test_marshal_round_trip() {
        let expires_at = Utc::now() + Duration::days(1);
        let sessions = [
            DonationAlertsSession::default(),
            DonationAlertsSession::with_auth_url("https://example.com/auth?state=x".into()),
            DonationAlertsSession {
                auth_url: String::new(),
                access_token: "access".to_string(),
                refresh_token: String::new(),
                expires_at: Some(expires_at),
            },
            DonationAlertsSession {
                auth_url: "https://example.com/auth".to_string(),
                access_token: "access".to_string(),
                refresh_token: "refresh".to_string(),
                expires_at: Some(expires_at),
            },
        ];

        for session in sessions {
            let data = session.marshal().unwrap();
            assert_eq!(DonationAlertsSession::unmarshal(&data).unwrap(), session);
        }
    }

    #[test]
    fn test_marshal_emits_exactly_four_fields() {
        let session = DonationAlertsSession::with_auth_url("https://example.com/auth".into());
        let value: serde_json::Value = serde_json::from_str(&session.marshal().unwrap()).unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["AccessToken", "AuthURL", "ExpiresAt", "RefreshToken"]);
    }

    #[test]
    fn test_unmarshal_accepts_partial_and_rejects_garbage() {
        let session = DonationAlertsSession::unmarshal(r#"{"AuthURL":"https://example.com"}"#)
            .unwrap();
        assert_eq!(session.auth_url, "https://example.com");
        assert!(session.access_token.is_empty());

        let result = DonationAlertsSession::unmarshal("not json");
        assert!(matches!(result, Err(IdentityError::InvalidSession(_))));
    }
}

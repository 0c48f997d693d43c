//! DonationAlerts provider configuration.

use crate::{AUTHORIZATION_ENDPOINT, PROFILE_ENDPOINT, SCOPE_USER_SHOW, TOKEN_ENDPOINT};
use ras_identity_core::{IdentityError, IdentityResult};
use serde::{Deserialize, Deserializer, Serialize};

pub const ENV_CLIENT_ID: &str = "DONATIONALERTS_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "DONATIONALERTS_CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "DONATIONALERTS_REDIRECT_URI";
pub const ENV_SCOPES: &str = "DONATIONALERTS_SCOPES";

/// Client credentials, requested scopes and endpoints for one DonationAlerts application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationAlertsConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Requested scopes, in order. Duplicates are sent as given.
    #[serde(default = "default_scopes", deserialize_with = "deserialize_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_authorization_endpoint")]
    pub authorization_endpoint: String,
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,
    #[serde(default = "default_profile_endpoint")]
    pub profile_endpoint: String,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
}

fn default_scopes() -> Vec<String> {
    vec![SCOPE_USER_SHOW.to_string()]
}

fn deserialize_scopes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let scopes = Vec::<String>::deserialize(deserializer)?;
    Ok(if scopes.is_empty() {
        default_scopes()
    } else {
        scopes
    })
}

fn default_authorization_endpoint() -> String {
    AUTHORIZATION_ENDPOINT.to_string()
}

fn default_token_endpoint() -> String {
    TOKEN_ENDPOINT.to_string()
}

fn default_profile_endpoint() -> String {
    PROFILE_ENDPOINT.to_string()
}

fn default_http_timeout() -> u64 {
    30
}

impl DonationAlertsConfig {
    /// Builds a configuration against the production endpoints. An empty
    /// scope list falls back to `oauth-user-show`.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scopes: if scopes.is_empty() {
                default_scopes()
            } else {
                scopes
            },
            authorization_endpoint: default_authorization_endpoint(),
            token_endpoint: default_token_endpoint(),
            profile_endpoint: default_profile_endpoint(),
            http_timeout_seconds: default_http_timeout(),
        }
    }

    /// Reads the configuration from `DONATIONALERTS_*` environment variables.
    pub fn from_env() -> IdentityResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> IdentityResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| IdentityError::Config(format!("{} is not set", key)))
        };

        let client_id = required(ENV_CLIENT_ID)?;
        let client_secret = required(ENV_CLIENT_SECRET)?;
        let redirect_uri = required(ENV_REDIRECT_URI)?;
        let scopes = lookup(ENV_SCOPES)
            .map(|raw| raw.split_whitespace().map(String::from).collect())
            .unwrap_or_default();

        Ok(Self::new(client_id, client_secret, redirect_uri, scopes))
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = if scopes.is_empty() {
            default_scopes()
        } else {
            scopes
        };
        self
    }

    pub fn with_authorization_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.authorization_endpoint = endpoint.into();
        self
    }

    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    pub fn with_profile_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.profile_endpoint = endpoint.into();
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = seconds;
        self
    }

    /// The `scope` query value: requested scopes joined by a single space.
    pub fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_new_defaults_scope_and_endpoints() {
        let config = DonationAlertsConfig::new("key", "secret", "/foo", vec![]);
        assert_eq!(config.scopes, vec!["oauth-user-show".to_string()]);
        assert_eq!(config.authorization_endpoint, AUTHORIZATION_ENDPOINT);
        assert_eq!(config.token_endpoint, TOKEN_ENDPOINT);
        assert_eq!(config.profile_endpoint, PROFILE_ENDPOINT);
        assert_eq!(config.http_timeout_seconds, 30);
    }

    #[test]
    fn test_scopes_are_kept_in_order_with_duplicates() {
        let config = DonationAlertsConfig::new(
            "key",
            "secret",
            "/foo",
            vec![
                "oauth-donation-index".to_string(),
                "oauth-user-show".to_string(),
                "oauth-donation-index".to_string(),
            ],
        );
        assert_eq!(
            config.scope_param(),
            "oauth-donation-index oauth-user-show oauth-donation-index"
        );
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: DonationAlertsConfig = serde_json::from_str(
            r#"{"client_id":"key","client_secret":"secret","redirect_uri":"/foo"}"#,
        )
        .unwrap();
        assert_eq!(config.scope_param(), "oauth-user-show");
        assert_eq!(config.token_endpoint, TOKEN_ENDPOINT);
        assert_eq!(config.http_timeout_seconds, 30);
    }

    #[test]
    fn test_deserialize_empty_scopes_falls_back_to_default() {
        let config: DonationAlertsConfig = serde_json::from_str(
            r#"{"client_id":"key","client_secret":"secret","redirect_uri":"/foo","scopes":[]}"#,
        )
        .unwrap();
        assert_eq!(config.scopes, vec!["oauth-user-show".to_string()]);
        assert_eq!(config.scope_param(), "oauth-user-show");

        let config = DonationAlertsConfig::new(
            "key",
            "secret",
            "/foo",
            vec!["oauth-donation-index".to_string()],
        )
        .with_scopes(vec![]);
        assert_eq!(config.scope_param(), "oauth-user-show");
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_CLIENT_ID, "key"),
            (ENV_CLIENT_SECRET, "secret"),
            (ENV_REDIRECT_URI, "http://localhost:3000/callback"),
            (ENV_SCOPES, "oauth-user-show  oauth-donation-subscribe"),
        ]);

        let config =
            DonationAlertsConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.client_id, "key");
        assert_eq!(config.redirect_uri, "http://localhost:3000/callback");
        assert_eq!(
            config.scopes,
            vec![
                "oauth-user-show".to_string(),
                "oauth-donation-subscribe".to_string()
            ]
        );
    }

    #[test]
    fn test_from_lookup_missing_secret() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_CLIENT_ID, "key"),
            (ENV_REDIRECT_URI, "/foo"),
        ]);

        let result = DonationAlertsConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        match result {
            Err(IdentityError::Config(message)) => assert!(message.contains(ENV_CLIENT_SECRET)),
            other => panic!("Expected config error, got {:?}", other),
        }
    }
}

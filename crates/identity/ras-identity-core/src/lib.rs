//! Core identity provider traits and types.
//!
//! A concrete OAuth2 provider plugs into a host by implementing [`Provider`]
//! and pairing it with a [`Session`] type that survives the redirect round trip
//! in serialized form.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Invalid token received from provider: {0}")]
    InvalidToken(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode user profile: {0}")]
    Decode(String),

    #[error("An AuthURL has not been set")]
    MissingAuthUrl,

    #[error("Missing authorization code")]
    MissingAuthorizationCode,

    #[error("Callback error: {0}")]
    Callback(String),

    #[error("Invalid session data: {0}")]
    InvalidSession(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Where a session is in the authorization code flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    AuthUrlSet,
    Authorized,
}

/// Tokens issued by a provider's token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Rejects tokens that are unusable the moment they arrive: an empty access
    /// token, or one already past its expiry with nothing to refresh it with.
    pub fn validate(&self, now: DateTime<Utc>) -> IdentityResult<()> {
        if self.access_token.is_empty() {
            return Err(IdentityError::InvalidToken(
                "access token is empty".to_string(),
            ));
        }

        let refreshable = self
            .refresh_token
            .as_deref()
            .is_some_and(|refresh| !refresh.is_empty());

        match self.expires_at {
            Some(expires_at) if expires_at <= now && !refreshable => {
                Err(IdentityError::InvalidToken(format!(
                    "access token expired at {} and no refresh token was issued",
                    expires_at
                )))
            }
            _ => Ok(()),
        }
    }
}

/// A user profile normalized across providers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub provider: String,
    pub user_id: String,
    pub name: String,
    pub nick_name: String,
    pub email: String,
    pub avatar_url: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    /// The profile document exactly as the provider returned it.
    pub raw_data: serde_json::Map<String, serde_json::Value>,
}

/// Query parameters delivered to the OAuth2 redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackParams(HashMap<String, String>);

impl CallbackParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Parses a raw query string such as `code=abc&state=xyz`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self(
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        )
    }
}

impl From<HashMap<String, String>> for CallbackParams {
    fn from(params: HashMap<String, String>) -> Self {
        Self(params)
    }
}

impl<K, V> FromIterator<(K, V)> for CallbackParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Per-attempt authentication state owned by the caller between the begin and
/// callback phases.
#[async_trait]
pub trait Session<P: ?Sized + Sync>: Send + Sync {
    /// The authorization URL produced by [`Provider::begin_auth`].
    fn auth_url(&self) -> IdentityResult<&str>;

    fn marshal(&self) -> IdentityResult<String>;

    fn phase(&self) -> SessionPhase;

    /// Exchanges the callback's authorization code for tokens and stores them
    /// on the session, returning the access token.
    async fn authorize(&mut self, provider: &P, params: &CallbackParams) -> IdentityResult<String>;
}

#[async_trait]
pub trait Provider: Send + Sync {
    type Session: Session<Self>;

    fn name(&self) -> &str;

    /// Renames the provider, for hosts registering several instances of one type.
    fn set_name(&mut self, name: String);

    fn begin_auth(&self, state: &str) -> IdentityResult<Self::Session>;

    fn unmarshal_session(&self, data: &str) -> IdentityResult<Self::Session>;

    async fn fetch_user(&self, session: &Self::Session) -> IdentityResult<User>;

    async fn refresh_token(&self, refresh_token: &str) -> IdentityResult<Token>;

    fn refresh_token_available(&self) -> bool;
}

/// Finishes a login on the callback side: restores the session serialized at
/// begin time, authorizes it and fetches the user.
pub async fn complete_auth<P: Provider>(
    provider: &P,
    serialized_session: &str,
    params: &CallbackParams,
) -> IdentityResult<User> {
    let mut session = provider.unmarshal_session(serialized_session)?;
    session.authorize(provider, params).await?;
    provider.fetch_user(&session).await
}

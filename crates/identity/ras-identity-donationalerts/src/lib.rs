//! DonationAlerts OAuth2 identity provider.
//!
//! Implements the authorization code flow against DonationAlerts: building the
//! authorization URL, exchanging the callback code for tokens, refreshing
//! tokens and fetching the user profile. It plugs into hosts through the
//! ras-identity-core [`Provider`] and [`Session`] traits.

mod client;
mod config;
mod profile;
mod provider;
mod session;
mod types;


pub use client::{AuthClient, default_http_client};
pub use config::DonationAlertsConfig;
pub use profile::ProfileFetcher;
pub use provider::DonationAlertsProvider;
pub use session::DonationAlertsSession;
pub use types::{ProfileData, ProfileResponse, TokenResponse};

// Re-export common types for convenience
pub use ras_identity_core::{
    CallbackParams, IdentityError, IdentityResult, Provider, Session, SessionPhase, Token, User,
};

/// Name the provider registers under unless renamed.
pub const PROVIDER_NAME: &str = "donationalerts";

/// Access to the user profile.
pub const SCOPE_USER_SHOW: &str = "oauth-user-show";
/// Access to the user's donation alerts list.
pub const SCOPE_DONATION_INDEX: &str = "oauth-donation-index";
/// Subscription to new donation alerts.
pub const SCOPE_DONATION_SUBSCRIBE: &str = "oauth-donation-subscribe";

pub const AUTHORIZATION_ENDPOINT: &str = "https://www.donationalerts.com/oauth/authorize";
pub const TOKEN_ENDPOINT: &str = "https://www.donationalerts.com/oauth/token";
pub const PROFILE_ENDPOINT: &str = "https://www.donationalerts.com/api/v1/user/oauth";

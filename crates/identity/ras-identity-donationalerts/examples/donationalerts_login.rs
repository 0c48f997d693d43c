//! Terminal walk-through of a DonationAlerts login.
//!
//! 1. Reads the application credentials from `DONATIONALERTS_*` variables
//! 2. Prints the authorization URL to open in a browser
//! 3. Takes the callback query string pasted back from the redirect
//! 4. Exchanges the code and prints the normalized user
//!
//! Run with `RUST_LOG=debug` to see the provider's tracing output.

use ras_identity_donationalerts::{
    CallbackParams, DonationAlertsConfig, DonationAlertsProvider, Provider, Session,
};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = DonationAlertsConfig::from_env()?.with_http_timeout(15);
    let provider = DonationAlertsProvider::from_config(config)?;

    // The state token is ours to verify when the user comes back
    let state = Uuid::new_v4().to_string();
    let session = provider.begin_auth(&state)?;
    let serialized = session.marshal()?;

    println!("Open this URL in your browser:\n\n  {}\n", session.auth_url()?);
    print!("Paste the query string from the redirect (code=...&state=...): ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let query = line.trim().rsplit('?').next().unwrap_or_default();
    let params = CallbackParams::from_query(query);

    if params.get("state") != Some(state.as_str()) {
        return Err("state mismatch, refusing to continue".into());
    }

    let mut session = provider.unmarshal_session(&serialized)?;
    session.authorize(&provider, &params).await?;

    let user = provider.fetch_user(&session).await?;
    println!("{}", serde_json::to_string_pretty(&user)?);

    if !user.refresh_token.is_empty() {
        let token = provider.refresh_token(&user.refresh_token).await?;
        println!("Refreshed token expires at {:?}", token.expires_at);
    }

    Ok(())
}

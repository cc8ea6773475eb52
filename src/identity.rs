//! Turning an authorization code from the identity provider into a signed-in
//! account, and signing out again.

use std::fs;
use std::path::Path;

use futures::future::BoxFuture;
use log::{debug, warn, Logger};
use serde::Deserialize;
use thiserror::Error;
use warp::http::StatusCode;

use crate::catalog::{Account, Profile};
use crate::db::Db;
use crate::errors::{CatalogError, ProviderError};
use crate::session::Session;

pub mod google;
pub mod mock;

pub use self::google::GoogleProvider;
pub use self::mock::MockProvider;

/// The token endpoint used when the client secrets do not name one.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// What an authorization code is exchanged for.
#[derive(Clone, Debug, PartialEq)]
pub struct Credentials {
    pub access_token: String,

    /// The provider's identifier for the user, taken from the ID token.
    pub subject: String,
}

/// The provider's description of an access token.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct TokenInfo {
    pub error: Option<String>,
    pub user_id: Option<String>,
    pub issued_to: Option<String>,
}

pub trait IdentityProvider {
    /// The client ID this application is registered under.
    fn client_id(&self) -> &str;

    fn exchange_code(&self, code: String) -> BoxFuture<'_, Result<Credentials, ProviderError>>;

    fn token_info(&self, access_token: String) -> BoxFuture<'_, Result<TokenInfo, ProviderError>>;

    fn user_info(&self, access_token: String) -> BoxFuture<'_, Result<Profile, ProviderError>>;

    fn revoke(&self, access_token: String) -> BoxFuture<'_, Result<(), ProviderError>>;
}

/// The `web` section of a `client_secrets.json` file.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_owned()
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    web: ClientSecrets,
}

impl ClientSecrets {
    pub fn from_json(json: &str) -> Result<Self, ProviderError> {
        serde_json::from_str::<ClientSecretsFile>(json)
            .map(|file| file.web)
            .map_err(|e| ProviderError::ClientSecrets(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| ProviderError::ClientSecrets(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&json)
    }
}

/// Why an identity exchange did not sign anyone in. The display strings are
/// sent to the client as they are.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Invalid state parameter.")]
    InvalidState,

    #[error("Missing X-Requested-With header.")]
    MissingRequestedWith,

    #[error("Failed to upgrade the authorization code.")]
    ExchangeRefused,

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    /// The provider reported a problem with the access token.
    #[error("{0}")]
    TokenInfo(String),

    #[error("Token's user ID doesn't match given user ID.")]
    UserMismatch,

    #[error("Token's client ID does not match app's.")]
    ClientMismatch,

    #[error("Failed to retrieve user profile: {0}")]
    Profile(ProviderError),

    #[error("Failed to save account: {0}")]
    Catalog(CatalogError),
}

impl ConnectError {
    pub fn status(&self) -> StatusCode {
        use ConnectError::*;

        match self {
            InvalidState | ExchangeRefused | Unexpected(..) | UserMismatch | ClientMismatch => {
                StatusCode::UNAUTHORIZED
            }
            MissingRequestedWith => StatusCode::FORBIDDEN,
            TokenInfo(..) | Profile(..) | Catalog(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The result of a successful identity exchange.
#[derive(Debug)]
pub enum ConnectOutcome {
    /// The session already belonged to this user; nothing was changed.
    AlreadyConnected,

    /// The user was signed in. `dest` is where they wanted to go before
    /// being sent to the login page.
    Connected {
        account: Account,
        dest: Option<String>,
    },
}

/// Exchanges `code` for a verified account and records it in `session`.
pub async fn connect(
    db: &(dyn Db + Send + Sync),
    provider: &(dyn IdentityProvider + Send + Sync),
    session: &mut Session,
    state: Option<&str>,
    requested_with: Option<&str>,
    code: String,
) -> Result<ConnectOutcome, ConnectError> {
    match (state, session.state.as_deref()) {
        (Some(given), Some(expected)) if given == expected => {}
        _ => return Err(ConnectError::InvalidState),
    }

    if requested_with.map_or(true, str::is_empty) {
        return Err(ConnectError::MissingRequestedWith);
    }

    let credentials = provider
        .exchange_code(code)
        .await
        .map_err(|e| match e {
            ProviderError::ExchangeRefused(..) => ConnectError::ExchangeRefused,
            e => ConnectError::Unexpected(e.to_string()),
        })?;

    let info = provider
        .token_info(credentials.access_token.clone())
        .await
        .map_err(|e| ConnectError::TokenInfo(e.to_string()))?;

    if let Some(error) = info.error {
        return Err(ConnectError::TokenInfo(error));
    }

    if info.user_id.as_deref() != Some(credentials.subject.as_str()) {
        return Err(ConnectError::UserMismatch);
    }

    if info.issued_to.as_deref() != Some(provider.client_id()) {
        return Err(ConnectError::ClientMismatch);
    }

    if session.is_connected_as(&credentials.subject) {
        return Ok(ConnectOutcome::AlreadyConnected);
    }

    let profile = provider
        .user_info(credentials.access_token.clone())
        .await
        .map_err(ConnectError::Profile)?;

    let account = db
        .upsert_account(profile)
        .await
        .map_err(ConnectError::Catalog)?;

    session.account_id = Some(account.id);
    session.subject = Some(credentials.subject);
    session.access_token = Some(credentials.access_token);
    session.flash("Login successful.");

    let dest = session.target_path.take();

    Ok(ConnectOutcome::Connected { account, dest })
}

#[derive(Debug, Error, PartialEq)]
pub enum RevokeError {
    #[error("Current user not connected.")]
    NotConnected,

    #[error("Failed to revoke token for given user.")]
    Failed,
}

impl RevokeError {
    pub fn status(&self) -> StatusCode {
        match self {
            RevokeError::NotConnected => StatusCode::UNAUTHORIZED,
            RevokeError::Failed => StatusCode::BAD_REQUEST,
        }
    }
}

/// Revokes the session's access token with the provider. The session's
/// identity is cleared only when the provider accepts the revocation.
pub async fn revoke(
    logger: &Logger,
    provider: &(dyn IdentityProvider + Send + Sync),
    session: &mut Session,
) -> Result<(), RevokeError> {
    let token = session.access_token.clone().ok_or(RevokeError::NotConnected)?;

    match provider.revoke(token).await {
        Ok(()) => {
            session.clear_identity();
            Ok(())
        }
        Err(e) => {
            warn!(logger, "Token revocation failed"; "error" => %e);
            Err(RevokeError::Failed)
        }
    }
}

/// Signs the user out. Revocation is attempted but its outcome does not
/// keep the user signed in.
pub async fn disconnect(
    logger: &Logger,
    provider: &(dyn IdentityProvider + Send + Sync),
    session: &mut Session,
) {
    if !session.is_signed_in() && session.access_token.is_none() {
        session.flash("You were not logged in.");
        return;
    }

    if session.access_token.is_some() {
        let outcome = revoke(logger, provider, session).await;
        debug!(logger, "Revoked access token"; "outcome" => ?outcome);
    }

    session.clear_identity();
    session.state = None;
    session.flash("You have been successfully logged out.");
}

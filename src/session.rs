//! Per-visitor state, carried by the client in a signed cookie. The server
//! keeps nothing between requests.

use std::sync::Arc;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;
use warp::filters::BoxedFilter;
use warp::Filter;

use crate::catalog::Id;
use crate::errors::CatalogError;

pub const COOKIE_NAME: &str = "otr_session";

/// The most flash messages a session holds; older ones are dropped first.
pub const MAX_FLASHES: usize = 5;

/// What the application remembers about a visitor between requests.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Session {
    /// The signed-in account, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Id>,

    /// The provider's identifier for the signed-in user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// The provider-issued access token, kept for revocation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// The anti-forgery token handed to the login page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Where to send the user after logging in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,

    /// Messages to show on the next rendered page.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flashes: Vec<String>,
}

impl Session {
    pub fn is_signed_in(&self) -> bool {
        self.account_id.is_some()
    }

    pub fn flash(&mut self, message: impl Into<String>) {
        self.flashes.push(message.into());

        if self.flashes.len() > MAX_FLASHES {
            let excess = self.flashes.len() - MAX_FLASHES;
            self.flashes.drain(..excess);
        }
    }

    pub fn take_flashes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.flashes)
    }

    /// Mints a fresh anti-forgery token and remembers it.
    pub fn new_state(&mut self) -> String {
        let state = Uuid::new_v4().simple().to_string().to_uppercase();
        self.state = Some(state.clone());
        state
    }

    /// Whether the session already holds a credential for `subject`.
    pub fn is_connected_as(&self, subject: &str) -> bool {
        self.access_token.is_some() && self.subject.as_deref() == Some(subject)
    }

    pub fn clear_identity(&mut self) {
        self.account_id = None;
        self.subject = None;
        self.access_token = None;
    }
}

#[derive(Deserialize, Serialize)]
struct Claims {
    iat: i64,
    exp: i64,
    #[serde(flatten)]
    session: Session,
}

/// Signs and verifies session cookies.
///
/// Nothing is stored on the server, so a cookie cannot be withdrawn: one
/// copied before the user logged out still decodes, signed in, until its
/// `ttl` runs out. Keep the TTL short where that matters, or rotate the
/// secret to invalidate every cookie at once.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_ref()),
            decoding: DecodingKey::from_secret(secret.as_ref()),
            ttl,
        }
    }

    pub fn encode(&self, session: &Session) -> Result<String, CatalogError> {
        let now = OffsetDateTime::now_utc();

        let claims = Claims {
            iat: now.unix_timestamp(),
            exp: (now + self.ttl).unix_timestamp(),
            session: session.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|source| CatalogError::Session { source })
    }

    /// Returns the session in `token`, or `None` if it is malformed, expired
    /// or was not signed with our secret.
    pub fn decode(&self, token: &str) -> Option<Session> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .ok()
            .map(|data| data.claims.session)
    }

    /// Returns the `set-cookie` value carrying `session`.
    pub fn cookie(&self, session: &Session) -> Result<String, CatalogError> {
        Ok(format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            COOKIE_NAME,
            self.encode(session)?,
            self.ttl.whole_seconds()
        ))
    }
}

/// Extracts the session from the request cookie, starting a fresh one when
/// there is no valid cookie.
pub fn extract(keys: Arc<SessionKeys>) -> BoxedFilter<(Session,)> {
    warp::cookie::optional::<String>(COOKIE_NAME)
        .map(move |raw: Option<String>| {
            raw.and_then(|token| keys.decode(&token))
                .unwrap_or_default()
        })
        .boxed()
}

use thiserror::Error;

use crate::catalog::Id;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Represents an SQL error.
    #[error("SQLx error: {source}")]
    Sqlx { source: sqlx::Error },

    /// A submitted value broke a field rule.
    #[error("{0}")]
    Invalid(#[from] ValidationError),

    #[error("genre {0} does not exist")]
    NoSuchGenre(Id),

    #[error("program {0} does not exist")]
    NoSuchProgram(Id),

    #[error("account {0} does not exist")]
    NoSuchAccount(Id),

    /// Another genre already has this name.
    #[error("genre name already exists in database")]
    GenreExists,

    /// Another program in the same genre already has this name.
    #[error("program name already exists in genre")]
    ProgramExists,

    /// The genre still has programs attached to it.
    #[error("genre still contains programs")]
    GenreNotEmpty,

    /// The session cookie could not be signed.
    #[error("unable to sign session: {source}")]
    Session { source: jsonwebtoken::errors::Error },

    #[error("identity provider error: {0}")]
    Provider(#[from] ProviderError),

    /// A page could not be written out.
    #[error("unable to render page: {0}")]
    Render(#[from] std::fmt::Error),
}

impl From<sqlx::Error> for CatalogError {
    fn from(source: sqlx::Error) -> Self {
        CatalogError::Sqlx { source }
    }
}

/// A field rule broken by a submitted value. The messages are shown to the
/// user as they are.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{0} missing.")]
    Missing(&'static str),

    #[error("{field} must be between {min} and {max} characters in length.")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("{field} must be at most {max} characters in length.")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} must be an integer year between {min} and {max}.")]
    Year {
        field: &'static str,
        min: i32,
        max: i32,
    },

    #[error("yearEnded must be greater than or equal to yearBegan.")]
    YearOrder,
}

/// Errors reported by the identity provider or while talking to it.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider refused to exchange the authorization code.
    #[error("code exchange refused: {0}")]
    ExchangeRefused(String),

    /// The exchange returned no usable ID token.
    #[error("malformed ID token: {source}")]
    MalformedIdToken { source: jsonwebtoken::errors::Error },

    #[error("no ID token in exchange response")]
    MissingIdToken,

    #[error("request to identity provider failed: {source}")]
    Http { source: reqwest::Error },

    /// The provider answered a revocation with something other than success.
    #[error("token revocation failed with status {0}")]
    RevocationFailed(u16),

    #[error("unable to read client secrets: {0}")]
    ClientSecrets(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(source: reqwest::Error) -> Self {
        ProviderError::Http { source }
    }
}

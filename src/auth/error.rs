//! Authentication error types.

use thiserror::Error;

use super::repo::StoreError;

/// Errors raised while registering or logging in a user.
///
/// Client-facing variants carry the exact message returned in the response
/// body; the rest are rendered as a generic server error.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username and password are required")]
    MissingCredentials,

    #[error("Email is required")]
    MissingEmail,

    #[error("Invalid email")]
    InvalidEmail,

    #[error("User already exists")]
    DuplicateUser,

    /// Unknown email and wrong password share this variant.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    /// True for failures caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Store(_) | Self::Hash(_) | Self::Token(_))
    }
}

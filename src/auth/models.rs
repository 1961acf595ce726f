//! Authentication outcomes and request-scoped identity.

use thiserror::Error;

use crate::auth::user::User;
use crate::errors::Error;

/// Why a request failed the session or ownership gates. Rendered to callers
/// only as a uniform `unauthorized` / `forbidden`; the detail is for logs.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingBearer,
    #[error("malformed bearer token")]
    MalformedBearer,
    #[error("invalid session token: {0}")]
    InvalidToken(String),
    #[error("session subject could not be resolved")]
    UnknownSubject,
    #[error("ownership or role requirement not met")]
    Forbidden,
    #[error(transparent)]
    Persistence(#[from] Error),
}

impl AuthError {
    /// Label used for authentication metrics.
    pub fn status_label(&self) -> &'static str {
        match self {
            AuthError::MissingBearer => "missing_bearer",
            AuthError::MalformedBearer => "malformed",
            AuthError::InvalidToken(_) => "invalid_token",
            AuthError::UnknownSubject => "unknown_subject",
            AuthError::Forbidden => "forbidden",
            AuthError::Persistence(_) => "error",
        }
    }
}

/// The authenticated user, inserted into request extensions by the session gate.
#[derive(Debug, Clone)]
pub struct ActingUser(pub User);

impl ActingUser {
    pub fn user(&self) -> &User {
        &self.0
    }
}

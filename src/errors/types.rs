//! # Error Types
//!
//! Error taxonomy for the social feed backend using `thiserror`.
//!
//! Storage failures are classified at the repository boundary: constraint
//! violations become [`Error::Conflict`], elapsed query deadlines become
//! [`Error::Unavailable`], and only unexpected driver failures surface as
//! [`Error::Database`].

use std::fmt;
use std::time::Duration;

/// Custom result type for social feed operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the social feed backend
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Unclassified database errors
    #[error("Database error: {context}")]
    Database {
        #[source]
        source: sqlx::Error,
        context: String,
    },

    /// Malformed input
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Resource absent or logically hidden (e.g. an unverified account)
    #[error("Resource not found: {resource_type} with ID '{id}'")]
    NotFound { resource_type: String, id: String },

    /// Uniqueness or integrity rule rejected the write
    #[error("Resource conflict: {kind}")]
    Conflict { kind: ConflictKind },

    /// Missing, invalid or expired session token
    #[error("Authentication failed: {message}")]
    Unauthenticated { message: String },

    /// Ownership or role check failed
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Admission denied by the rate limiter
    #[error("Rate limit exceeded, retry after {}s", retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// Storage or cache deadline elapsed, or the backend is unreachable
    #[error("Service unavailable: {operation}")]
    Unavailable { operation: String },

    /// Internal server errors
    #[error("Internal server error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Distinguishable conflict conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    DuplicateEmail,
    DuplicateFollow,
    SelfFollow,
}

impl ConflictKind {
    /// Message surfaced to API callers.
    pub fn message(&self) -> &'static str {
        match self {
            ConflictKind::DuplicateEmail => "the email already exists",
            ConflictKind::DuplicateFollow => "you already follow this user",
            ConflictKind::SelfFollow => "you cannot follow yourself",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictKind::DuplicateEmail => write!(f, "duplicate_email"),
            ConflictKind::DuplicateFollow => write!(f, "duplicate_follow"),
            ConflictKind::SelfFollow => write!(f, "self_follow"),
        }
    }
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: Into<String>>(resource_type: R, id: I) -> Self {
        Self::NotFound { resource_type: resource_type.into(), id: id.into() }
    }

    pub fn conflict(kind: ConflictKind) -> Self {
        Self::Conflict { kind }
    }

    pub fn unauthenticated<S: Into<String>>(message: S) -> Self {
        Self::Unauthenticated { message: message.into() }
    }

    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn rate_limited(retry_after: Duration) -> Self {
        Self::RateLimited { retry_after }
    }

    pub fn unavailable<S: Into<String>>(operation: S) -> Self {
        Self::Unavailable { operation: operation.into() }
    }

    /// Create an internal server error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Create an internal server error with its cause attached
    pub fn internal_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(source) }
    }

    /// Wrap a driver error with the operation that produced it
    pub fn database<S: Into<String>>(source: sqlx::Error, context: S) -> Self {
        Self::Database { source, context: context.into() }
    }

    /// Get the HTTP status code that should be returned for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 500,
            Error::Database { .. } => 500,
            Error::Validation { .. } => 400,
            Error::NotFound { .. } => 404,
            Error::Conflict { .. } => 409,
            Error::Unauthenticated { .. } => 401,
            Error::Forbidden { .. } => 403,
            Error::RateLimited { .. } => 429,
            Error::Unavailable { .. } => 503,
            Error::Internal { .. } => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        Self::Database { source: error, context: "Database operation failed".to_string() }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let first_field = fields.first().map(|(field, _)| field.to_string());
        let message = fields
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::Validation { message, field: first_field }
    }
}

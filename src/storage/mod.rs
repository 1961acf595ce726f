//! # Storage and Persistence
//!
//! PostgreSQL connectivity, schema migrations and the repositories behind
//! users, roles, follows, posts and comments.
//!
//! Every statement runs under a deadline (5 seconds unless configured
//! otherwise). An elapsed deadline is reported as
//! [`Error::Unavailable`] and never retried here.

pub mod migrations;
pub mod pool;
pub mod repositories;

use std::future::Future;
use std::time::Duration;

use tracing::{warn, Instrument};

pub use crate::config::DatabaseConfig;
pub use migrations::{get_migration_version, run_migrations};
pub use pool::{create_pool, DbPool};
pub use repositories::{
    CommentRepository, FollowRepository, PostRepository, RoleRepository, SqlxCommentRepository,
    SqlxFollowRepository, SqlxPostRepository, SqlxRoleRepository, SqlxUserRepository,
    UserRepository,
};

use crate::errors::{ConflictKind, Error, Result};

/// Default per-statement deadline.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a storage future under `limit`, classifying its failure.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &'static str, future: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, future).instrument(crate::db_span!(operation)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(classify(err, operation)),
        Err(_) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "Storage operation timed out");
            Err(Error::unavailable(operation))
        }
    }
}

/// Translate constraint violations into domain errors at the store boundary.
pub(crate) fn classify(err: sqlx::Error, operation: &'static str) -> Error {
    if let Some(db_err) = err.as_database_error() {
        let code = db_err.code();
        match (code.as_deref(), db_err.constraint()) {
            (Some("23505"), Some("users_email_key")) => {
                return Error::conflict(ConflictKind::DuplicateEmail)
            }
            (Some("23505"), Some("followers_pkey")) => {
                return Error::conflict(ConflictKind::DuplicateFollow)
            }
            (Some("23514"), Some("chk_user_not_self_follow")) => {
                return Error::conflict(ConflictKind::SelfFollow)
            }
            (Some("23503"), Some("followers_followed_id_fkey")) => {
                return Error::not_found("user", "followed")
            }
            _ => {}
        }
    }

    if matches!(err, sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)) {
        warn!(operation, error = %err, "Storage backend unreachable");
        return Error::unavailable(operation);
    }

    Error::database(err, format!("{} failed", operation))
}

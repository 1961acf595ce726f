//! Per-request access control: session validation, cache-aside identity
//! resolution and the ownership/role gate.
//!
//! The rate gate runs ahead of this in [`crate::api::rate_limit`]. Every
//! failure here collapses to one of two outcomes for the caller:
//! unauthenticated (sessions, identity) or forbidden (ownership, role).

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::auth::jwt::Authenticator;
use crate::auth::models::AuthError;
use crate::auth::user::User;
use crate::cache::UserCache;
use crate::domain::UserId;
use crate::errors::Result;
use crate::observability::metrics;
use crate::storage::{RoleRepository, UserRepository};

/// Default freshness window for cached user snapshots.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AccessPipeline {
    authenticator: Arc<Authenticator>,
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    cache: Option<Arc<dyn UserCache>>,
    cache_ttl: Duration,
}

impl AccessPipeline {
    pub fn new(
        authenticator: Arc<Authenticator>,
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
    ) -> Self {
        Self { authenticator, users, roles, cache: None, cache_ttl: DEFAULT_CACHE_TTL }
    }

    /// Put `cache` in front of user lookups.
    pub fn with_cache(mut self, cache: Arc<dyn UserCache>, ttl: Duration) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Session gate plus identity resolution for a raw `Authorization` value.
    pub async fn authenticate(&self, header: Option<&str>) -> std::result::Result<User, AuthError> {
        let outcome = self.authenticate_inner(header).await;
        metrics::record_authentication(match &outcome {
            Ok(_) => "success",
            Err(err) => err.status_label(),
        });
        outcome
    }

    async fn authenticate_inner(&self, header: Option<&str>) -> std::result::Result<User, AuthError> {
        let token = bearer_token(header)?;
        let claims = self
            .authenticator
            .validate(token)
            .map_err(|err| AuthError::InvalidToken(err.to_string()))?;

        let user = self.resolve_user(claims.sub).await.map_err(|err| {
            debug!(user_id = %claims.sub, error = %err, "session subject lookup failed");
            AuthError::UnknownSubject
        })?;

        if !user.is_verified() {
            return Err(AuthError::UnknownSubject);
        }

        Ok(user)
    }

    /// Cache-aside lookup. A cache backend failure degrades to the store; a
    /// failed cache fill is logged and ignored.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn resolve_user(&self, id: UserId) -> Result<User> {
        let Some(cache) = &self.cache else {
            return self.users.get_by_id(id).await;
        };

        match cache.get(id).await {
            Ok(Some(user)) => {
                metrics::record_cache_lookup("hit");
                return Ok(user);
            }
            Ok(None) => metrics::record_cache_lookup("miss"),
            Err(err) => {
                metrics::record_cache_lookup("error");
                warn!(error = %err, "user cache unavailable, reading from store");
            }
        }

        let user = self.users.get_by_id(id).await?;

        if let Err(err) = cache.put(&user, self.cache_ttl).await {
            warn!(error = %err, "failed to populate user cache");
        }

        Ok(user)
    }

    /// Ownership/role gate: the actor must own the resource and hold a role
    /// at least as privileged as `required_role`.
    #[instrument(skip(self, actor), fields(user_id = %actor.id, owner_id = %owner_id))]
    pub async fn authorize_owner(
        &self,
        actor: &User,
        owner_id: UserId,
        required_role: &str,
    ) -> std::result::Result<(), AuthError> {
        if actor.id != owner_id {
            debug!("actor does not own the resource");
            return Err(AuthError::Forbidden);
        }

        let required = self.roles.get_by_name(required_role).await?;
        if !actor.role.satisfies(&required) {
            debug!(
                actor_level = %actor.role.level,
                required_level = %required.level,
                "role precedence check failed"
            );
            return Err(AuthError::Forbidden);
        }

        Ok(())
    }
}

/// Extract the token from `Bearer <token>`. Exactly two space-separated parts.
pub fn bearer_token(header: Option<&str>) -> std::result::Result<&str, AuthError> {
    let header = header.map(str::trim).filter(|h| !h.is_empty()).ok_or(AuthError::MissingBearer)?;

    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::MalformedBearer),
    }
}

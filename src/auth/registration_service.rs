//! Account registration and email-verification.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};
use validator::Validate;

use crate::auth::{hashing, token_codec, NewUser, RegisterUserRequest, Role, User};
use crate::domain::UserId;
use crate::errors::{Error, Result};
use crate::storage::{DbPool, SqlxUserRepository, UserRepository};

/// A freshly registered, still unverified account and the plaintext
/// invitation token for it. The token is never persisted in this form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub token: String,
}

#[derive(Clone)]
pub struct RegistrationService {
    users: Arc<dyn UserRepository>,
    invitation_ttl: Duration,
}

impl RegistrationService {
    pub fn new(users: Arc<dyn UserRepository>, invitation_ttl: Duration) -> Self {
        Self { users, invitation_ttl }
    }

    pub fn with_sqlx(pool: DbPool, query_timeout: Duration, invitation_ttl: Duration) -> Self {
        Self::new(
            Arc::new(SqlxUserRepository::new(pool).with_query_timeout(query_timeout)),
            invitation_ttl,
        )
    }

    /// Create an unverified account with the default role and issue its
    /// invitation. A taken email surfaces as a duplicate-email conflict.
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterUserRequest) -> Result<Registration> {
        request.validate()?;

        let password_hash = hashing::hash_password(&request.password)?;
        let token = token_codec::generate_plaintext();

        let user = self
            .users
            .create_and_invite(
                NewUser {
                    email: User::normalize_email(&request.email),
                    password_hash,
                    role_name: Role::USER.to_string(),
                },
                &token,
                self.invitation_ttl,
            )
            .await?;

        info!(user_id = %user.id, "registration accepted, invitation issued");
        Ok(Registration { user, token })
    }

    /// Consume an invitation token. Unknown, expired and already-used tokens
    /// are indistinguishable to the caller.
    #[instrument(skip(self, token))]
    pub async fn activate(&self, token: &str) -> Result<UserId> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::not_found("invitation", "token"));
        }

        let user_id = self.users.activate(token).await?;
        info!(user_id = %user_id, "account activated");
        Ok(user_id)
    }
}

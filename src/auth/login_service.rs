//! Login service for email/password authentication.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use tracing::{info, instrument, warn};
use validator::Validate;

use crate::auth::jwt::Authenticator;
use crate::auth::{hashing, LoginRequest, User};
use crate::errors::{Error, Result};
use crate::storage::{DbPool, SqlxUserRepository, UserRepository};

const INVALID_CREDENTIALS: &str = "incorrect email or password";

/// Verified against when the email is unknown so both failure paths pay for
/// one Argon2 verification.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    hashing::hash_password("dummy_startup_value")
        .unwrap_or_else(|_| "$argon2id$v=19$m=768,t=1,p=1$dW5rbm93bg$dW5rbm93bg".to_string())
});

/// A signed session and the user it was issued to.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

#[derive(Clone)]
pub struct LoginService {
    users: Arc<dyn UserRepository>,
    authenticator: Arc<Authenticator>,
}

impl LoginService {
    pub fn new(users: Arc<dyn UserRepository>, authenticator: Arc<Authenticator>) -> Self {
        Self { users, authenticator }
    }

    pub fn with_sqlx(pool: DbPool, query_timeout: Duration, authenticator: Arc<Authenticator>) -> Self {
        Self::new(
            Arc::new(SqlxUserRepository::new(pool).with_query_timeout(query_timeout)),
            authenticator,
        )
    }

    /// Exchange credentials of a verified account for a session token.
    ///
    /// Unknown emails, unverified accounts and wrong passwords all fail
    /// with the same validation error.
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: LoginRequest) -> Result<Session> {
        request.validate()?;

        let credentials = match self.users.get_by_email(&request.email).await {
            Ok(credentials) => credentials,
            Err(err) if err.is_not_found() => {
                if let Err(e) = hashing::verify_password(&request.password, &DUMMY_HASH) {
                    warn!(error = %e, "dummy hash verification failed unexpectedly");
                }
                warn!("login attempt for unknown or unverified account");
                return Err(Error::validation(INVALID_CREDENTIALS));
            }
            Err(err) => return Err(err),
        };

        if !hashing::verify_password(&request.password, &credentials.password_hash)? {
            warn!(user_id = %credentials.user.id, "login attempt with incorrect password");
            return Err(Error::validation(INVALID_CREDENTIALS));
        }

        let claims = self.authenticator.claims_for(credentials.user.id);
        let token = self.authenticator.issue(&claims)?;

        info!(user_id = %credentials.user.id, "user logged in");
        Ok(Session { token, user: credentials.user })
    }
}

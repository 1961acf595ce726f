//! User repository: registration with invitation, activation and lookups.
//!
//! Registration and activation are the two multi-statement workflows. Each
//! runs inside one transaction, so a user row never exists without its
//! invitation and an invitation is never consumed without the verification
//! it authorises.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::{info, instrument};

use crate::auth::token_codec;
use crate::auth::{NewUser, Role, RoleLevel, User, UserCredentials};
use crate::domain::{RoleId, UserId};
use crate::errors::{Error, Result};
use crate::storage::{bounded, DbPool, DEFAULT_QUERY_TIMEOUT};

const USER_COLUMNS: &str = r#"
    u.id, u.email, u.password_hash, u.email_verified_at, u.created_at, u.updated_at,
    r.id AS role_id, r.name AS role_name, r.level AS role_level, r.description AS role_description
"#;

#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    password_hash: String,
    email_verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    role_id: RoleId,
    role_name: String,
    role_level: i32,
    role_description: Option<String>,
}

impl From<UserRow> for UserCredentials {
    fn from(row: UserRow) -> Self {
        let user = User {
            id: row.id,
            email: row.email,
            email_verified_at: row.email_verified_at,
            role: Role {
                id: row.role_id,
                name: row.role_name,
                level: RoleLevel(row.role_level),
                description: row.role_description,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        UserCredentials { user, password_hash: row.password_hash }
    }
}

#[derive(Debug, Clone, FromRow)]
struct RoleRow {
    id: RoleId,
    name: String,
    level: i32,
    description: Option<String>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role { id: row.id, name: row.name, level: RoleLevel(row.level), description: row.description }
    }
}

#[derive(Debug, Clone, FromRow)]
struct InsertedUserRow {
    id: UserId,
    email: String,
    email_verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user (role resolved by name) and its invitation atomically.
    async fn create_and_invite(
        &self,
        user: NewUser,
        plaintext_token: &str,
        invitation_ttl: Duration,
    ) -> Result<User>;

    /// Consume a live invitation and mark its owner verified.
    async fn activate(&self, plaintext_token: &str) -> Result<UserId>;

    /// Verified accounts only; unverified and absent accounts are both `NotFound`.
    async fn get_by_email(&self, email: &str) -> Result<UserCredentials>;

    async fn get_by_id(&self, id: UserId) -> Result<User>;
}

#[derive(Debug, Clone)]
pub struct SqlxUserRepository {
    pool: DbPool,
    query_timeout: Duration,
}

impl SqlxUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, query_timeout: DEFAULT_QUERY_TIMEOUT }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    #[instrument(skip(self, user, plaintext_token), fields(role = %user.role_name))]
    async fn create_and_invite(
        &self,
        user: NewUser,
        plaintext_token: &str,
        invitation_ttl: Duration,
    ) -> Result<User> {
        let limit = self.query_timeout;
        let email = User::normalize_email(&user.email);
        let token_hash = token_codec::fingerprint(plaintext_token);

        let mut tx = bounded(limit, "users.begin", self.pool.begin()).await?;

        let role: Role = bounded(
            limit,
            "roles.get_by_name",
            sqlx::query_as::<_, RoleRow>(
                "SELECT id, name, level, description FROM roles WHERE name = $1",
            )
            .bind(&user.role_name)
            .fetch_optional(&mut *tx),
        )
        .await?
        .map(Role::from)
        .ok_or_else(|| Error::not_found("role", user.role_name.clone()))?;

        let row = bounded(
            limit,
            "users.insert",
            sqlx::query_as::<_, InsertedUserRow>(
                r#"
                INSERT INTO users (email, password_hash, role_id)
                VALUES (LOWER($1), $2, $3)
                RETURNING id, email, email_verified_at, created_at, updated_at
                "#,
            )
            .bind(&email)
            .bind(&user.password_hash)
            .bind(role.id)
            .fetch_one(&mut *tx),
        )
        .await?;

        bounded(
            limit,
            "invitations.insert",
            sqlx::query(
                r#"
                INSERT INTO invitations (token_hash, user_id, expires_at)
                VALUES ($1, $2, NOW() + make_interval(secs => $3))
                "#,
            )
            .bind(&token_hash)
            .bind(row.id)
            .bind(invitation_ttl.as_secs_f64())
            .execute(&mut *tx),
        )
        .await?;

        bounded(limit, "users.commit", tx.commit()).await?;

        info!(user_id = %row.id, "User registered with pending invitation");

        Ok(User {
            id: row.id,
            email: row.email,
            email_verified_at: row.email_verified_at,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    #[instrument(skip(self, plaintext_token))]
    async fn activate(&self, plaintext_token: &str) -> Result<UserId> {
        let limit = self.query_timeout;
        let token_hash = token_codec::fingerprint(plaintext_token);

        let mut tx = bounded(limit, "users.begin", self.pool.begin()).await?;

        // Deleting first takes the row lock: a concurrent activation of the
        // same token blocks here and then sees zero rows.
        let user_id = bounded(
            limit,
            "invitations.consume",
            sqlx::query_scalar::<_, UserId>(
                r#"
                DELETE FROM invitations
                WHERE token_hash = $1 AND expires_at > NOW()
                RETURNING user_id
                "#,
            )
            .bind(&token_hash)
            .fetch_optional(&mut *tx),
        )
        .await?
        .ok_or_else(|| Error::not_found("invitation", "token"))?;

        bounded(
            limit,
            "users.verify",
            sqlx::query(
                "UPDATE users SET email_verified_at = NOW(), updated_at = NOW() WHERE id = $1",
            )
            .bind(user_id)
            .execute(&mut *tx),
        )
        .await?;

        bounded(
            limit,
            "invitations.delete_by_user",
            sqlx::query("DELETE FROM invitations WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx),
        )
        .await?;

        bounded(limit, "users.commit", tx.commit()).await?;

        info!(user_id = %user_id, "User email verified");
        Ok(user_id)
    }

    #[instrument(skip(self, email))]
    async fn get_by_email(&self, email: &str) -> Result<UserCredentials> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users u JOIN roles r ON r.id = u.role_id \
             WHERE u.email = LOWER($1) AND u.email_verified_at IS NOT NULL"
        );

        bounded(
            self.query_timeout,
            "users.get_by_email",
            sqlx::query_as::<_, UserRow>(&query)
                .bind(User::normalize_email(email))
                .fetch_optional(&self.pool),
        )
        .await?
        .map(UserCredentials::from)
        .ok_or_else(|| Error::not_found("user", "email"))
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn get_by_id(&self, id: UserId) -> Result<User> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users u JOIN roles r ON r.id = u.role_id WHERE u.id = $1"
        );

        bounded(
            self.query_timeout,
            "users.get_by_id",
            sqlx::query_as::<_, UserRow>(&query).bind(id).fetch_optional(&self.pool),
        )
        .await?
        .map(|row| UserCredentials::from(row).user)
        .ok_or_else(|| Error::not_found("user", id.to_string()))
    }
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn get_by_name(&self, name: &str) -> Result<Role>;
}

#[derive(Debug, Clone)]
pub struct SqlxRoleRepository {
    pool: DbPool,
    query_timeout: Duration,
}

impl SqlxRoleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, query_timeout: DEFAULT_QUERY_TIMEOUT }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }
}

#[async_trait]
impl RoleRepository for SqlxRoleRepository {
    #[instrument(skip(self))]
    async fn get_by_name(&self, name: &str) -> Result<Role> {
        bounded(
            self.query_timeout,
            "roles.get_by_name",
            sqlx::query_as::<_, RoleRow>(
                "SELECT id, name, level, description FROM roles WHERE name = $1",
            )
            .bind(name)
            .fetch_optional(&self.pool),
        )
        .await?
        .map(Role::from)
        .ok_or_else(|| Error::not_found("role", name))
    }
}

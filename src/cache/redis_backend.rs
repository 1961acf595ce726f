use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::{debug, instrument};

use super::{user_key, UserCache};
use crate::auth::User;
use crate::domain::UserId;
use crate::errors::{Error, Result};

/// Redis-backed cache storing JSON snapshots with `SET .. EX`.
#[derive(Clone)]
pub struct RedisUserCache {
    connection: ConnectionManager,
    op_timeout: Duration,
}

impl RedisUserCache {
    pub fn new(connection: ConnectionManager, op_timeout: Duration) -> Self {
        Self { connection, op_timeout }
    }

    pub async fn connect(redis_url: &str, op_timeout: Duration) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| Error::config(format!("Invalid Redis URL: {}", e)))?;
        let connection = tokio::time::timeout(op_timeout, client.get_connection_manager())
            .await
            .map_err(|_| Error::unavailable("cache.connect"))?
            .map_err(|e| Error::internal_with_source("failed to connect to Redis", Box::new(e)))?;

        debug!("Redis user cache connected");
        Ok(Self::new(connection, op_timeout))
    }
}

/// JSON snapshot stored under [`user_key`].
pub(crate) fn encode_entry(user: &User) -> Result<String> {
    serde_json::to_string(user)
        .map_err(|e| Error::internal_with_source("failed to encode user", Box::new(e)))
}

/// A value that does not decode is an error, never a miss.
pub(crate) fn decode_entry(raw: &str) -> Result<User> {
    serde_json::from_str(raw)
        .map_err(|e| Error::internal_with_source("corrupt cached user entry", Box::new(e)))
}

#[async_trait]
impl UserCache for RedisUserCache {
    #[instrument(skip(self), fields(user_id = %id))]
    async fn get(&self, id: UserId) -> Result<Option<User>> {
        let mut connection = self.connection.clone();
        let raw: Option<String> =
            tokio::time::timeout(self.op_timeout, connection.get(user_key(id)))
                .await
                .map_err(|_| Error::unavailable("cache.get"))?
                .map_err(|_| Error::unavailable("cache.get"))?;

        raw.as_deref().map(decode_entry).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn put(&self, user: &User, ttl: Duration) -> Result<()> {
        let json = encode_entry(user)?;
        let mut connection = self.connection.clone();

        tokio::time::timeout(
            self.op_timeout,
            connection.set_ex::<_, _, ()>(user_key(user.id), json, ttl.as_secs().max(1)),
        )
        .await
        .map_err(|_| Error::unavailable("cache.put"))?
        .map_err(|_| Error::unavailable("cache.put"))
    }
}

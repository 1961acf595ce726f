//! Follow edges between users.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::domain::UserId;
use crate::errors::Result;
use crate::storage::{bounded, DbPool, DEFAULT_QUERY_TIMEOUT};

#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Record that `follower_id` follows `followed_id`. Self follow and
    /// duplicate edges are rejected with their own conflict kinds.
    async fn follow(&self, followed_id: UserId, follower_id: UserId) -> Result<()>;

    /// Remove the edge if present.
    async fn unfollow(&self, followed_id: UserId, follower_id: UserId) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct SqlxFollowRepository {
    pool: DbPool,
    query_timeout: Duration,
}

impl SqlxFollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, query_timeout: DEFAULT_QUERY_TIMEOUT }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }
}

#[async_trait]
impl FollowRepository for SqlxFollowRepository {
    #[instrument(skip(self), fields(followed_id = %followed_id, follower_id = %follower_id))]
    async fn follow(&self, followed_id: UserId, follower_id: UserId) -> Result<()> {
        bounded(
            self.query_timeout,
            "followers.insert",
            sqlx::query("INSERT INTO followers (followed_id, follower_id) VALUES ($1, $2)")
                .bind(followed_id)
                .bind(follower_id)
                .execute(&self.pool),
        )
        .await?;

        info!("Follow edge created");
        Ok(())
    }

    #[instrument(skip(self), fields(followed_id = %followed_id, follower_id = %follower_id))]
    async fn unfollow(&self, followed_id: UserId, follower_id: UserId) -> Result<()> {
        let result = bounded(
            self.query_timeout,
            "followers.delete",
            sqlx::query("DELETE FROM followers WHERE followed_id = $1 AND follower_id = $2")
                .bind(followed_id)
                .bind(follower_id)
                .execute(&self.pool),
        )
        .await?;

        info!(removed = result.rows_affected(), "Follow edge removed");
        Ok(())
    }
}

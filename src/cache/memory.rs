use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::UserCache;
use crate::auth::User;
use crate::domain::UserId;
use crate::errors::Result;

/// Process-local cache for single-node deployments and tests.
#[derive(Debug, Default)]
pub struct InMemoryUserCache {
    entries: DashMap<UserId, (User, Instant)>,
}

impl InMemoryUserCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl UserCache for InMemoryUserCache {
    async fn get(&self, id: UserId) -> Result<Option<User>> {
        let now = Instant::now();
        let expired = match self.entries.get(&id) {
            Some(entry) if entry.1 > now => return Ok(Some(entry.0.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove_if(&id, |_, (_, expires_at)| *expires_at <= now);
        }
        Ok(None)
    }

    async fn put(&self, user: &User, ttl: Duration) -> Result<()> {
        self.entries.insert(user.id, (user.clone(), Instant::now() + ttl));
        Ok(())
    }
}

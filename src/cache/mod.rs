//! # User Cache
//!
//! Read-through cache in front of user lookups on the authenticated path.
//!
//! A miss is `Ok(None)`, never an error. Backend failures surface as
//! [`Error::Unavailable`](crate::errors::Error::Unavailable) so the caller can
//! tell "not cached yet" apart from "cache is down" and fall back to storage.
//! Entries are not invalidated on writes; staleness is bounded by the TTL.

mod memory;
mod redis_backend;

pub use self::memory::InMemoryUserCache;
pub use self::redis_backend::RedisUserCache;

#[cfg(test)]
pub(crate) use self::redis_backend::{decode_entry, encode_entry};

use std::time::Duration;

use async_trait::async_trait;

use crate::auth::User;
use crate::domain::UserId;
use crate::errors::Result;

#[async_trait]
pub trait UserCache: Send + Sync {
    async fn get(&self, id: UserId) -> Result<Option<User>>;

    async fn put(&self, user: &User, ttl: Duration) -> Result<()>;
}

/// Key under which a user snapshot is stored.
pub fn user_key(id: UserId) -> String {
    format!("user-{}", id)
}

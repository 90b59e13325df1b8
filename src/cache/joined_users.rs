//! First-contact tracking for chat ids
//!
//! `mark_joined` is an atomic insert-if-absent on every backend, so two concurrent
//! `/start` updates for the same chat can never both see themselves as first.

use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

use super::error::CacheResult;

#[async_trait]
pub trait JoinedUserStore: Send + Sync {
    /// Record the chat as joined. Returns `true` only for the call that added it.
    async fn mark_joined(&self, chat_id: i64) -> CacheResult<bool>;

    async fn is_joined(&self, chat_id: i64) -> CacheResult<bool>;

    /// Reachability check for health checks
    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str;
}

/// Process-local store. Lost on restart and never evicted.
#[derive(Debug, Default)]
pub struct InMemoryJoinedUsers {
    joined: RwLock<HashSet<i64>>,
}

impl InMemoryJoinedUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.joined.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.joined.read().await.is_empty()
    }
}

#[async_trait]
impl JoinedUserStore for InMemoryJoinedUsers {
    async fn mark_joined(&self, chat_id: i64) -> CacheResult<bool> {
        Ok(self.joined.write().await.insert(chat_id))
    }

    async fn is_joined(&self, chat_id: i64) -> CacheResult<bool> {
        Ok(self.joined.read().await.contains(&chat_id))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(feature = "cache")]
pub use redis_store::RedisJoinedUsers;

#[cfg(feature = "cache")]
mod redis_store {
    use super::*;
    use crate::cache::error::CacheError;
    use crate::cache::keys::telegram::JoinedUsersKey;
    use crate::cache::RedisPool;
    use redis::AsyncCommands;

    /// Redis set shared by every process behind the same Redis
    #[derive(Clone)]
    pub struct RedisJoinedUsers {
        pool: RedisPool,
        key: String,
    }

    impl RedisJoinedUsers {
        pub fn new(pool: RedisPool) -> Self {
            Self {
                pool,
                key: JoinedUsersKey.to_string(),
            }
        }
    }

    #[async_trait]
    impl JoinedUserStore for RedisJoinedUsers {
        async fn mark_joined(&self, chat_id: i64) -> CacheResult<bool> {
            let mut conn = self.pool.get().await.map_err(CacheError::from)?;
            // SADD reports how many members were new, which makes check-and-set one step
            let added: i64 = conn.sadd(&self.key, chat_id).await?;
            Ok(added == 1)
        }

        async fn is_joined(&self, chat_id: i64) -> CacheResult<bool> {
            let mut conn = self.pool.get().await.map_err(CacheError::from)?;
            let member: bool = conn.sismember(&self.key, chat_id).await?;
            Ok(member)
        }

        async fn ping(&self) -> CacheResult<()> {
            crate::cache::health_check(&self.pool).await
        }

        fn backend_name(&self) -> &'static str {
            "redis"
        }
    }
}

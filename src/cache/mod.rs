//! Joined-user tracking and the optional Redis pool behind it
//!
//! Without the `cache` feature only the in-process store in [`joined_users`]
//! exists.

pub mod error;
pub mod joined_users;
pub mod keys;

pub use error::{CacheError, CacheResult};
pub use joined_users::{InMemoryJoinedUsers, JoinedUserStore};

#[cfg(feature = "cache")]
pub use joined_users::RedisJoinedUsers;
#[cfg(feature = "cache")]
pub use redis_pool::{health_check, init_cache_pool, CacheConfig, RedisPool};

#[cfg(feature = "cache")]
mod redis_pool {
    use bb8::Pool;
    use bb8_redis::RedisConnectionManager;
    use std::time::Duration;
    use tracing::{error, info, warn};

    use super::CacheError;

    pub type RedisPool = Pool<RedisConnectionManager>;

    #[derive(Debug, Clone)]
    pub struct CacheConfig {
        pub redis_url: String,
        pub max_connections: u32,
        pub min_idle: u32,
        pub connection_timeout: Duration,
        pub idle_timeout: Duration,
    }

    impl CacheConfig {
        pub fn for_url(redis_url: impl Into<String>) -> Self {
            Self {
                redis_url: redis_url.into(),
                ..Self::default()
            }
        }
    }

    impl Default for CacheConfig {
        fn default() -> Self {
            Self {
                redis_url: "redis://127.0.0.1:6379".to_string(),
                max_connections: 10,
                min_idle: 1,
                connection_timeout: Duration::from_secs(5),
                idle_timeout: Duration::from_secs(60),
            }
        }
    }

    /// Build the pool. An unreachable server at startup is logged, not fatal:
    /// the relay already degrades to echo replies while Redis is down.
    pub async fn init_cache_pool(config: CacheConfig) -> Result<RedisPool, CacheError> {
        info!(max_connections = config.max_connections, "Building Redis pool");

        let manager = RedisConnectionManager::new(config.redis_url.as_str()).map_err(|e| {
            error!(error = %e, "Invalid Redis URL");
            CacheError::ConnectionError(e.to_string())
        })?;

        let pool = Pool::builder()
            .max_size(config.max_connections)
            .min_idle(config.min_idle)
            .connection_timeout(config.connection_timeout)
            .idle_timeout(config.idle_timeout)
            .build(manager)
            .await
            .map_err(|e| CacheError::ConnectionError(e.to_string()))?;

        if let Err(e) = health_check(&pool).await {
            warn!(error = %e, "Redis not reachable yet, continuing");
        }

        Ok(pool)
    }

    pub async fn health_check(pool: &RedisPool) -> Result<(), CacheError> {
        let mut conn = pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(())
    }
}

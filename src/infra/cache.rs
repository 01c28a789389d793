//! Redis cache implementation.
//!
//! Provides the shared key/value layer used for rate limiting, token
//! revocation, distributed locks and short-lived dashboard caching.
//! Services depend on the [`CacheStore`] trait; [`Cache`] is the Redis
//! implementation.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

use crate::config::{
    Config, CACHE_PREFIX_DASHBOARD, CACHE_PREFIX_LOCK, CACHE_PREFIX_RATE_LIMIT,
    CACHE_PREFIX_REVOKED_TOKEN, DEFAULT_LOCK_RETRIES, DEFAULT_LOCK_RETRY_DELAY_MS,
    DEFAULT_LOCK_TTL_SECONDS,
};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Cache operations needed by services and middleware.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;

    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Increment a windowed counter, returning the new count.
    ///
    /// The window starts with the first increment.
    async fn increment(&self, key: &str, window_seconds: u64) -> AppResult<u64>;

    /// Acquire the lock on `resource`, retrying a bounded number of times.
    /// Returns the owner id needed to release it.
    async fn acquire_lock(&self, resource: &str) -> AppResult<String>;

    /// Release a lock if still owned by `lock_id`.
    async fn release_lock(&self, resource: &str, lock_id: &str) -> AppResult<bool>;

    async fn ping(&self) -> AppResult<()>;
}

/// Redis cache wrapper with connection pooling.
#[derive(Clone)]
pub struct Cache {
    connection: ConnectionManager,
}

impl Cache {
    /// Connect to Redis.
    pub async fn connect(config: &Config) -> Result<Self, RedisError> {
        let client = Client::open(config.redis_url.as_str())?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis cache connected");
        Ok(Self { connection })
    }

    /// Get the connection manager for direct Redis operations.
    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }

    async fn try_lock(&self, key: &str, lock_id: &str, ttl_seconds: u64) -> bool {
        let mut conn = self.connection.clone();
        // SET NX EX: only the first caller gets the key
        redis::cmd("SET")
            .arg(key)
            .arg(lock_id)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map(|r: Option<String>| r.is_some())
            .unwrap_or(false)
    }
}

#[async_trait]
impl CacheStore for Cache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection.clone();
        conn.get(key).await.map_err(cache_error)
    }

    async fn set(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(cache_error)
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(key).await.map_err(cache_error)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let mut conn = self.connection.clone();
        conn.exists(key).await.map_err(cache_error)
    }

    async fn increment(&self, key: &str, window_seconds: u64) -> AppResult<u64> {
        let mut conn = self.connection.clone();
        let count: i64 = conn.incr(key, 1).await.map_err(cache_error)?;
        if count == 1 {
            let _: () = conn
                .expire(key, window_seconds as i64)
                .await
                .map_err(cache_error)?;
        }
        Ok(count.max(0) as u64)
    }

    async fn acquire_lock(&self, resource: &str) -> AppResult<String> {
        let key = lock_key(resource);
        let lock_id = Uuid::new_v4().to_string();

        for attempt in 0..=DEFAULT_LOCK_RETRIES {
            if self.try_lock(&key, &lock_id, DEFAULT_LOCK_TTL_SECONDS).await {
                tracing::debug!(resource = %resource, lock_id = %lock_id, "Lock acquired");
                return Ok(lock_id);
            }
            if attempt < DEFAULT_LOCK_RETRIES {
                sleep(Duration::from_millis(DEFAULT_LOCK_RETRY_DELAY_MS)).await;
            }
        }

        tracing::warn!(resource = %resource, "Failed to acquire lock after retries");
        Err(AppError::business(
            "Another operation on this record is in progress, please retry",
        ))
    }

    async fn release_lock(&self, resource: &str, lock_id: &str) -> AppResult<bool> {
        let mut conn = self.connection.clone();

        // Only delete if the lock_id matches (we own the lock)
        let script = r#"
            if redis.call("GET", KEYS[1]) == ARGV[1] then
                return redis.call("DEL", KEYS[1])
            else
                return 0
            end
        "#;

        let released: i32 = redis::cmd("EVAL")
            .arg(script)
            .arg(1)
            .arg(lock_key(resource))
            .arg(lock_id)
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;

        Ok(released == 1)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }
}

// =============================================================================
// Keys
// =============================================================================

fn lock_key(resource: &str) -> String {
    format!("{}{}", CACHE_PREFIX_LOCK, resource)
}

pub fn rate_limit_key(identifier: &str) -> String {
    format!("{}{}", CACHE_PREFIX_RATE_LIMIT, identifier)
}

pub fn revoked_token_key(jti: &str) -> String {
    format!("{}{}", CACHE_PREFIX_REVOKED_TOKEN, jti)
}

pub fn dashboard_key(company_id: Uuid) -> String {
    format!("{}{}", CACHE_PREFIX_DASHBOARD, company_id)
}

// =============================================================================
// Helpers
// =============================================================================

/// Read and decode a JSON value. Cache failures are logged and read as a miss.
pub async fn read_json<T: DeserializeOwned>(cache: &dyn CacheStore, key: &str) -> Option<T> {
    match cache.get(key).await {
        Ok(Some(json)) => match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding undecodable cache entry");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Cache read failed");
            None
        }
    }
}

/// Encode and store a JSON value. Failures are logged, never returned.
pub async fn write_json<T: Serialize>(cache: &dyn CacheStore, key: &str, value: &T, ttl: u64) {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Cache serialization failed");
            return;
        }
    };
    if let Err(e) = cache.set(key, json, ttl).await {
        tracing::warn!(key = %key, error = %e, "Cache write failed");
    }
}

/// Run `operation` while holding the lock on `resource`.
///
/// The lock is released whatever the outcome; a failed release only logs
/// since the lock expires on its own.
pub async fn with_lock<T, F>(cache: &dyn CacheStore, resource: &str, operation: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>> + Send,
    T: Send,
{
    let lock_id = cache.acquire_lock(resource).await?;
    let result = operation.await;

    match cache.release_lock(resource, &lock_id).await {
        Ok(true) => tracing::debug!(resource = %resource, "Lock released"),
        Ok(false) => tracing::warn!(resource = %resource, "Lock expired before release"),
        Err(e) => tracing::error!(resource = %resource, error = %e, "Failed to release lock"),
    }

    result
}

/// Convert Redis error to AppError.
fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::cache(e.to_string())
}

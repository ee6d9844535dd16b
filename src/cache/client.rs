use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;

/// `PTTL` reply for a key that does not exist.
pub const TTL_MISSING: i64 = -2;

/// `PTTL` reply for a key that exists without an expiration.
pub const TTL_PERSISTENT: i64 = -1;

/// Failure reported by a cache backend.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CacheError {
    /// The backend could not be reached.
    #[error("cache connection failed: {0}")]
    ConnectionFailed(String),
    /// The backend rejected or failed the command.
    #[error("cache operation failed: {0}")]
    OperationFailed(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(error: redis::RedisError) -> Self {
        if error.is_connection_refusal() || error.is_timeout() || error.is_connection_dropped() {
            Self::ConnectionFailed(error.to_string())
        } else {
            Self::OperationFailed(error.to_string())
        }
    }
}

/// The subset of Redis used by the cache repository.
#[async_trait]
pub trait CacheApi: Send + Sync {
    /// `GET`. Returns `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// `SET`, with a millisecond expiration unless `expiration` is zero.
    async fn set(&self, key: &str, value: String, expiration: Duration) -> Result<(), CacheError>;

    /// `PTTL`: remaining milliseconds, [`TTL_PERSISTENT`] or [`TTL_MISSING`].
    async fn ttl(&self, key: &str) -> Result<i64, CacheError>;

    /// `DEL`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

// `CacheApi` methods shadow the `AsyncCommands` ones of the same name, so
// commands are called by their full path.
#[async_trait]
impl CacheApi for redis::aio::ConnectionManager {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.clone();
        let value: Option<String> = AsyncCommands::get(&mut conn, key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, expiration: Duration) -> Result<(), CacheError> {
        let mut conn = self.clone();
        let milliseconds = u64::try_from(expiration.as_millis()).unwrap_or(u64::MAX);
        if milliseconds == 0 {
            AsyncCommands::set::<_, _, ()>(&mut conn, key, value).await?;
        } else {
            AsyncCommands::pset_ex::<_, _, ()>(&mut conn, key, value, milliseconds).await?;
        }
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<i64, CacheError> {
        let mut conn = self.clone();
        let ttl: i64 = AsyncCommands::pttl(&mut conn, key).await?;
        Ok(ttl)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.clone();
        AsyncCommands::del::<_, ()>(&mut conn, key).await?;
        Ok(())
    }
}

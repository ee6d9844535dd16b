use crate::{
    cache::client::{CacheApi, TTL_MISSING, TTL_PERSISTENT},
    error::ApplicationError,
};

use serde::{Serialize, de::DeserializeOwned};
use std::{sync::Arc, time::Duration};

/// A value to cache under a key for a limited time.
///
/// A zero `expiration_time` stores the value without expiration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RedisEntity<T> {
    /// The key, relative to the repository namespace.
    pub key: String,
    /// The value, stored as JSON.
    pub value: T,
    /// How long the value should live.
    pub expiration_time: Duration,
}

/// JSON cache whose keys all live under `"{namespace}:"`.
///
/// ```rust,no_run
/// use lambda_commons::cache::repository::{RedisEntity, RedisRepository};
/// use std::{sync::Arc, time::Duration};
///
/// # async fn example(conn: redis::aio::ConnectionManager) -> Result<(), lambda_commons::error::ApplicationError> {
/// let sessions = RedisRepository::new(Arc::new(conn), "sessions");
/// sessions
///     .save(&RedisEntity {
///         key: "abc".to_string(),
///         value: vec!["admin".to_string()],
///         expiration_time: Duration::from_secs(900),
///     })
///     .await?;
/// let roles: Option<Vec<String>> = sessions.find_key("abc").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisRepository {
    client: Arc<dyn CacheApi>,
    namespace: String,
}

impl std::fmt::Debug for RedisRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRepository")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl RedisRepository {
    /// Create a repository storing its keys under `namespace`.
    pub fn new(client: Arc<dyn CacheApi>, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    /// The full key `key` is stored under.
    pub fn namespaced_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Serialize and store `entity`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "lambda_commons.cache_save", skip_all, fields(key = %entity.key), err)
    )]
    pub async fn save<T: Serialize>(&self, entity: &RedisEntity<T>) -> Result<(), ApplicationError> {
        let namespaced_key = self.namespaced_key(&entity.key);
        let value = serde_json::to_string(&entity.value).map_err(|_| {
            ApplicationError::internal_server_error("error while marshaling value")
        })?;
        self.client
            .set(&namespaced_key, value, entity.expiration_time)
            .await
            .map_err(|_| {
                ApplicationError::internal_server_error(format!(
                    "error while saving redis key: {namespaced_key}"
                ))
            })
    }

    /// Read and deserialize the value stored under `key`.
    ///
    /// A missing key is `Ok(None)`. A value that is present but cannot be
    /// deserialized into `T` is an error.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "lambda_commons.cache_find_key", skip(self), err)
    )]
    pub async fn find_key<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, ApplicationError> {
        let namespaced_key = self.namespaced_key(key);
        let raw = self.client.get(&namespaced_key).await.map_err(|_| {
            ApplicationError::internal_server_error(format!(
                "error while reading redis key: {namespaced_key}"
            ))
        })?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        serde_json::from_str(&raw).map(Some).map_err(|_| {
            ApplicationError::internal_server_error("error while unmarshaling result")
        })
    }

    /// Remaining lifetime of `key`.
    ///
    /// A missing key is `Ok(None)`; a key without expiration reports
    /// [`Duration::MAX`].
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "lambda_commons.cache_get_ttl", skip(self), err)
    )]
    pub async fn get_ttl(&self, key: &str) -> Result<Option<Duration>, ApplicationError> {
        let namespaced_key = self.namespaced_key(key);
        let ttl = self.client.ttl(&namespaced_key).await.map_err(|_| {
            ApplicationError::internal_server_error(format!(
                "error while reading redis key: {namespaced_key}"
            ))
        })?;
        let ttl = match ttl {
            TTL_MISSING => None,
            TTL_PERSISTENT => Some(Duration::MAX),
            milliseconds if milliseconds >= 0 => {
                Some(Duration::from_millis(milliseconds.unsigned_abs()))
            }
            // unknown negative reply
            _ => None,
        };
        Ok(ttl)
    }

    /// Delete `key`. Deleting a missing key succeeds.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "lambda_commons.cache_delete_key", skip(self), err)
    )]
    pub async fn delete_key(&self, key: &str) -> Result<(), ApplicationError> {
        let namespaced_key = self.namespaced_key(key);
        self.client.delete(&namespaced_key).await.map_err(|_| {
            ApplicationError::internal_server_error(format!(
                "error while deleting redis key: {namespaced_key}"
            ))
        })
    }
}

use crate::cache::client::{CacheApi, CacheError, TTL_MISSING, TTL_PERSISTENT};

use async_trait::async_trait;
use std::{
    collections, sync,
    time::{Duration, Instant},
};

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// In-memory test double for [`CacheApi`] that honours expirations.
#[derive(Debug, Default)]
pub struct MockCache {
    entries: sync::Mutex<collections::HashMap<String, Entry>>,
    unavailable: bool,
}

impl MockCache {
    /// A cache whose every call fails with [`CacheError::ConnectionFailed`].
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    /// Store a raw value without expiration, bypassing serialization.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
    }

    /// The raw value stored under `key`, if any.
    pub fn raw(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.entries()
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    fn entries(&self) -> sync::MutexGuard<'_, collections::HashMap<String, Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(sync::PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.unavailable {
            return Err(CacheError::ConnectionFailed("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheApi for MockCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_available()?;
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: String, expiration: Duration) -> Result<(), CacheError> {
        self.check_available()?;
        let expires_at = (!expiration.is_zero()).then(|| Instant::now() + expiration);
        self.entries()
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<i64, CacheError> {
        self.check_available()?;
        let now = Instant::now();
        let ttl = match self.entries().get(key) {
            None => TTL_MISSING,
            Some(entry) if entry.is_expired(now) => TTL_MISSING,
            Some(Entry {
                expires_at: None, ..
            }) => TTL_PERSISTENT,
            Some(Entry {
                expires_at: Some(expires_at),
                ..
            }) => i64::try_from(expires_at.duration_since(now).as_millis()).unwrap_or(i64::MAX),
        };
        Ok(ttl)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.check_available()?;
        self.entries().remove(key);
        Ok(())
    }
}

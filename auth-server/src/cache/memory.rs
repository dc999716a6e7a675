use super::{CacheBackend, CacheError};
use async_trait::async_trait;
use log::warn;
use moka::future::Cache as MokaCache;
use moka::Expiry;
use serde::{de::DeserializeOwned, Serialize};
use std::time::{Duration, Instant};

/// A serialized value together with the lifetime it was written with
#[derive(Clone)]
struct Entry {
    value: String,
    /// `None` keeps whatever expiry the entry already has
    ttl: Option<Duration>,
}

/// Per-entry expiry: every entry lives for the TTL it was created or last set with
struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        entry.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl.or(duration_until_expiry)
    }
}

#[derive(Clone)]
pub struct InMemoryCache {
    cache: MokaCache<String, Entry>,
}

impl InMemoryCache {
    /// Initialize a new in-memory cache instance
    pub fn new(capacity_mib: usize) -> Result<Self, String> {
        // Convert MiB to bytes for max_capacity (1 MiB = 1024 * 1024 bytes)
        let max_capacity_bytes: u64 = capacity_mib
            .checked_mul(1024 * 1024)
            .and_then(|bytes| u64::try_from(bytes).ok())
            .ok_or_else(|| format!("Cache capacity of {capacity_mib} MiB overflows"))?;

        let cache = MokaCache::builder()
            .expire_after(EntryExpiry)
            .weigher(|key: &String, entry: &Entry| -> u32 {
                (key.len() + entry.value.len())
                    .try_into()
                    .unwrap_or(u32::MAX)
            })
            .max_capacity(max_capacity_bytes)
            .build();

        Ok(Self { cache })
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let serialized = serde_json::to_string(value)?;
        self.cache
            .insert(
                key.to_string(),
                Entry {
                    value: serialized,
                    ttl: Some(ttl),
                },
            )
            .await;
        Ok(())
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        if let Some(entry) = self.cache.get(key).await {
            serde_json::from_str(&entry.value)
                .map_err(|e| CacheError::Deserialization(e.to_string()))
                .map(Some)
        } else {
            Ok(None)
        }
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
        // The upsert closure runs under moka's per-key lock, so concurrent
        // increments of the same counter never lose an update.
        let entry = self
            .cache
            .entry(key.to_string())
            .and_upsert_with(|current| {
                let next = match current {
                    Some(current) => {
                        let previous = current.value().value.parse::<i64>().unwrap_or_else(|_| {
                            warn!("Counter {} held a non-numeric value, restarting it", key);
                            0
                        });
                        Entry {
                            value: (previous + 1).to_string(),
                            ttl: None,
                        }
                    }
                    None => Entry {
                        value: "1".to_string(),
                        ttl: Some(ttl),
                    },
                };
                std::future::ready(next)
            })
            .await;

        entry
            .into_value()
            .value
            .parse::<i64>()
            .map_err(|e| CacheError::Deserialization(e.to_string()))
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.cache.remove(key).await;
        Ok(())
    }
}

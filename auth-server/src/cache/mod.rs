use log::debug;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub mod key;
pub mod memory;
pub mod null;
pub mod redis;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to serialize value: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to parse value: {0}")]
    Deserialization(String),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Cache trait defining the interface for all cache implementations.
///
/// Every call is an independent atomic operation on a single key; callers
/// must not assume multi-key transactions. Implementations should be
/// thread-safe (Send + Sync) and cloneable to support sharing across
/// handlers.
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    /// Store a value in the cache for `ttl`
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    /// Retrieve a value from the cache
    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheError>;

    /// Atomically increment the counter stored at `key` and return the new value.
    ///
    /// A missing counter starts from zero and expires `ttl` after its first
    /// increment; later increments do not extend its lifetime.
    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, CacheError>;

    /// Performs a health check on the cache backend
    ///
    /// For Redis, this will ping the server. For memory cache, this will
    /// check if the cache is initialized.
    ///
    /// Returns Ok(()) if healthy, or Err with a descriptive message if unhealthy.
    async fn health_check(&self) -> Result<(), String>;

    /// Delete a value from the cache
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Cache implementation that provides a uniform interface regardless of backend.
///
/// The concrete implementation is chosen at runtime based on the application configuration.
#[derive(Clone)]
pub enum Cache {
    /// In-memory cache implementation using Moka
    InMemory(memory::InMemoryCache),
    /// Redis-based cache implementation
    Redis(redis::RedisCache),
    /// No-op cache implementation that doesn't actually cache anything
    Null(null::NullCache),
}

#[async_trait::async_trait]
impl CacheBackend for Cache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        match self {
            Self::InMemory(cache) => cache.set(key, value, ttl).await,
            Self::Redis(cache) => cache.set(key, value, ttl).await,
            Self::Null(cache) => cache.set(key, value, ttl).await,
        }
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        match self {
            Self::InMemory(cache) => cache.get(key).await,
            Self::Redis(cache) => cache.get(key).await,
            Self::Null(cache) => cache.get(key).await,
        }
    }

    async fn increment(&self, key: &str, ttl: Duration) -> Result<i64, CacheError> {
        match self {
            Self::InMemory(cache) => cache.increment(key, ttl).await,
            Self::Redis(cache) => cache.increment(key, ttl).await,
            Self::Null(cache) => cache.increment(key, ttl).await,
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        match self {
            Self::InMemory(cache) => cache.health_check().await,
            Self::Redis(cache) => cache.health_check().await,
            Self::Null(cache) => cache.health_check().await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            Self::InMemory(cache) => cache.delete(key).await,
            Self::Redis(cache) => cache.delete(key).await,
            Self::Null(cache) => cache.delete(key).await,
        }
    }
}

impl Cache {
    /// Cache-aside read: return the cached value for `key`, or run `loader`
    /// and cache what it produces for `ttl`.
    ///
    /// Only successful loads are written. A loader error, including a
    /// "not found" outcome, is handed back to the caller and leaves the key
    /// untouched so a transient absence never poisons the cache.
    pub async fn get_or_load<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get::<T>(key).await? {
            debug!("Cache hit for key: {}", key);
            return Ok(cached);
        }
        debug!("Cache miss for key: {}", key);

        let loaded = loader().await?;
        self.set(key, &loaded, ttl).await?;
        Ok(loaded)
    }
}

/// Factory function to create the appropriate cache implementation based on configuration.
///
/// # Returns
///
/// Returns a `Result` containing either:
/// - A `Cache` enum wrapping the selected cache implementation
/// - A `CacheError` if initialization fails
pub async fn create_cache(config: &crate::config::AppConfig) -> Result<Cache, CacheError> {
    match config.cache.store {
        crate::config::CacheStore::InMemory => {
            let cache = memory::InMemoryCache::new(config.cache.memory.capacity)
                .map_err(CacheError::Config)?;
            Ok(Cache::InMemory(cache))
        }
        crate::config::CacheStore::Redis => {
            if config.cache.redis.url.is_empty() {
                return Err(CacheError::Config(
                    "Redis URL is required for Redis cache".to_string(),
                ));
            }
            let cache = redis::RedisCache::new(&config.cache.redis.url)
                .await
                .map_err(CacheError::Config)?;
            Ok(Cache::Redis(cache))
        }
        crate::config::CacheStore::None => Ok(Cache::Null(null::NullCache::new())),
    }
}

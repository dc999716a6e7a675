use confique::Config;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use thiserror::Error;

/// Specifies which cache store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStore {
    #[default]
    InMemory,
    Redis,
    None,
}

#[derive(Debug, Error)]
#[error("unknown cache store '{0}', expected one of: in-memory, redis, none")]
pub struct UnknownCacheStore(String);

impl FromStr for CacheStore {
    type Err = UnknownCacheStore;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in-memory" | "memory" => Ok(Self::InMemory),
            "redis" => Ok(Self::Redis),
            "none" | "" => Ok(Self::None),
            other => Err(UnknownCacheStore(other.to_string())),
        }
    }
}

// Parsed through `FromStr` so env vars, defaults and TOML all accept the same spelling.
impl<'de> Deserialize<'de> for CacheStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Configuration for the caching subsystem
#[derive(Debug, Config, Clone)]
pub struct CacheConfig {
    /// Cache store type: "in-memory" (default), "redis" or "none"
    #[config(env = "IAM_CACHE_STORE", default = "in-memory")]
    pub store: CacheStore,

    /// TTL of cached user details in seconds (default: 1 hour)
    #[config(env = "IAM_CACHE_USER_DETAILS_TTL", default = 3600)]
    pub user_details_ttl: u64,

    /// TTL of cached client details in seconds (default: 1 hour)
    #[config(env = "IAM_CACHE_CLIENT_DETAILS_TTL", default = 3600)]
    pub client_details_ttl: u64,

    /// In-memory cache specific configuration
    #[config(nested)]
    pub memory: InMemoryConfig,

    /// Redis cache specific configuration
    #[config(nested)]
    pub redis: RedisConfig,
}

/// In-memory cache configuration options
#[derive(Debug, Config, Clone)]
pub struct InMemoryConfig {
    /// Maximum capacity in MiB (default: 128 MiB)
    #[config(env = "IAM_CACHE_MEMORY_CAPACITY", default = 128)]
    pub capacity: usize,
}

/// Redis cache configuration options
#[derive(Debug, Config, Clone)]
pub struct RedisConfig {
    /// Redis connection string
    #[config(env = "IAM_CACHE_REDIS_URL", default = "")]
    pub url: String,
}

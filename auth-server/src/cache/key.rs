//! Namespaced, tenant-scoped cache keys.
//!
//! A [`CacheKey`] pairs a namespace prefix with a fixed lifetime. The same
//! `(prefix, tenant, identifier)` tuple always renders to the same key
//! string, and the TTL belongs to the builder, never to an individual call.

use crate::config::AppConfig;
use std::time::Duration;

/// Cached user details, keyed by username
pub const USER_DETAILS: &str = "user_details";
/// Cached user details, keyed by mobile number
pub const USER_DETAILS_MOBILE: &str = "user_details:mobile";
/// Authenticated sessions, keyed by access token id
pub const TOKEN: &str = "token";
/// Consent decisions, shared with the authorization-consent service
pub const TOKEN_CONSENT: &str = "token:consent";
/// Cached client details, keyed by client id
pub const CLIENT_DETAILS: &str = "client:details";
/// Failed-login counters, keyed by account
pub const USER_FAIL_COUNT: &str = "user:fail:count";

const SEPARATOR: char = ':';

/// Builder of fully-qualified cache keys for one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    prefix: &'static str,
    tenant: Option<String>,
    expire: Duration,
}

impl CacheKey {
    /// Global (tenant-less) builder for `prefix`
    pub fn new(prefix: &'static str, expire: Duration) -> Self {
        Self {
            prefix,
            tenant: None,
            expire,
        }
    }

    /// Builder for the same namespace and lifetime scoped to `tenant`.
    ///
    /// `None` yields the global namespace. `Some("")` is a real, empty tenant
    /// and renders differently from "no tenant".
    pub fn for_tenant(&self, tenant: Option<&str>) -> Self {
        Self {
            prefix: self.prefix,
            tenant: tenant.map(str::to_string),
            expire: self.expire,
        }
    }

    /// Render the key for `id`: `prefix:[tenant:]id`
    pub fn key(&self, id: &str) -> String {
        let mut key = String::with_capacity(
            self.prefix.len() + self.tenant.as_ref().map_or(0, |t| t.len() + 1) + id.len() + 1,
        );
        key.push_str(self.prefix);
        key.push(SEPARATOR);
        if let Some(tenant) = &self.tenant {
            key.push_str(tenant);
            key.push(SEPARATOR);
        }
        key.push_str(id);
        key
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    pub fn expire(&self) -> Duration {
        self.expire
    }
}

/// The key builders used by the engine, constructed once at startup
#[derive(Debug, Clone)]
pub struct CacheKeys {
    pub user_details: CacheKey,
    pub user_details_mobile: CacheKey,
    pub client_details: CacheKey,
    pub session: CacheKey,
    pub fail_count: CacheKey,
}

impl CacheKeys {
    pub fn from_config(config: &AppConfig) -> Self {
        let user_ttl = Duration::from_secs(config.cache.user_details_ttl);
        Self {
            user_details: CacheKey::new(USER_DETAILS, user_ttl),
            user_details_mobile: CacheKey::new(USER_DETAILS_MOBILE, user_ttl),
            client_details: CacheKey::new(
                CLIENT_DETAILS,
                Duration::from_secs(config.cache.client_details_ttl),
            ),
            session: CacheKey::new(
                TOKEN,
                Duration::from_secs(config.token.access_token_validity),
            ),
            fail_count: CacheKey::new(USER_FAIL_COUNT, Duration::from_secs(config.lockout.window)),
        }
    }
}

//! Server-side sessions backing issued access tokens.
//!
//! A session lives under the `token` namespace keyed by the access token's
//! id, so revoking it invalidates the token before it expires.

use crate::cache::key::CacheKey;
use crate::cache::{Cache, CacheBackend, CacheError};
use crate::models::{AuthInfo, LoginUser};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// The principal, without credentials
    pub user: LoginUser,
    pub client_id: String,
    pub issued_at: i64,
}

impl Session {
    pub fn new(user: &LoginUser, client_id: impl Into<String>, issued_at: i64) -> Self {
        Self {
            user: user.without_credentials(),
            client_id: client_id.into(),
            issued_at,
        }
    }

    pub fn auth_info(&self) -> AuthInfo {
        AuthInfo {
            user_id: self.user.user_id().to_string(),
            account: self.user.username().to_string(),
            tenant_id: self.user.tenant_id().map(str::to_string),
            client_id: self.client_id.clone(),
            issued_at: self.issued_at,
            authorities: self.user.authorities().iter().cloned().collect(),
        }
    }
}

#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<Cache>,
    key: CacheKey,
}

impl SessionStore {
    pub fn new(cache: Arc<Cache>, key: CacheKey) -> Self {
        Self { cache, key }
    }

    /// Lifetime of every stored session
    pub fn ttl(&self) -> Duration {
        self.key.expire()
    }

    pub async fn store(&self, token_id: &str, session: &Session) -> Result<(), CacheError> {
        let key = self.key.for_tenant(session.user.tenant_id());
        self.cache.set(&key.key(token_id), session, key.expire()).await
    }

    pub async fn load(
        &self,
        tenant: Option<&str>,
        token_id: &str,
    ) -> Result<Option<Session>, CacheError> {
        self.cache
            .get(&self.key.for_tenant(tenant).key(token_id))
            .await
    }

    pub async fn revoke(&self, tenant: Option<&str>, token_id: &str) -> Result<(), CacheError> {
        self.cache
            .delete(&self.key.for_tenant(tenant).key(token_id))
            .await
    }
}

//! Resolution of accounts into [`LoginUser`] principals.
//!
//! Lookups go through the shared cache first and only reach the directory
//! on a miss. A user that does not exist is reported as
//! [`AuthError::UserNotFound`] and never cached.

use crate::cache::key::CacheKey;
use crate::cache::Cache;
use crate::errors::AuthError;
use crate::lookup::UserLookup;
use crate::models::LoginUser;
use std::collections::HashSet;
use std::sync::Arc;

#[async_trait::async_trait]
pub trait UserDetailsProvider: Send + Sync {
    /// Whether this provider serves requests of `client_id` using `grant_type`
    fn supports(&self, client_id: &str, grant_type: &str) -> bool;

    async fn load_by_username(
        &self,
        tenant: Option<&str>,
        username: &str,
    ) -> Result<LoginUser, AuthError>;

    async fn load_by_mobile(&self, tenant: Option<&str>, phone: &str)
        -> Result<LoginUser, AuthError>;
}

/// Cache-then-directory provider
pub struct CachedUserDetailsProvider {
    cache: Arc<Cache>,
    lookup: Arc<dyn UserLookup>,
    username_key: CacheKey,
    mobile_key: CacheKey,
    client_ids: Option<HashSet<String>>,
}

impl CachedUserDetailsProvider {
    pub fn new(
        cache: Arc<Cache>,
        lookup: Arc<dyn UserLookup>,
        username_key: CacheKey,
        mobile_key: CacheKey,
    ) -> Self {
        Self {
            cache,
            lookup,
            username_key,
            mobile_key,
            client_ids: None,
        }
    }

    /// Only serve the given clients instead of every client
    pub fn for_clients<I, S>(mut self, client_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.client_ids = Some(client_ids.into_iter().map(Into::into).collect());
        self
    }
}

#[async_trait::async_trait]
impl UserDetailsProvider for CachedUserDetailsProvider {
    fn supports(&self, client_id: &str, _grant_type: &str) -> bool {
        self.client_ids
            .as_ref()
            .map_or(true, |ids| ids.contains(client_id))
    }

    async fn load_by_username(
        &self,
        tenant: Option<&str>,
        username: &str,
    ) -> Result<LoginUser, AuthError> {
        let key = self.username_key.for_tenant(tenant);
        self.cache
            .get_or_load(&key.key(username), key.expire(), || async {
                match self.lookup.lookup_by_username(tenant, username).await {
                    Ok(Some(record)) => Ok(LoginUser::from(record)),
                    Ok(None) => Err(AuthError::UserNotFound(username.to_string())),
                    Err(e) => Err(AuthError::from(e)),
                }
            })
            .await
    }

    async fn load_by_mobile(
        &self,
        tenant: Option<&str>,
        phone: &str,
    ) -> Result<LoginUser, AuthError> {
        let key = self.mobile_key.for_tenant(tenant);
        self.cache
            .get_or_load(&key.key(phone), key.expire(), || async {
                match self.lookup.lookup_by_mobile(tenant, phone).await {
                    Ok(Some(record)) => Ok(LoginUser::from(record)),
                    Ok(None) => Err(AuthError::UserNotFound(phone.to_string())),
                    Err(e) => Err(AuthError::from(e)),
                }
            })
            .await
    }
}

/// Providers in priority order plus an explicit fallback
pub struct ProviderChain {
    providers: Vec<Arc<dyn UserDetailsProvider>>,
    fallback: Arc<dyn UserDetailsProvider>,
}

impl ProviderChain {
    pub fn new(fallback: Arc<dyn UserDetailsProvider>) -> Self {
        Self {
            providers: Vec::new(),
            fallback,
        }
    }

    /// Append a provider after the ones already registered
    pub fn with(mut self, provider: Arc<dyn UserDetailsProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// First provider supporting the request, else the fallback
    pub fn select(&self, client_id: &str, grant_type: &str) -> &Arc<dyn UserDetailsProvider> {
        self.providers
            .iter()
            .find(|provider| provider.supports(client_id, grant_type))
            .unwrap_or(&self.fallback)
    }
}

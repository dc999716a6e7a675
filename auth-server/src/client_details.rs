use crate::cache::key::CacheKey;
use crate::cache::Cache;
use crate::errors::{AuthError, DenyReason};
use crate::lookup::ClientLookup;
use crate::models::ClientDetails;
use crate::password::verify_password_blocking;
use log::{debug, warn};
use std::sync::Arc;

/// Loads and authenticates OAuth clients through the shared cache
#[derive(Clone)]
pub struct ClientDetailsService {
    cache: Arc<Cache>,
    lookup: Arc<dyn ClientLookup>,
    key: CacheKey,
}

impl ClientDetailsService {
    pub fn new(cache: Arc<Cache>, lookup: Arc<dyn ClientLookup>, key: CacheKey) -> Self {
        Self { cache, lookup, key }
    }

    /// Load a client registration. Unknown clients are not cached.
    pub async fn load(&self, client_id: &str) -> Result<ClientDetails, AuthError> {
        self.cache
            .get_or_load(&self.key.key(client_id), self.key.expire(), || async {
                match self.lookup.lookup_by_client_id(client_id).await {
                    Ok(Some(client)) => Ok(client),
                    Ok(None) => Err(AuthError::unauthorized(DenyReason::InvalidClient)),
                    Err(e) => Err(AuthError::from(e)),
                }
            })
            .await
    }

    /// Authenticate the client and check that it may use `grant_type`
    pub async fn authenticate(
        &self,
        client_id: &str,
        client_secret: Option<&str>,
        grant_type: &str,
    ) -> Result<ClientDetails, AuthError> {
        if client_id.trim().is_empty() {
            return Err(AuthError::unauthorized(DenyReason::MissingParameter(
                "client_id",
            )));
        }

        let client = self.load(client_id).await.inspect_err(|e| {
            if e.reason() == Some(&DenyReason::InvalidClient) {
                warn!("Unknown client '{}'", client_id);
            }
        })?;

        if let Some(hash) = client.client_secret.as_deref() {
            let verified = match client_secret {
                Some(secret) => verify_password_blocking(secret, hash).await,
                None => false,
            };
            if !verified {
                warn!("Client '{}' failed secret verification", client_id);
                return Err(AuthError::unauthorized(DenyReason::InvalidClient));
            }
        }

        if !client.authorized_grant_types.is_empty()
            && !client.authorized_grant_types.iter().any(|g| g == grant_type)
        {
            warn!(
                "Client '{}' is not allowed to use grant type '{}'",
                client_id, grant_type
            );
            return Err(AuthError::unauthorized(DenyReason::GrantTypeNotAllowed));
        }

        debug!("Client '{}' authenticated", client_id);
        Ok(client)
    }
}

//! Remote directory of users and OAuth clients.
//!
//! The engine only depends on the [`UserLookup`] and [`ClientLookup`]
//! traits; [`UpstreamClient`] is the HTTP implementation used in production.

use crate::models::{ClientDetails, UserRecord};
use thiserror::Error;

mod upstream;

pub use upstream::UpstreamClient;

/// Errors that can occur while querying the directory
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("directory request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("directory responded with status {0}")]
    Status(u16),
    #[error("directory configuration error: {0}")]
    Config(String),
}

/// Lookup of user records. `Ok(None)` means the user does not exist.
#[async_trait::async_trait]
pub trait UserLookup: Send + Sync {
    async fn lookup_by_username(
        &self,
        tenant: Option<&str>,
        username: &str,
    ) -> Result<Option<UserRecord>, LookupError>;

    async fn lookup_by_mobile(
        &self,
        tenant: Option<&str>,
        phone: &str,
    ) -> Result<Option<UserRecord>, LookupError>;
}

/// Lookup of OAuth client registrations. `Ok(None)` means the client is unknown.
#[async_trait::async_trait]
pub trait ClientLookup: Send + Sync {
    async fn lookup_by_client_id(
        &self,
        client_id: &str,
    ) -> Result<Option<ClientDetails>, LookupError>;
}

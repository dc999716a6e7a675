//! Grant-type dispatch.
//!
//! A token request moves through a fixed sequence of states:
//!
//! ```text
//! received -> strategy-resolved -> user-resolved -> granted
//!     \______________\_________________\___________> denied
//! ```
//!
//! The grant type is resolved by exact match against a registry built once
//! at startup. Any failure ends the request in `denied` and nothing is kept.

mod issuer;
mod password;
mod refresh;

pub use issuer::{TokenIssuer, BEARER};
pub use password::{AccountKind, PasswordGranter};
pub use refresh::RefreshTokenGranter;

use crate::client_details::ClientDetailsService;
use crate::errors::AuthError;
use crate::models::{GrantResult, LoginUser, TokenRequest};
use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One authentication flow, selected by its grant type literal
#[async_trait::async_trait]
pub trait TokenGranter: Send + Sync {
    fn grant_type(&self) -> &str;

    /// Resolve the principal the request authenticates as
    async fn grant(&self, request: &TokenRequest) -> Result<LoginUser, AuthError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GrantState {
    Received,
    StrategyResolved,
    UserResolved,
    Granted,
    Denied,
}

impl fmt::Display for GrantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Received => "received",
            Self::StrategyResolved => "strategy-resolved",
            Self::UserResolved => "user-resolved",
            Self::Granted => "granted",
            Self::Denied => "denied",
        })
    }
}

pub struct GrantDispatcher {
    granters: HashMap<String, Arc<dyn TokenGranter>>,
    clients: ClientDetailsService,
    issuer: TokenIssuer,
}

impl GrantDispatcher {
    pub fn new(
        granters: Vec<Arc<dyn TokenGranter>>,
        clients: ClientDetailsService,
        issuer: TokenIssuer,
    ) -> Self {
        let mut registry: HashMap<String, Arc<dyn TokenGranter>> = HashMap::new();
        for granter in granters {
            let grant_type = granter.grant_type().to_string();
            if registry.contains_key(&grant_type) {
                warn!(
                    "Grant type '{}' registered twice, keeping the first",
                    grant_type
                );
                continue;
            }
            registry.insert(grant_type, granter);
        }
        Self {
            granters: registry,
            clients,
            issuer,
        }
    }

    /// Registered grant types, sorted
    pub fn grant_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.granters.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub async fn grant(&self, request: &TokenRequest) -> Result<GrantResult, AuthError> {
        let mut state = GrantState::Received;
        let result = self.run(request, &mut state).await;
        match &result {
            Ok(_) => transition(request, &mut state, GrantState::Granted),
            Err(e) => {
                warn!(
                    "Grant '{}' of client '{}' denied in state {}: {}",
                    request.grant_type, request.client_id, state, e
                );
                state = GrantState::Denied;
            }
        }
        debug!("Grant '{}' finished as {}", request.grant_type, state);
        result
    }

    async fn run(
        &self,
        request: &TokenRequest,
        state: &mut GrantState,
    ) -> Result<GrantResult, AuthError> {
        let granter = self
            .granters
            .get(request.grant_type.as_str())
            .ok_or_else(|| AuthError::UnsupportedGrantType(request.grant_type.clone()))?;
        let client = self
            .clients
            .authenticate(
                &request.client_id,
                request.client_secret.as_deref(),
                &request.grant_type,
            )
            .await?;
        transition(request, state, GrantState::StrategyResolved);

        let user = granter.grant(request).await?;
        transition(request, state, GrantState::UserResolved);

        self.issuer.issue(&user, &client).await
    }
}

fn transition(request: &TokenRequest, state: &mut GrantState, next: GrantState) {
    debug!(
        "Grant '{}' of client '{}': {} -> {}",
        request.grant_type, request.client_id, state, next
    );
    *state = next;
}

use crate::errors::{AuthError, DenyReason};
use crate::grant::TokenGranter;
use crate::models::{LoginUser, TokenRequest, GRANT_REFRESH_TOKEN};
use crate::refresh::RefreshTokenValidator;
use crate::user_details::ProviderChain;
use log::warn;
use std::sync::Arc;

/// Exchanges a valid refresh token for a new set of tokens.
///
/// With `reload_user` the account is resolved again so authority changes
/// are picked up and removed accounts can no longer refresh. Otherwise the
/// principal is rebuilt from the token claims alone.
pub struct RefreshTokenGranter {
    validator: RefreshTokenValidator,
    providers: Arc<ProviderChain>,
    reload_user: bool,
}

impl RefreshTokenGranter {
    pub fn new(
        validator: RefreshTokenValidator,
        providers: Arc<ProviderChain>,
        reload_user: bool,
    ) -> Self {
        Self {
            validator,
            providers,
            reload_user,
        }
    }
}

#[async_trait::async_trait]
impl TokenGranter for RefreshTokenGranter {
    fn grant_type(&self) -> &str {
        GRANT_REFRESH_TOKEN
    }

    async fn grant(&self, request: &TokenRequest) -> Result<LoginUser, AuthError> {
        let claims = self.validator.validate(
            &request.grant_type,
            request.refresh_token.as_deref(),
            &request.client_id,
        )?;

        if !self.reload_user {
            return Ok(LoginUser::new(
                claims.sub,
                claims.account,
                claims.tenant_id,
                "",
                Vec::new(),
            ));
        }

        let provider = self.providers.select(&request.client_id, GRANT_REFRESH_TOKEN);
        match provider
            .load_by_username(claims.tenant_id.as_deref(), &claims.account)
            .await
        {
            Err(AuthError::UserNotFound(account)) => {
                warn!("Refresh token presented for vanished account '{}'", account);
                Err(AuthError::unauthorized(DenyReason::InvalidRefreshToken))
            }
            other => other,
        }
    }
}

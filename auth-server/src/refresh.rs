use crate::codec::{TokenClaims, TokenCodec, REFRESH_TOKEN_TYPE};
use crate::errors::{AuthError, DenyReason};
use crate::models::GRANT_REFRESH_TOKEN;
use log::{debug, warn};
use std::sync::Arc;

/// Validates refresh tokens presented to the token endpoint.
///
/// The grant-type literal, the expiry and the `token_type` claim are checked
/// independently: any one of them failing denies the request regardless of
/// the other two.
#[derive(Clone)]
pub struct RefreshTokenValidator {
    codec: Arc<dyn TokenCodec>,
}

impl RefreshTokenValidator {
    pub fn new(codec: Arc<dyn TokenCodec>) -> Self {
        Self { codec }
    }

    pub fn validate(
        &self,
        grant_type: &str,
        refresh_token: Option<&str>,
        client_id: &str,
    ) -> Result<TokenClaims, AuthError> {
        if grant_type != GRANT_REFRESH_TOKEN {
            warn!("Refresh validation requested for grant type '{}'", grant_type);
            return Err(AuthError::unauthorized(DenyReason::GrantTypeMismatch));
        }

        let token = refresh_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AuthError::unauthorized(DenyReason::MissingParameter("refresh_token"))
            })?;

        let claims = self.codec.parse(token).map_err(|e| {
            warn!("Rejected refresh token: {}", e);
            AuthError::unauthorized(DenyReason::InvalidRefreshToken)
        })?;

        if self.codec.is_expired(&claims) {
            warn!("Refresh token for account '{}' has expired", claims.account);
            return Err(AuthError::unauthorized(DenyReason::RefreshTokenExpired));
        }

        if claims.token_type != REFRESH_TOKEN_TYPE {
            warn!(
                "Token of type '{}' presented as refresh token for account '{}'",
                claims.token_type, claims.account
            );
            return Err(AuthError::unauthorized(DenyReason::NotARefreshToken));
        }

        if claims.client_id != client_id {
            warn!(
                "Refresh token of client '{}' presented by client '{}'",
                claims.client_id, client_id
            );
            return Err(AuthError::unauthorized(DenyReason::InvalidRefreshToken));
        }

        debug!("Refresh token for account '{}' is valid", claims.account);
        Ok(claims)
    }
}

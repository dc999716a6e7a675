use crate::codec::{TokenClaims, TokenCodec, ACCESS_TOKEN_TYPE, REFRESH_TOKEN_TYPE};
use crate::config::token::TokenConfig;
use crate::errors::AuthError;
use crate::models::{ClientDetails, GrantResult, LoginUser, GRANT_REFRESH_TOKEN};
use crate::session::{Session, SessionStore};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use log::info;
use std::sync::Arc;

pub const BEARER: &str = "Bearer";

/// Turns a resolved principal into signed tokens and a stored session
#[derive(Clone)]
pub struct TokenIssuer {
    codec: Arc<dyn TokenCodec>,
    sessions: SessionStore,
    issuer: String,
    access_validity: u64,
    refresh_validity: u64,
}

impl TokenIssuer {
    pub fn new(codec: Arc<dyn TokenCodec>, sessions: SessionStore, config: &TokenConfig) -> Self {
        Self {
            codec,
            sessions,
            issuer: config.issuer.clone(),
            access_validity: config.access_token_validity,
            refresh_validity: config.refresh_token_validity,
        }
    }

    pub async fn issue(
        &self,
        user: &LoginUser,
        client: &ClientDetails,
    ) -> Result<GrantResult, AuthError> {
        let now = Utc::now().timestamp();
        // An access token never outlives its session
        let access_ttl = client
            .access_token_validity_seconds
            .unwrap_or(self.access_validity)
            .min(self.sessions.ttl().as_secs());
        let refresh_ttl = client
            .refresh_token_validity_seconds
            .unwrap_or(self.refresh_validity);

        let access_id = new_token_id();
        let access_token = self.codec.encode(&self.claims(
            user,
            client,
            ACCESS_TOKEN_TYPE,
            &access_id,
            now,
            access_ttl,
        ))?;

        let refresh_token = if may_refresh(client) {
            Some(self.codec.encode(&self.claims(
                user,
                client,
                REFRESH_TOKEN_TYPE,
                &new_token_id(),
                now,
                refresh_ttl,
            ))?)
        } else {
            None
        };

        self.sessions
            .store(&access_id, &Session::new(user, &client.client_id, now))
            .await?;

        info!(
            "Issued tokens to account '{}' of client '{}'",
            user.username(),
            client.client_id
        );

        Ok(GrantResult {
            access_token,
            token_type: BEARER.to_string(),
            expires_in: access_ttl,
            refresh_token,
            id_token: None,
            user_id: user.user_id().to_string(),
            tenant_id: user.tenant_id().map(str::to_string),
        })
    }

    fn claims(
        &self,
        user: &LoginUser,
        client: &ClientDetails,
        token_type: &str,
        token_id: &str,
        now: i64,
        ttl: u64,
    ) -> TokenClaims {
        TokenClaims {
            sub: user.user_id().to_string(),
            account: user.username().to_string(),
            tenant_id: user.tenant_id().map(str::to_string),
            client_id: client.client_id.clone(),
            token_type: token_type.to_string(),
            iat: now,
            exp: now.saturating_add(i64::try_from(ttl).unwrap_or(i64::MAX)),
            jti: token_id.to_string(),
            iss: self.issuer.clone(),
        }
    }
}

fn may_refresh(client: &ClientDetails) -> bool {
    client.authorized_grant_types.is_empty()
        || client
            .authorized_grant_types
            .iter()
            .any(|g| g == GRANT_REFRESH_TOKEN)
}

fn new_token_id() -> String {
    let bytes: [u8; 16] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

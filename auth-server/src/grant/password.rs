use crate::cache::key::CacheKey;
use crate::cache::{Cache, CacheBackend};
use crate::config::lockout::LockoutConfig;
use crate::errors::{AuthError, DenyReason};
use crate::grant::TokenGranter;
use crate::models::{LoginUser, TokenRequest, GRANT_MOBILE, GRANT_PASSWORD};
use crate::password::verify_password_blocking;
use crate::user_details::ProviderChain;
use log::{debug, warn};
use std::sync::Arc;

/// What the `account` field of a password request identifies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Username,
    Mobile,
}

/// Account/password grant with failed-attempt lockout.
///
/// The failure counter belongs to the resolved user, not to the submitted
/// account text, so every grant that reaches the same user shares it. It is
/// read before the password is verified, so a locked account stays locked
/// even when the right password is presented.
pub struct PasswordGranter {
    kind: AccountKind,
    providers: Arc<ProviderChain>,
    cache: Arc<Cache>,
    fail_count: CacheKey,
    threshold: u32,
}

impl PasswordGranter {
    pub fn new(
        kind: AccountKind,
        providers: Arc<ProviderChain>,
        cache: Arc<Cache>,
        fail_count: CacheKey,
        lockout: &LockoutConfig,
    ) -> Self {
        Self {
            kind,
            providers,
            cache,
            fail_count,
            threshold: lockout.threshold,
        }
    }

    async fn is_locked(&self, key: &str) -> Result<bool, AuthError> {
        if self.threshold == 0 {
            return Ok(false);
        }
        let failures = self.cache.get::<i64>(key).await?.unwrap_or(0);
        Ok(failures >= i64::from(self.threshold))
    }
}

#[async_trait::async_trait]
impl TokenGranter for PasswordGranter {
    fn grant_type(&self) -> &str {
        match self.kind {
            AccountKind::Username => GRANT_PASSWORD,
            AccountKind::Mobile => GRANT_MOBILE,
        }
    }

    async fn grant(&self, request: &TokenRequest) -> Result<LoginUser, AuthError> {
        let account = non_blank(request.account.as_deref())
            .ok_or_else(|| AuthError::unauthorized(DenyReason::MissingParameter("account")))?;
        let password = non_blank(request.password.as_deref())
            .ok_or_else(|| AuthError::unauthorized(DenyReason::MissingParameter("password")))?;
        let tenant = request.tenant();

        let provider = self.providers.select(&request.client_id, self.grant_type());
        let user = match self.kind {
            AccountKind::Username => provider.load_by_username(tenant, account).await?,
            AccountKind::Mobile => provider.load_by_mobile(tenant, account).await?,
        };
        if user.tenant_id().filter(|t| !t.trim().is_empty()) != tenant {
            warn!(
                "Account '{}' resolved to user '{}' outside the requested tenant",
                account,
                user.user_id()
            );
            return Err(AuthError::UserNotFound(account.to_string()));
        }

        let fail_key = self.fail_count.for_tenant(user.tenant_id());
        let counter = fail_key.key(user.user_id());
        if self.is_locked(&counter).await? {
            warn!("User '{}' is locked", user.username());
            return Err(AuthError::unauthorized(DenyReason::AccountLocked));
        }

        if !check_password(&user, password).await {
            let failures = self.cache.increment(&counter, fail_key.expire()).await?;
            warn!(
                "Wrong password for user '{}' ({} consecutive failures)",
                user.username(),
                failures
            );
            return Err(AuthError::unauthorized(DenyReason::BadCredentials));
        }

        self.cache.delete(&counter).await?;
        debug!("Password verified for user '{}'", user.username());
        Ok(user)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

async fn check_password(user: &LoginUser, password: &str) -> bool {
    match user.password_hash() {
        Some(hash) => verify_password_blocking(password, hash).await,
        None => {
            warn!("Account '{}' has no password set", user.username());
            false
        }
    }
}

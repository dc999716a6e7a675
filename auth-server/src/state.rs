use crate::cache::key::CacheKeys;
use crate::cache::{Cache, CacheBackend};
use crate::client_details::ClientDetailsService;
use crate::codec::{JwtCodec, TokenCodec};
use crate::config::AppConfig;
use crate::grant::{
    AccountKind, GrantDispatcher, PasswordGranter, RefreshTokenGranter, TokenGranter, TokenIssuer,
};
use crate::lookup::{ClientLookup, LookupError, UpstreamClient, UserLookup};
use crate::refresh::RefreshTokenValidator;
use crate::session::SessionStore;
use crate::user_details::{CachedUserDetailsProvider, ProviderChain};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cache: Arc<Cache>,
    pub keys: Arc<CacheKeys>,
    pub codec: Arc<dyn TokenCodec>,
    pub sessions: SessionStore,
    pub dispatcher: Arc<GrantDispatcher>,
}

impl AppState {
    /// State backed by the HTTP user and client directory
    pub fn new(config: AppConfig, cache: Cache) -> Result<Self, LookupError> {
        let upstream = Arc::new(UpstreamClient::new(&config.upstream, &config.trust)?);
        Ok(Self::with_directory(
            config,
            cache,
            upstream.clone(),
            upstream,
        ))
    }

    /// Wire the engine over the given directory collaborators
    pub fn with_directory(
        config: AppConfig,
        cache: Cache,
        users: Arc<dyn UserLookup>,
        clients: Arc<dyn ClientLookup>,
    ) -> Self {
        let cache = Arc::new(cache);
        let keys = CacheKeys::from_config(&config);
        let codec: Arc<dyn TokenCodec> = Arc::new(JwtCodec::new(
            config.token.secret.as_bytes(),
            &config.token.issuer,
        ));
        let sessions = SessionStore::new(cache.clone(), keys.session.clone());

        let providers = Arc::new(ProviderChain::new(Arc::new(
            CachedUserDetailsProvider::new(
                cache.clone(),
                users,
                keys.user_details.clone(),
                keys.user_details_mobile.clone(),
            ),
        )));

        let granters: Vec<Arc<dyn TokenGranter>> = vec![
            Arc::new(PasswordGranter::new(
                AccountKind::Username,
                providers.clone(),
                cache.clone(),
                keys.fail_count.clone(),
                &config.lockout,
            )),
            Arc::new(PasswordGranter::new(
                AccountKind::Mobile,
                providers.clone(),
                cache.clone(),
                keys.fail_count.clone(),
                &config.lockout,
            )),
            Arc::new(RefreshTokenGranter::new(
                RefreshTokenValidator::new(codec.clone()),
                providers,
                config.token.reload_user_on_refresh,
            )),
        ];

        let dispatcher = GrantDispatcher::new(
            granters,
            ClientDetailsService::new(cache.clone(), clients, keys.client_details.clone()),
            TokenIssuer::new(codec.clone(), sessions.clone(), &config.token),
        );

        Self {
            config: Arc::new(config),
            cache,
            keys: Arc::new(keys),
            codec,
            sessions,
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Check if all components are healthy
    pub async fn health_check(&self) -> Result<(), String> {
        self.cache.health_check().await
    }
}

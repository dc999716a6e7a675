pub(crate) use crate::config::cache::{CacheConfig, CacheStore};
use crate::config::lockout::LockoutConfig;
use crate::config::token::TokenConfig;
use crate::config::trust::TrustConfig;
use crate::config::upstream::UpstreamConfig;
use confique::Config;

pub mod cache;
pub mod lockout;
pub mod token;
pub mod trust;
pub mod upstream;

/// Optional configuration file, read when present in the working directory
pub const CONFIG_FILE: &str = "auth-server.toml";

/// Main configuration structure for the auth server
#[derive(Debug, Config, Clone)]
pub struct AppConfig {
    /// The port the server will listen to (default: 9999)
    #[config(env = "IAM_PORT", default = 9999)]
    pub port: u16,

    /// Cache configuration
    #[config(nested)]
    pub cache: CacheConfig,

    /// Token issuance configuration
    #[config(nested)]
    pub token: TokenConfig,

    /// Failed-login lockout configuration
    #[config(nested)]
    pub lockout: LockoutConfig,

    /// Inner-service trust configuration
    #[config(nested)]
    pub trust: TrustConfig,

    /// User and client directory configuration
    #[config(nested)]
    pub upstream: UpstreamConfig,
}

impl AppConfig {
    /// Creates a new config from environment variables layered over the optional config file
    pub fn new() -> Result<Self, String> {
        Self::builder()
            .env()
            .file(CONFIG_FILE)
            .load()
            .map_err(|e| e.to_string())
    }

    /// Configuration made only of the built-in defaults
    pub fn defaults() -> Result<Self, String> {
        Self::builder().load().map_err(|e| e.to_string())
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(upstream_mock: &wiremock::MockServer) -> Self {
        let mut config = Self::defaults().expect("defaults must load");
        config.port = 0; // Let the OS choose a port
        config.cache.store = CacheStore::InMemory;
        config.token.secret = "test-secret".to_string();
        config.lockout.threshold = 3;
        config.upstream.url = upstream_mock.uri();
        config.upstream.timeout = 5;
        config
    }
}

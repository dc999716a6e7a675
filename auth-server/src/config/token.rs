//! Token issuance configuration

use confique::Config;

/// Secret used when none is configured, only suitable for local development
pub const DEVELOPMENT_SECRET: &str = "auth-server-development-secret";

/// Token signing and lifetime configuration
#[derive(Debug, Config, Clone)]
pub struct TokenConfig {
    /// HMAC secret used to sign issued tokens
    #[config(env = "IAM_TOKEN_SECRET", default = "auth-server-development-secret")]
    pub secret: String,

    /// Issuer claim written into and required from every token (default: "auth-server")
    #[config(env = "IAM_TOKEN_ISSUER", default = "auth-server")]
    pub issuer: String,

    /// Default access token validity in seconds (default: 12 hours)
    #[config(env = "IAM_TOKEN_ACCESS_TOKEN_VALIDITY", default = 43200)]
    pub access_token_validity: u64,

    /// Default refresh token validity in seconds (default: 30 days)
    #[config(env = "IAM_TOKEN_REFRESH_TOKEN_VALIDITY", default = 2592000)]
    pub refresh_token_validity: u64,

    /// Re-resolve the account through the user details providers on refresh (default: true)
    #[config(env = "IAM_TOKEN_RELOAD_USER_ON_REFRESH", default = true)]
    pub reload_user_on_refresh: bool,
}

impl TokenConfig {
    /// Whether the signing secret is still the built-in development value
    pub fn uses_development_secret(&self) -> bool {
        self.secret == DEVELOPMENT_SECRET
    }
}

use confique::Config;

/// Configuration of the user and client directory service
#[derive(Debug, Config, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the directory service (default: http://localhost:4000)
    #[config(env = "IAM_UPSTREAM_URL", default = "http://localhost:4000")]
    pub url: String,

    /// The timeout for directory queries in seconds (default: 5)
    #[config(env = "IAM_UPSTREAM_TIMEOUT", default = 5)]
    pub timeout: u64,
}

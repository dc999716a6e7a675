use confique::Config;

/// Failed-login lockout configuration
#[derive(Debug, Config, Clone)]
pub struct LockoutConfig {
    /// Failed attempts after which an account is locked, 0 disables the lockout (default: 5)
    #[config(env = "IAM_LOCKOUT_THRESHOLD", default = 5)]
    pub threshold: u32,

    /// Lifetime of the failure counter in seconds, and so of a lockout (default: 1 hour)
    #[config(env = "IAM_LOCKOUT_WINDOW", default = 3600)]
    pub window: u64,
}

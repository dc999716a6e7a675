use confique::Config;

/// Inner-service trust propagation headers
#[derive(Debug, Config, Clone)]
pub struct TrustConfig {
    /// Header carrying the call source (default: "from")
    #[config(env = "IAM_TRUST_SOURCE_HEADER", default = "from")]
    pub source_header: String,

    /// Call source value marking a pre-trusted inner-service call (default: "inner")
    #[config(env = "IAM_TRUST_INNER_VALUE", default = "inner")]
    pub inner_value: String,

    /// Header carrying a base64 encoded JSON authentication payload (default: "x-auth-info")
    #[config(env = "IAM_TRUST_AUTH_INFO_HEADER", default = "x-auth-info")]
    pub auth_info_header: String,
}

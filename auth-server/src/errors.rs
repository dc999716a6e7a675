use crate::cache::CacheError;
use crate::codec::CodecError;
use crate::lookup::LookupError;
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Why a request was denied
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenyReason {
    #[error("missing required parameter '{0}'")]
    MissingParameter(&'static str),
    #[error("bad credentials")]
    BadCredentials,
    #[error("account is locked after too many failed attempts")]
    AccountLocked,
    #[error("invalid client")]
    InvalidClient,
    #[error("grant type not allowed for this client")]
    GrantTypeNotAllowed,
    #[error("grant type does not match the request")]
    GrantTypeMismatch,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("refresh token expired")]
    RefreshTokenExpired,
    #[error("token is not a refresh token")]
    NotARefreshToken,
    #[error("authentication required")]
    Unauthenticated,
    #[error("insufficient permissions")]
    Forbidden,
}

impl DenyReason {
    /// Stable machine-readable code for the reason
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "missing_parameter",
            Self::BadCredentials => "bad_credentials",
            Self::AccountLocked => "account_locked",
            Self::InvalidClient => "invalid_client",
            Self::GrantTypeNotAllowed => "grant_type_not_allowed",
            Self::GrantTypeMismatch => "grant_type_mismatch",
            Self::InvalidRefreshToken => "invalid_refresh_token",
            Self::RefreshTokenExpired => "refresh_token_expired",
            Self::NotARefreshToken => "not_a_refresh_token",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
        }
    }
}

/// Errors produced by the authentication engine
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unsupported grant type '{0}'")]
    UnsupportedGrantType(String),
    #[error("unauthorized: {0}")]
    Unauthorized(DenyReason),
    #[error("user '{0}' not found")]
    UserNotFound(String),
    #[error("bearer token expired")]
    TokenExpired,
    #[error("cache unavailable: {0}")]
    CacheUnavailable(#[from] CacheError),
    #[error("directory lookup failed: {0}")]
    Upstream(#[from] LookupError),
    #[error("token codec failure: {0}")]
    Codec(#[from] CodecError),
}

impl AuthError {
    pub fn unauthorized(reason: DenyReason) -> Self {
        Self::Unauthorized(reason)
    }

    /// The deny reason, if this is an `Unauthorized` error
    pub fn reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Unauthorized(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedGrantType(_) | Self::UserNotFound(_) => StatusCode::UNAUTHORIZED,
            Self::Unauthorized(DenyReason::Forbidden) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::TokenExpired => StatusCode::FAILED_DEPENDENCY,
            Self::CacheUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Codec(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::Unauthorized(_) => "unauthorized",
            Self::UserNotFound(_) => "user_not_found",
            Self::TokenExpired => "token_expired",
            Self::CacheUnavailable(_) => "cache_unavailable",
            Self::Upstream(_) => "upstream_unavailable",
            Self::Codec(_) => "server_error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();
        let detail = match &self {
            // Dependency failures stay in the logs
            Self::CacheUnavailable(_) | Self::Upstream(_) | Self::Codec(_) => {
                log::error!("Request failed: {}", self);
                status_code
                    .canonical_reason()
                    .unwrap_or("internal error")
                    .to_string()
            }
            _ => self.to_string(),
        };
        let body = json!({
            "error": self.error_code(),
            "reason": self.reason().map(DenyReason::code),
            "detail": detail,
        });
        (status_code, Json(body)).into_response()
    }
}

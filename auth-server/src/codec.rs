//! Signing and parsing of bearer tokens.
//!
//! [`TokenCodec::parse`] verifies the signature and issuer only. Expiry is
//! reported separately by [`TokenCodec::is_expired`] so callers can tell an
//! expired token from a forged one.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `token_type` claim of access tokens
pub const ACCESS_TOKEN_TYPE: &str = "access";
/// `token_type` claim of refresh tokens
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode token: {0}")]
    Encode(String),
    #[error("invalid token: {0}")]
    Invalid(String),
}

/// Claims carried by every issued token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// User id
    pub sub: String,
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub client_id: String,
    /// "access" or "refresh"
    pub token_type: String,
    pub iat: i64,
    pub exp: i64,
    /// Unique token id, also the session key of access tokens
    pub jti: String,
    pub iss: String,
}

pub trait TokenCodec: Send + Sync {
    fn encode(&self, claims: &TokenClaims) -> Result<String, CodecError>;

    /// Verify and decode `token` without judging its expiry
    fn parse(&self, token: &str) -> Result<TokenClaims, CodecError>;

    fn is_expired(&self, claims: &TokenClaims) -> bool {
        claims.exp <= Utc::now().timestamp()
    }
}

/// HS256 JSON Web Token codec
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    pub fn new(secret: &[u8], issuer: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl TokenCodec for JwtCodec {
    fn encode(&self, claims: &TokenClaims) -> Result<String, CodecError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn parse(&self, token: &str) -> Result<TokenClaims, CodecError> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| CodecError::Invalid(e.to_string()))
    }
}

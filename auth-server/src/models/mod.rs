use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use utoipa::ToSchema;

/// Grant type literal of the username/password flow
pub const GRANT_PASSWORD: &str = "password";
/// Grant type literal of the mobile-number/password flow
pub const GRANT_MOBILE: &str = "mobile";
/// Grant type literal of the refresh flow
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

/// Authenticated session context of one request.
///
/// Never persisted directly: it is derived per request from a token, from
/// the session cache, or from an inner-service auth header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfo {
    pub user_id: String,
    pub account: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub client_id: String,
    /// Unix timestamp (seconds) of the grant that established the session
    pub issued_at: i64,
    /// Granted authorities, propagated so downstream permission checks work
    #[serde(default)]
    pub authorities: Vec<String>,
}

/// User as returned by the directory service
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub user_type: String,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub authorities: Vec<String>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("tenant_id", &self.tenant_id)
            .field("user_type", &self.user_type)
            .field("authorities", &self.authorities)
            .finish_non_exhaustive()
    }
}

/// Resolved principal: identity plus authority set.
///
/// Immutable once built. The password hash is only present while
/// credentials are being verified and is stripped before a session is
/// stored.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginUser {
    user_id: String,
    username: String,
    tenant_id: Option<String>,
    user_type: String,
    authorities: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password_hash: Option<String>,
}

impl LoginUser {
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        tenant_id: Option<String>,
        user_type: impl Into<String>,
        authorities: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            tenant_id,
            user_type: user_type.into(),
            authorities: authorities.into_iter().collect(),
            password_hash: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn user_type(&self) -> &str {
        &self.user_type
    }

    pub fn authorities(&self) -> &BTreeSet<String> {
        &self.authorities
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    /// Copy of this user without the password hash
    pub fn without_credentials(&self) -> Self {
        Self {
            password_hash: None,
            ..self.clone()
        }
    }
}

impl From<UserRecord> for LoginUser {
    fn from(record: UserRecord) -> Self {
        Self {
            user_id: record.user_id,
            username: record.username,
            tenant_id: record.tenant_id,
            user_type: record.user_type,
            authorities: record.authorities.into_iter().collect(),
            password_hash: record.password_hash,
        }
    }
}

impl fmt::Debug for LoginUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginUser")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("tenant_id", &self.tenant_id)
            .field("user_type", &self.user_type)
            .field("authorities", &self.authorities)
            .field(
                "password_hash",
                &self.password_hash.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Token endpoint request (form encoded)
#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct TokenRequest {
    /// Grant type, e.g. "password" or "refresh_token"
    #[serde(default)]
    pub grant_type: String,
    /// Account name (username, or mobile number for the mobile grant)
    #[serde(default, alias = "username")]
    pub account: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Tenant the account belongs to, if the deployment is multi-tenant
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl TokenRequest {
    pub fn tenant(&self) -> Option<&str> {
        self.tenant_id.as_deref().filter(|t| !t.trim().is_empty())
    }
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("grant_type", &self.grant_type)
            .field("account", &self.account)
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}

/// Tokens handed back to the caller after a successful grant
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GrantResult {
    pub access_token: String,
    /// Always "Bearer"
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
}

/// OAuth client registration
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetails {
    pub client_id: String,
    /// Argon2 hash of the client secret; `None` for public clients
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub access_token_validity_seconds: Option<u64>,
    #[serde(default)]
    pub refresh_token_validity_seconds: Option<u64>,
    /// Grant types this client may use; empty allows all registered ones
    #[serde(default)]
    pub authorized_grant_types: Vec<String>,
}

impl fmt::Debug for ClientDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientDetails")
            .field("client_id", &self.client_id)
            .field("access_token_validity_seconds", &self.access_token_validity_seconds)
            .field("refresh_token_validity_seconds", &self.refresh_token_validity_seconds)
            .field("authorized_grant_types", &self.authorized_grant_types)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        UserRecord {
            user_id: "1".to_string(),
            username: "alice".to_string(),
            phone: None,
            tenant_id: Some("acme".to_string()),
            user_type: "member".to_string(),
            password_hash: Some("$argon2id$secret".to_string()),
            authorities: vec!["sys:user:view".to_string()],
        }
    }

    #[test]
    fn test_debug_redacts_password_hash() {
        let user = LoginUser::from(record());
        let printed = format!("{:?}", user);
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("$argon2id$secret"));
        assert!(!format!("{:?}", record()).contains("$argon2id$secret"));
    }

    #[test]
    fn test_without_credentials_strips_hash() {
        let user = LoginUser::from(record());
        assert!(user.password_hash().is_some());
        let stripped = user.without_credentials();
        assert!(stripped.password_hash().is_none());
        assert_eq!(stripped.username(), "alice");
        assert!(!serde_json::to_string(&stripped)
            .unwrap()
            .contains("password_hash"));
    }

    #[test]
    fn test_auth_info_camel_case() {
        let info: AuthInfo = serde_json::from_str(
            r#"{"userId":"1","account":"alice","tenantId":"acme","clientId":"web","issuedAt":10}"#,
        )
        .unwrap();
        assert_eq!(info.user_id, "1");
        assert_eq!(info.tenant_id.as_deref(), Some("acme"));
        assert!(info.authorities.is_empty());
    }

    #[test]
    fn test_token_request_accepts_username_alias() {
        let request: TokenRequest =
            serde_json::from_str(r#"{"grant_type":"password","username":"alice"}"#).unwrap();
        assert_eq!(request.account.as_deref(), Some("alice"));
        assert_eq!(request.tenant(), None);
    }
}

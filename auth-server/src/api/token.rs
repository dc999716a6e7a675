use crate::context::RequestContext;
use crate::errors::{AuthError, DenyReason};
use crate::headers::presets;
use crate::models::{AuthInfo, GrantResult, TokenRequest};
use crate::openapi::TOKEN_TAG;
use crate::permission::has_any_permission;
use crate::state::AppState;
use axum::extract::{Form, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use log::info;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

/// Exchange credentials or a refresh token for tokens
#[utoipa::path(
    post,
    path = "/oauth2/token",
    tag = TOKEN_TAG,
    request_body(content = TokenRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Tokens issued", body = GrantResult),
        (status = 401, description = "Unsupported grant type, bad credentials, locked account or invalid token"),
        (status = 502, description = "User directory unavailable"),
        (status = 503, description = "Cache unavailable")
    )
)]
async fn issue_token(State(state): State<AppState>, Form(request): Form<TokenRequest>) -> Response {
    let mut response = match state.dispatcher.grant(&request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => err.into_response(),
    };
    presets::no_store().apply(&mut response);
    response
}

/// End the session of the presented access token
#[utoipa::path(
    delete,
    path = "/oauth2/token",
    tag = TOKEN_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer access token"),
    ),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "No session to revoke"),
        (status = 424, description = "Access token expired")
    )
)]
async fn revoke_token(
    State(state): State<AppState>,
    context: RequestContext,
) -> Result<StatusCode, AuthError> {
    let auth = authenticated(&context)?;
    let session_id = context
        .session_id
        .as_deref()
        .ok_or_else(|| AuthError::unauthorized(DenyReason::Unauthenticated))?;

    state
        .sessions
        .revoke(auth.tenant_id.as_deref(), session_id)
        .await?;
    info!("Session of account '{}' revoked", auth.account);
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's authentication context
#[utoipa::path(
    get,
    path = "/oauth2/me",
    tag = TOKEN_TAG,
    responses(
        (status = 200, description = "Authenticated caller", body = AuthInfo),
        (status = 401, description = "Not authenticated"),
        (status = 424, description = "Access token expired")
    )
)]
async fn current_user(context: RequestContext) -> Result<Json<AuthInfo>, AuthError> {
    authenticated(&context).cloned().map(Json)
}

/// Permissions to test against the caller's authorities
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct PermissionCheck {
    /// Wildcard patterns, any one matching is enough
    #[serde(default)]
    permissions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct PermissionCheckResult {
    allowed: bool,
}

/// Check whether the caller holds any of the given permissions
#[utoipa::path(
    post,
    path = "/oauth2/check",
    tag = TOKEN_TAG,
    request_body = PermissionCheck,
    responses(
        (status = 200, description = "Check completed", body = PermissionCheckResult),
        (status = 422, description = "Invalid request payload")
    )
)]
async fn check_permission(
    context: RequestContext,
    Json(check): Json<PermissionCheck>,
) -> Json<PermissionCheckResult> {
    Json(PermissionCheckResult {
        allowed: has_any_permission(&context, &check.permissions),
    })
}

fn authenticated(context: &RequestContext) -> Result<&AuthInfo, AuthError> {
    match &context.auth {
        Some(auth) => Ok(auth),
        None if context.token_expired => Err(AuthError::TokenExpired),
        None => Err(AuthError::unauthorized(DenyReason::Unauthenticated)),
    }
}

pub(super) fn router() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(issue_token, revoke_token))
        .routes(routes!(current_user))
        .routes(routes!(check_permission))
}

#[cfg(test)]
mod tests {
    use crate::models::GrantResult;
    use crate::test_utils::TestFixture;
    use http::header::CACHE_CONTROL;
    use http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_password_grant() {
        let fixture = TestFixture::new().await;
        fixture.mount_default_directory().await;

        let response = fixture
            .post_form(
                "/oauth2/token",
                &[
                    ("grant_type", "password"),
                    ("username", "alice"),
                    ("password", "correct"),
                    ("client_id", "web"),
                ],
            )
            .await;
        response.assert_ok();
        let result: GrantResult = response.json_as();
        assert!(!result.access_token.is_empty());
        assert_eq!(result.token_type, "Bearer");
        assert_eq!(result.user_id, "id-alice");
        assert!(result.refresh_token.is_some());
        assert!(response
            .headers
            .get(CACHE_CONTROL)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("no-store"));
    }

    #[tokio::test]
    async fn test_unsupported_grant_type() {
        let fixture = TestFixture::new().await;
        let response = fixture
            .post_form(
                "/oauth2/token",
                &[("grant_type", "sms"), ("client_id", "web")],
            )
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json["error"], "unsupported_grant_type");
    }

    #[tokio::test]
    async fn test_locked_account_reason() {
        let fixture = TestFixture::new().await;
        fixture.mount_default_directory().await;

        let attempt = |password: &'static str| {
            [
                ("grant_type", "password"),
                ("username", "bob"),
                ("password", password),
                ("client_id", "web"),
            ]
        };
        for _ in 0..3 {
            let response = fixture.post_form("/oauth2/token", &attempt("wrong")).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            assert_eq!(response.json["reason"], "bad_credentials");
        }
        let response = fixture.post_form("/oauth2/token", &attempt("correct")).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json["reason"], "account_locked");
    }

    #[tokio::test]
    async fn test_refresh_with_access_token_is_rejected() {
        let fixture = TestFixture::new().await;
        fixture.mount_default_directory().await;
        let access_token = fixture.login("alice", "correct").await;

        let response = fixture
            .post_form(
                "/oauth2/token",
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", &access_token),
                    ("client_id", "web"),
                ],
            )
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json["reason"], "not_a_refresh_token");
    }

    #[tokio::test]
    async fn test_me_logout_and_check() {
        let fixture = TestFixture::new().await;
        fixture.mount_default_directory().await;
        let token = fixture.login("alice", "correct").await;
        let bearer = format!("Bearer {token}");
        let auth = [("authorization", bearer.as_str())];

        let me = fixture.get_with_headers("/oauth2/me", &auth).await;
        me.assert_ok();
        assert_eq!(me.json["account"], "alice");
        assert_eq!(me.json["clientId"], "web");

        let check = fixture
            .post_json_with_headers(
                "/oauth2/check",
                &json!({ "permissions": ["sys:user:*"] }),
                &auth,
            )
            .await;
        check.assert_ok();
        assert_eq!(check.json["allowed"], true);

        let denied = fixture
            .post_json_with_headers(
                "/oauth2/check",
                &json!({ "permissions": ["sys:role:*"] }),
                &auth,
            )
            .await;
        assert_eq!(denied.json["allowed"], false);

        fixture
            .delete_with_headers("/oauth2/token", &auth)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        fixture
            .get_with_headers("/oauth2/me", &auth)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_without_credentials() {
        let fixture = TestFixture::new().await;
        let response = fixture.get("/oauth2/me").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(response.json["reason"], "unauthenticated");
    }
}

//! Trust boundary middleware.
//!
//! Builds the [`RequestContext`] of every inbound request before any handler
//! runs. Calls marked as coming from an inner service are trusted as-is.
//! External calls are authenticated from a propagated auth-info header or a
//! bearer access token. Unreadable credentials leave the request anonymous
//! so that permission checks further down deny it.

use crate::codec::ACCESS_TOKEN_TYPE;
use crate::context::RequestContext;
use crate::errors::AuthError;
use crate::models::AuthInfo;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::AUTHORIZATION;
use http::HeaderMap;
use log::{debug, warn};

pub(crate) async fn trust_boundary(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_context(&state, request.headers()).await {
        Ok(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

async fn resolve_context(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<RequestContext, AuthError> {
    let trust = &state.config.trust;

    if header_str(headers, &trust.source_header) == Some(trust.inner_value.as_str()) {
        debug!("Inner-service call, skipping authentication");
        return Ok(RequestContext::inner());
    }

    if let Some(encoded) = header_str(headers, &trust.auth_info_header) {
        return Ok(match decode_auth_info(encoded) {
            Ok(auth) => {
                debug!("Propagated auth info for account '{}'", auth.account);
                RequestContext::authenticated(auth, None)
            }
            Err(e) => {
                warn!("Ignoring undecodable {} header: {}", trust.auth_info_header, e);
                RequestContext::anonymous()
            }
        });
    }

    match bearer_token(headers) {
        Some(token) => resolve_bearer(state, token).await,
        None => Ok(RequestContext::anonymous()),
    }
}

async fn resolve_bearer(state: &AppState, token: &str) -> Result<RequestContext, AuthError> {
    let claims = match state.codec.parse(token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("Ignoring bearer token: {}", e);
            return Ok(RequestContext::anonymous());
        }
    };
    if claims.token_type != ACCESS_TOKEN_TYPE {
        warn!(
            "Ignoring bearer token of type '{}' for account '{}'",
            claims.token_type, claims.account
        );
        return Ok(RequestContext::anonymous());
    }
    if state.codec.is_expired(&claims) {
        debug!("Bearer token of account '{}' has expired", claims.account);
        return Ok(RequestContext::expired());
    }

    match state
        .sessions
        .load(claims.tenant_id.as_deref(), &claims.jti)
        .await?
    {
        Some(session) => Ok(RequestContext::authenticated(
            session.auth_info(),
            Some(claims.jti),
        )),
        None => {
            debug!("No session for bearer token of account '{}'", claims.account);
            Ok(RequestContext::anonymous())
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = header_str(headers, AUTHORIZATION.as_str())?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|token| !token.is_empty())
}

fn decode_auth_info(encoded: &str) -> Result<AuthInfo, String> {
    let json = STANDARD.decode(encoded).map_err(|e| e.to_string())?;
    serde_json::from_slice(&json).map_err(|e| e.to_string())
}

//! Per-request authentication context.
//!
//! The trust middleware inserts a [`RequestContext`] into the request
//! extensions. It is owned by that single request and dropped with it, so a
//! context can never be observed by another request.

use crate::models::AuthInfo;
use axum::extract::FromRequestParts;
use http::request::Parts;
use std::convert::Infallible;

/// Where a request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSource {
    /// Another service inside the mesh, trusted by network topology
    Inner,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub source: CallSource,
    pub auth: Option<AuthInfo>,
    /// Id of the session backing the bearer token, if any
    pub session_id: Option<String>,
    /// A bearer token was presented but has expired
    pub token_expired: bool,
}

impl RequestContext {
    pub fn inner() -> Self {
        Self {
            source: CallSource::Inner,
            ..Self::anonymous()
        }
    }

    pub fn anonymous() -> Self {
        Self {
            source: CallSource::External,
            auth: None,
            session_id: None,
            token_expired: false,
        }
    }

    pub fn authenticated(auth: AuthInfo, session_id: Option<String>) -> Self {
        Self {
            auth: Some(auth),
            session_id,
            ..Self::anonymous()
        }
    }

    pub fn expired() -> Self {
        Self {
            token_expired: true,
            ..Self::anonymous()
        }
    }

    pub fn is_inner(&self) -> bool {
        self.source == CallSource::Inner
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Requests that never passed the trust middleware are anonymous
impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}

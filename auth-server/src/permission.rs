//! Wildcard permission checks against the caller's authorities

use crate::context::RequestContext;
use crate::errors::{AuthError, DenyReason};

/// Glob match where `*` stands for any run of characters, including none
pub fn simple_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.as_bytes();
    let text = text.as_bytes();
    let (mut p, mut t) = (0, 0);
    // Position of the last `*` and the text index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&c| c == b'*')
}

/// Whether any required permission matches any granted authority.
///
/// Unauthenticated callers and an empty `required` list never match.
pub fn has_any_permission<S: AsRef<str>>(context: &RequestContext, required: &[S]) -> bool {
    let Some(auth) = &context.auth else {
        return false;
    };
    let granted: Vec<&str> = auth
        .authorities
        .iter()
        .map(String::as_str)
        .filter(|a| !a.trim().is_empty())
        .collect();

    required.iter().any(|permission| {
        granted
            .iter()
            .any(|authority| simple_match(permission.as_ref(), authority))
    })
}

pub fn require_any_permission<S: AsRef<str>>(
    context: &RequestContext,
    required: &[S],
) -> Result<(), AuthError> {
    if context.auth.is_none() {
        return Err(if context.token_expired {
            AuthError::TokenExpired
        } else {
            AuthError::unauthorized(DenyReason::Unauthenticated)
        });
    }
    if has_any_permission(context, required) {
        Ok(())
    } else {
        Err(AuthError::unauthorized(DenyReason::Forbidden))
    }
}

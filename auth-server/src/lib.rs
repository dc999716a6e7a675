mod api;
pub mod cache;
pub mod client_details;
pub mod codec;
pub mod config;
pub mod context;
pub mod errors;
pub mod grant;
pub mod headers;
pub mod lookup;
pub mod models;
pub(crate) mod openapi;
pub mod password;
pub mod permission;
pub mod refresh;
pub mod session;
pub mod state;
#[cfg(test)]
mod test_utils;
pub mod user_details;

use crate::state::AppState;
use axum::Router;
use utoipa_scalar::{Scalar, Servable};

/// Create a new application instance with a given state
pub fn create_app(state: AppState) -> Router {
    let (router, api_doc) = api::router(&state).split_for_parts();

    router
        .merge(Scalar::with_url("/scalar", api_doc))
        .with_state(state)
}

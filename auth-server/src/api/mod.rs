pub(crate) mod health;
pub(crate) mod token;
mod trust;

use crate::openapi::ApiDoc;
use crate::state::AppState;
use axum::middleware;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(health::router())
        .merge(token::router())
        // every route runs behind the trust boundary
        .layer(middleware::from_fn_with_state(
            state.clone(),
            trust::trust_boundary,
        ))
}

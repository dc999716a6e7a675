use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const TOKEN_TAG: &str = "Token API";

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = HEALTH_TAG, description = "Health check endpoints"),
        (name = TOKEN_TAG, description = "Token issuance, sessions and permission checks"),
    ),
    info(
        title = "Auth Server API",
        description = "Authentication and token issuance service",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;

use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const GATEWAY_TAG: &str = "Gateway API";

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::accounts::accounts_handler,
        crate::api::health::health_check,
    ),
    tags(
        (name = HEALTH_TAG, description = "Health endpoints"),
        (name = GATEWAY_TAG, description = "Routes protected by bearer token introspection"),
    ),
    info(
        title = "Gateway API",
        description = "Validates bearer tokens and forwards to the protected backend",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;

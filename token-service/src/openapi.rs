use utoipa::OpenApi;

pub(crate) const HEALTH_TAG: &str = "Health API";
pub(crate) const TOKEN_TAG: &str = "Token API";

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::issue::issue_handler,
        crate::api::introspect::introspect_handler,
        crate::api::health::health_check,
        crate::api::health::ready_check,
    ),
    tags(
        (name = HEALTH_TAG, description = "Health and readiness endpoints"),
        (name = TOKEN_TAG, description = "Token issuance and introspection endpoints"),
    ),
    info(
        title = "Token Service API",
        description = "Issues and introspects short-lived bearer tokens",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_token_endpoints() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/issue"));
        assert!(doc.paths.paths.contains_key("/introspect"));
        assert!(doc.paths.paths.contains_key("/ready"));
    }
}

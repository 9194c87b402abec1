use crate::authorizer::Authorized;
use crate::openapi::GATEWAY_TAG;
use crate::state::AppState;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use http::header::AUTHORIZATION;
use http::{HeaderMap, StatusCode};
use log::{debug, error, warn};

/// Protected accounts resource
#[utoipa::path(
    get,
    path = "/accounts",
    tag = GATEWAY_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer token issued by the token service"),
    ),
    responses(
        (status = 200, description = "Backend payload with the validated subject", body = Authorized),
        (status = 401, description = "missing_bearer or inactive_token"),
        (status = 502, description = "upstream_error"),
        (status = 503, description = "introspection_unavailable")
    )
)]
pub(crate) async fn accounts_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let timer = state.metrics.start_request();
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    match state.authorizer.authorize(authorization).await {
        Ok(authorized) => {
            debug!("Forwarded request for '{}'", authorized.sub);
            timer.finish("ok");
            (StatusCode::OK, Json(authorized)).into_response()
        }
        Err(rejection) => {
            let classification = rejection.classification();
            if rejection.status_code().is_server_error() {
                error!("Request failed with {}: {}", classification, rejection);
            } else {
                warn!("Request rejected with {}", classification);
            }
            timer.finish(classification);
            rejection.into_response()
        }
    }
}

use crate::api::models::IntrospectResponse;
use crate::introspection::Introspection;
use crate::openapi::TOKEN_TAG;
use crate::state::AppState;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use credential_client::{fingerprint, parse_bearer};
use http::header::AUTHORIZATION;
use http::{HeaderMap, StatusCode};
use log::{debug, error};

#[utoipa::path(
    post,
    path = "/introspect",
    tag = TOKEN_TAG,
    params(
        ("Authorization" = String, Header, description = "Bearer token to check"),
    ),
    responses(
        (status = 200, description = "Token checked; `active` tells whether it is valid", body = IntrospectResponse),
        (status = 503, description = "Token store unavailable, validity unknown", body = IntrospectResponse)
    )
)]
pub(crate) async fn introspect_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    // an absent or malformed header is checked as the empty token, which is never active
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer)
        .unwrap_or_default();
    if token.is_empty() {
        debug!("Introspection request without a bearer token");
    }

    match state.introspection.introspect(token).await {
        Ok(Introspection::Active(token)) => {
            (StatusCode::OK, Json(IntrospectResponse::from(token))).into_response()
        }
        Ok(Introspection::Inactive) => {
            (StatusCode::OK, Json(IntrospectResponse::inactive())).into_response()
        }
        Err(err) => {
            error!("Failed to introspect token {}: {}", fingerprint(token), err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(IntrospectResponse::unavailable()),
            )
                .into_response()
        }
    }
}

use axum::response::IntoResponse;
use axum::Json;
use credential_client::ClientError;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Why the gateway refused or failed a request.
///
/// Only the classification string reaches the caller; the detail is logged.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("Missing or malformed bearer credential")]
    MissingBearer,
    #[error("Credential is not active")]
    InactiveToken,
    #[error("Introspection unavailable: {0}")]
    IntrospectionUnavailable(String),
    #[error("Upstream error: {0}")]
    UpstreamError(String),
}

impl Rejection {
    pub fn classification(&self) -> &'static str {
        match self {
            Rejection::MissingBearer => "missing_bearer",
            Rejection::InactiveToken => "inactive_token",
            Rejection::IntrospectionUnavailable(_) => "introspection_unavailable",
            Rejection::UpstreamError(_) => "upstream_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Rejection::MissingBearer | Rejection::InactiveToken => StatusCode::UNAUTHORIZED,
            Rejection::IntrospectionUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Rejection::UpstreamError(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<ClientError> for Rejection {
    fn from(err: ClientError) -> Self {
        Rejection::IntrospectionUnavailable(err.to_string())
    }
}

impl From<reqwest::Error> for Rejection {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Rejection::UpstreamError("upstream request timed out".to_string())
        } else if err.is_connect() {
            Rejection::UpstreamError(format!("failed to connect to upstream: {}", err))
        } else {
            Rejection::UpstreamError(err.to_string())
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> axum::response::Response {
        let body = json!({ "error": self.classification() });
        (self.status_code(), Json(body)).into_response()
    }
}

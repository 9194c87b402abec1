use crate::issuance::IssueError;
use crate::store::StoreError;
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use log::error;
use serde_json::json;

/// Error payload returned by the token service: `{"error": <code>, "detail": <message>}`
#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: &'static str,
    pub detail: String,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with an error code, a detail message and a status code
    pub fn new<S: ToString>(code: &'static str, detail: S, status_code: StatusCode) -> Self {
        Self {
            code,
            detail: detail.to_string(),
            status_code,
        }
    }

    /// Create new Bad Request Error (400) for a malformed request body
    pub fn bad_request<S: ToString>(detail: S) -> Self {
        Self::new("invalid_request", detail, StatusCode::BAD_REQUEST)
    }

    /// Create new Service Unavailable (503) for an unreachable token store
    pub fn store_unavailable<S: ToString>(detail: S) -> Self {
        Self::new("store_unavailable", detail, StatusCode::SERVICE_UNAVAILABLE)
    }

    /// Create new Internal Server Error (500) with a detail message
    pub fn internal<S: ToString>(detail: S) -> Self {
        Self::new("internal_error", detail, StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(_) => Self::store_unavailable(err),
            _ => Self::internal(err),
        }
    }
}

impl From<IssueError> for ApiError {
    fn from(err: IssueError) -> Self {
        match err {
            IssueError::Store(e) => e.into(),
            IssueError::Exhausted(_) => Self::new(
                "issuance_exhausted",
                err,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            IssueError::ExpiryOutOfRange { .. } => Self::internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if self.status_code.is_server_error() {
            error!("{}: {}", self.code, self.detail);
        }
        let body = json!({
            "error": self.code,
            "detail": self.detail,
        });
        (self.status_code, Json(body)).into_response()
    }
}

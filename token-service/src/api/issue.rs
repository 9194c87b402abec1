use crate::api::models::{IssueBody, IssueResponse};
use crate::errors::ApiError;
use crate::openapi::TOKEN_TAG;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use http::StatusCode;

#[utoipa::path(
    post,
    path = "/issue",
    tag = TOKEN_TAG,
    request_body(content = IssueBody, description = "Subject and scope, both optional"),
    responses(
        (status = 200, description = "Token issued", body = IssueResponse),
        (status = 400, description = "Request body is not valid JSON"),
        (status = 500, description = "No unique token value could be generated"),
        (status = 503, description = "Token store unavailable")
    )
)]
pub(crate) async fn issue_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_body(&body) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };

    let subject = non_empty(request.service_id)
        .unwrap_or_else(|| state.settings.default_service_id.clone());
    let scope = non_empty(request.scope).unwrap_or_else(|| state.settings.default_scope.clone());

    match state.issuance.issue(&subject, &scope).await {
        Ok(token) => (StatusCode::OK, Json(IssueResponse::from(token))).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// An absent body means "use the defaults"
fn parse_body(body: &[u8]) -> Result<IssueBody, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(IssueBody::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("Invalid issuance request: {}", e)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use crate::test_utils::TestFixture;
    use credential_client::IssuedToken;
    use http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_issue_with_defaults() {
        let fixture = TestFixture::new().await;

        let response = fixture.post_raw("/issue", "", &[]).await;
        response.assert_ok();
        let token = response.json_as::<IssuedToken>();
        assert!(token.access_token.starts_with("tok_"));
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 600);
        assert_eq!(token.sub, "accounts");
        assert_eq!(token.scope, "accounts:read");
        assert_eq!(fixture.state.metrics.issued(), 1);
    }

    #[tokio::test]
    async fn test_issue_with_explicit_subject() {
        let fixture = TestFixture::new().await;

        let response = fixture
            .post(
                "/issue",
                &json!({ "service_id": "payments", "scope": "payments:write" }),
            )
            .await;
        response.assert_ok();
        let token = response.json_as::<IssuedToken>();
        assert_eq!(token.sub, "payments");
        assert_eq!(token.scope, "payments:write");
    }

    #[tokio::test]
    async fn test_issue_partial_body_uses_default_scope() {
        let fixture = TestFixture::new().await;

        let response = fixture
            .post("/issue", &json!({ "service_id": "payments", "scope": "" }))
            .await;
        response.assert_ok();
        let token = response.json_as::<IssuedToken>();
        assert_eq!(token.sub, "payments");
        assert_eq!(token.scope, "accounts:read");
    }

    #[tokio::test]
    async fn test_issue_rejects_malformed_body() {
        let fixture = TestFixture::new().await;

        let response = fixture.post_raw("/issue", "{not json", &[]).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json["error"], "invalid_request");
        assert_eq!(fixture.state.metrics.issued(), 0);
    }

    #[tokio::test]
    async fn test_issue_with_store_down() {
        let fixture = TestFixture::offline().await;

        let response = fixture.post("/issue", &json!({})).await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.json["error"], "store_unavailable");
    }
}

use crate::config::GatewayConfig;
use crate::{create_app, create_metrics_app};
use crate::state::AppState;
use axum::body::Body;
use axum::Router;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::MockServer;

/// Test fixture running the gateway router in-process against mocked dependencies.
///
/// `auth_mock` stands in for the token service introspection endpoint and `upstream_mock`
/// for the protected backend.
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// The router served on the metrics port
    pub metrics_app: Router,
    /// Shared application state, for inspecting metrics
    pub state: AppState,
    /// Mock server for the token service
    pub auth_mock: MockServer,
    /// Mock server for the protected backend
    pub upstream_mock: MockServer,
}

impl TestFixture {
    pub async fn new() -> Self {
        let _ = env_logger::builder()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .try_init();

        let auth_mock = MockServer::start().await;
        let upstream_mock = MockServer::start().await;

        let config = GatewayConfig::for_test_with_mocks(&auth_mock, &upstream_mock);
        let state = AppState::new(&config).expect("Failed to create test state");
        let app = create_app(state.clone()).await;
        let metrics_app = create_metrics_app(state.clone());

        Self {
            app,
            metrics_app,
            state,
            auth_mock,
            upstream_mock,
        }
    }

    /// Sends a GET request without credentials
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        self.get_with_headers(uri, &[]).await
    }

    /// Fetches `/metrics` from the metrics router
    pub async fn get_metrics(&self) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/metrics")
            .body(Body::empty())
            .expect("Failed to build request");

        Self::collect(self.metrics_app.clone(), request).await
    }

    /// Sends a GET request presenting `token` as a bearer credential
    pub async fn get_with_token(&self, uri: impl AsRef<str>, token: &str) -> TestResponse {
        let authorization = format!("Bearer {}", token);
        self.get_with_headers(uri, &[("Authorization", authorization.as_str())])
            .await
    }

    /// Sends a GET request with custom headers
    pub async fn get_with_headers(
        &self,
        uri: impl AsRef<str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(uri.as_ref());
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a request and collects the response
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        Self::collect(self.app.clone(), request).await
    }

    async fn collect(router: Router, request: Request<Body>) -> TestResponse {
        let response = router
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        let body = String::from_utf8_lossy(&bytes).to_string();
        let json = if !bytes.is_empty() {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse { status, json, body }
    }
}

/// Response from a test request
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
    /// Raw response body
    pub body: String,
}

impl TestResponse {
    /// Asserts that the response has the expected status code
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            self.body
        );
        self
    }

    /// Asserts that the response status is OK (200)
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }
}

use crate::clock::{Clock, ManualClock};
use crate::config::Settings;
use crate::{create_app, create_metrics_app};
use crate::state::AppState;
use crate::store::memory::InMemoryStore;
use crate::store::offline::OfflineStore;
use crate::store::Store;
use axum::body::Body;
use axum::Router;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Test fixture running the token service router in-process.
///
/// Requests are sent with `tower::ServiceExt::oneshot`; no socket is opened. The service
/// reads time from a `ManualClock`, so tests can move past token expiry.
///
/// ```rust
/// let fixture = TestFixture::new().await;
/// let response = fixture.post("/issue", &json!({})).await;
/// response.assert_ok();
/// fixture.clock.advance(601);
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// The router served on the metrics port
    pub metrics_app: Router,
    /// Shared application state, for inspecting metrics
    pub state: AppState,
    /// Clock used by issuance and introspection
    pub clock: ManualClock,
}

impl TestFixture {
    /// Fixture backed by an empty in-memory store
    pub async fn new() -> Self {
        Self::with_store(Store::InMemory(InMemoryStore::new())).await
    }

    /// Fixture whose token store fails every operation
    pub async fn offline() -> Self {
        Self::with_store(Store::Offline(OfflineStore)).await
    }

    pub async fn with_store(store: Store) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let clock = ManualClock::at(1_700_000_000);
        let state = AppState::new(Settings::for_test(), store, Arc::new(clock.clone()))
            .expect("Failed to create test state");
        let app = create_app(state.clone()).await;
        let metrics_app = create_metrics_app(state.clone());

        Self {
            app,
            metrics_app,
            state,
            clock,
        }
    }

    /// Initializes the test logger with the given level
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    pub fn clock_now(&self) -> u64 {
        self.clock.now()
    }

    /// Sends a GET request to the specified URI
    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri.as_ref())
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
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

    /// Sends a POST request with a JSON body to the specified URI
    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri.as_ref())
            .header("Content-Type", "application/json")
            .body(Body::from(json_body))
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a POST request with a raw body and custom headers
    pub async fn post_raw(
        &self,
        uri: impl AsRef<str>,
        body: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(Method::POST).uri(uri.as_ref());
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = builder
            .body(Body::from(body.to_string()))
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
        // Try to parse as JSON, defaulting to empty object if parsing fails or empty body
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

    /// Converts the response body to the specified type
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}

pub(crate) mod health;
pub(crate) mod introspect;
pub(crate) mod issue;
pub(crate) mod metrics;
pub(crate) mod models;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;

/// Combines all API routes into a single router
pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/issue", post(issue::issue_handler))
        .route("/introspect", post(introspect::introspect_handler))
}

/// Routes served on the dedicated metrics port
pub(super) fn metrics_router() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics::metrics_handler))
}

pub(crate) mod accounts;
pub(crate) mod health;

use crate::state::AppState;
use axum::routing::get;
use axum::Router;

/// Combines all gateway routes into a single router
pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/accounts", get(accounts::accounts_handler))
}

/// Routes served on the dedicated metrics port
pub(super) fn metrics_router() -> Router<AppState> {
    Router::new().route("/metrics", get(health::metrics_handler))
}

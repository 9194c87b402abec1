mod api;
mod clock;
mod config;
mod errors;
mod introspection;
mod issuance;
mod metrics;
mod openapi;
mod state;
mod store;
#[cfg(test)]
mod test_utils;
mod token;

use crate::clock::SystemClock;
use crate::state::AppState;
use axum::Router;
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Load configuration
    let settings = match config::Settings::new() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Connect the token store
    let store = match store::create_store(&settings).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize token store: {}", e);
            std::process::exit(1);
        }
    };

    if matches!(store, store::Store::InMemory(_)) {
        warn!("Using the in-memory token store, issued tokens will not survive a restart");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let metrics_addr = SocketAddr::from(([0, 0, 0, 0], settings.metrics_port));
    info!(
        "Issuing tokens with a TTL of {}s from the {} store",
        settings.access_ttl_sec, settings.store.backend
    );

    let state = match AppState::new(settings, store, Arc::new(SystemClock)) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize metrics: {}", e);
            std::process::exit(1);
        }
    };

    let metrics_app = create_metrics_app(state.clone());
    let app = create_app(state).await;

    let metrics_listener = match tokio::net::TcpListener::bind(&metrics_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind metrics listener to {}: {}", metrics_addr, e);
            std::process::exit(1);
        }
    };
    info!("Serving metrics on {}", metrics_addr);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(metrics_listener, metrics_app).await {
            error!("Metrics server error: {}", e);
        }
    });

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Token service running on {}, press Ctrl+C to stop", addr);
    let serve = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = serve {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shutdown complete");
}

/// Create a new application instance with a given state
pub async fn create_app(state: AppState) -> Router {
    // Create OpenAPI documentation
    let (openapi_router, api_doc) =
        OpenApiRouter::with_openapi(openapi::ApiDoc::openapi()).split_for_parts();

    Router::new()
        .merge(api::router())
        .merge(openapi_router)
        .merge(Scalar::with_url("/scalar", api_doc))
        .with_state(state)
}

/// Router for the dedicated metrics listener
pub fn create_metrics_app(state: AppState) -> Router {
    api::metrics_router().with_state(state)
}

// Simple signal handler that works on all platforms
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}

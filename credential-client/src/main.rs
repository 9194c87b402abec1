mod config;

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use credential_client::{HttpIssuer, RotationAgent, RotationAgentOptions};
use log::{error, info};
use prometheus::{Encoder, Registry, TextEncoder};
use std::net::SocketAddr;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Load configuration
    let config = match config::AgentConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let registry = Registry::new();
    let agent = RotationAgent::start_with_opt(
        HttpIssuer::with_timeout(config.issue_url.clone(), config.request_timeout()),
        RotationAgentOptions {
            subject: config.service_id.clone(),
            scope: config.scope.clone(),
            rotate_interval: config.interval(),
            request_timeout: config.request_timeout(),
        },
    );
    if let Err(e) = agent.register_metrics(&registry) {
        error!("Failed to register rotation metrics: {}", e);
        std::process::exit(1);
    }

    let app = Router::new()
        .route("/metrics", get(metrics))
        .with_state(registry);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!(
        "Rotation agent for '{}' running, metrics on {}",
        config.service_id, addr
    );
    let serve = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    if let Err(e) = serve {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    // Stop the rotation loop before exiting
    agent.stop();
    info!(
        "Rotation agent stopped after {} rotations and {} errors",
        agent.rotations(),
        agent.errors()
    );
}

async fn metrics(State(registry): State<Registry>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    match encoder.encode(&registry.gather(), &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [(CONTENT_TYPE, encoder.format_type().to_string())],
            buffer,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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

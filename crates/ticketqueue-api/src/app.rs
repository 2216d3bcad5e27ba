//! Application builder: wires router, middleware, and state into an Axum app
//! and runs it.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use ticketqueue_auth::JwtDecoder;
use ticketqueue_core::config::{AppConfig, CorsConfig};
use ticketqueue_core::error::AppError;
use ticketqueue_core::result::AppResult;
use ticketqueue_core::traits::TokenAuthenticator;
use ticketqueue_inventory::InventoryManager;
use ticketqueue_realtime::QueueEngine;

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState, cors_config: &CorsConfig) -> Router {
    build_router(state)
        .layer(build_cors_layer(cors_config))
        .layer(TraceLayer::new_for_http())
}

/// Builds the application state from configuration. Must run inside a Tokio
/// runtime since it spawns one hub per tier.
pub async fn build_state(config: AppConfig) -> AppResult<AppState> {
    config.validate()?;

    info!(provider = %config.inventory.provider, "Initializing inventory");
    let inventory = InventoryManager::new(&config.inventory).await?;

    let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));
    let authenticator: Arc<dyn TokenAuthenticator> = jwt_decoder.clone();
    let engine = QueueEngine::new(&config.queue, inventory.source(), authenticator)?;

    Ok(AppState::new(config, engine, jwt_decoder, inventory))
}

/// Runs the TicketQueue server until Ctrl+C, then drains connections for at
/// most the configured grace period.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let cors = config.server.cors.clone();

    let state = build_state(config).await?;
    let app = build_app(state, &cors);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!(addr = %addr, "TicketQueue server listening");

    let (stopping_tx, stopping_rx) = oneshot::channel();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = stopping_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            return result.map_err(|e| AppError::internal(format!("Server error: {e}")));
        }
        _ = stopping_rx => {
            info!(grace_seconds = grace.as_secs(), "Shutdown requested, draining connections");
        }
    }

    match tokio::time::timeout(grace, server).await {
        Ok(result) => result.map_err(|e| AppError::internal(format!("Server error: {e}"))),
        Err(_) => {
            warn!("Grace period elapsed with connections still open");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

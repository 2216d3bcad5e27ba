//! Route definitions for the TicketQueue HTTP API.
//!
//! JSON endpoints are mounted under `/api`; the queue protocol itself runs
//! over `/ws/{tier}`.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// Build the router with every route and the shared state.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(health_routes())
        .merge(queue_routes());

    let ws_routes = Router::new().route("/ws/{tier}", get(handlers::ws::ws_upgrade));

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .with_state(state)
}

/// Liveness and engine counters
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Per-tier status and purchase completion
fn queue_routes() -> Router<AppState> {
    Router::new()
        .route("/queue/{tier}/status", get(handlers::queue::status))
        .route("/queue/{tier}/complete", post(handlers::queue::complete))
}

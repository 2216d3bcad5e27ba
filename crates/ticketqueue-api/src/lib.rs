//! # ticketqueue-api
//!
//! HTTP surface for TicketQueue built on Axum.
//!
//! Serves the `/ws/{tier}` queue protocol over WebSocket, the queue status and
//! purchase completion endpoints, health, CORS, request tracing, and the
//! mapping from [`AppError`](ticketqueue_core::AppError) to JSON responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state, run_server};
pub use error::ApiError;
pub use state::AppState;

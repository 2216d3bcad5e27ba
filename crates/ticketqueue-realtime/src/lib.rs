//! # ticketqueue-realtime
//!
//! Real-time admission engine for TicketQueue. Provides:
//!
//! - Client sessions with per-session locking and hub-facing signal channels
//! - The admission hub: one actor per ticket tier owning the transaction
//!   slots, the FIFO waiting list, and the inventory-driven ceiling
//! - The connection handler driving one client through authentication,
//!   waiting, and its transaction window
//! - A deadline-aware transport abstraction with an in-memory implementation
//! - Wire frames, price quotes, and engine metrics

pub mod connection;
pub mod hub;
pub mod message;
pub mod metrics;
pub mod quote;
pub mod server;
pub mod session;

pub use connection::handler::{ConnectionHandler, SessionOutcome};
pub use hub::{AdmissionHub, HubHandle, HubSnapshot};
pub use metrics::QueueMetrics;
pub use server::QueueEngine;
pub use session::ClientSession;

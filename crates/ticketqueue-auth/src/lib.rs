//! # ticketqueue-auth
//!
//! Bearer token handling for TicketQueue.
//!
//! ## Modules
//!
//! - `jwt`: HS256 token creation and validation; the decoder is the
//!   [`TokenAuthenticator`](ticketqueue_core::traits::TokenAuthenticator)
//!   used by the WebSocket handshake and the HTTP API.

pub mod jwt;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};

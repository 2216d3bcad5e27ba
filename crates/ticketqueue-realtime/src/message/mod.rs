//! Text frames exchanged with queue clients.

pub mod command;
pub mod notification;

pub use command::{ClientCommand, CommandError, MerchChoice};
pub use notification::{Notification, QueueError};

/// Sent once the bearer token has been accepted.
pub const AUTH_SUCCESS: &str = "authentication successful";
/// Sent when the session enters its transaction window.
pub const PROCEED_TRANSACTION: &str = "proceed transaction";
/// Sent when the purchase flow reports the session as completed.
pub const TRANSACTION_SUCCESSFUL: &str = "transaction successful";

/// Formats the queue position frame.
pub fn waiting_frame(position: usize) -> String {
    format!("WAITING QUEUE {position}")
}

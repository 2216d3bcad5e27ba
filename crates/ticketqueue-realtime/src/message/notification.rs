//! Server-to-client notifications pushed by the admission hub.

use std::fmt;

use thiserror::Error;

/// Error frames of the queue protocol. `Display` is the exact wire text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum QueueError {
    /// The identity already holds a queue position or a slot.
    #[error("already in queue")]
    AlreadyQueued,
    /// A `TOKEN` frame without a usable value.
    #[error("bad request")]
    BadRequest,
    /// The token failed validation.
    #[error("invalid token")]
    InvalidToken,
    /// Unknown frame, or a command the current state does not allow.
    #[error("invalid command")]
    InvalidCommand,
    /// Every pool of the tier is sold out.
    #[error("main event is full")]
    EventFull,
    /// The inventory source could not be read.
    #[error("error fetching data")]
    InventoryUnavailable,
}

/// Out-of-band message from the hub to one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Remaining stock after provisional holds: `M=<n> | N=<n>`.
    Stock {
        /// With-merch units left.
        with_merch: i64,
        /// No-merch units left.
        no_merch: i64,
    },
    /// Price quote after a merch selection: `PAYMENT CODE <n>`.
    Quote(i64),
    /// An error frame.
    Error(QueueError),
}

impl Notification {
    /// True when the session must leave the queue after forwarding this.
    ///
    /// Both cases are only sent for sessions the hub no longer tracks.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Error(QueueError::EventFull | QueueError::AlreadyQueued)
        )
    }
}

impl From<QueueError> for Notification {
    fn from(err: QueueError) -> Self {
        Self::Error(err)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stock {
                with_merch,
                no_merch,
            } => write!(f, "M={with_merch} | N={no_merch}"),
            Self::Quote(amount) => write!(f, "PAYMENT CODE {amount}"),
            Self::Error(err) => write!(f, "{err}"),
        }
    }
}

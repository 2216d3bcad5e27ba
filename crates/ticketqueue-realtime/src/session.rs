//! Per-connection client session.
//!
//! A session is shared between its connection handler and the admission hub.
//! Identity is written once; the flags both sides touch sit behind the
//! session's own lock, which is never held across a channel operation.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, mpsc, oneshot, watch};

use ticketqueue_core::result::AppResult;
use ticketqueue_core::types::SessionId;

use crate::message::Notification;

/// Latest queue-advancement signal from the hub.
///
/// Only the newest value matters, so it travels over a `watch` channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnSignal {
    /// Session admitted by the advancement that produced this signal, if any.
    pub next: Option<SessionId>,
    /// 1-based position of the receiver in the waiting list, 0 when not waiting.
    pub position: usize,
}

impl TurnSignal {
    /// Signal telling `session` it holds a slot.
    pub fn admitted(session: SessionId) -> Self {
        Self {
            next: Some(session),
            position: 0,
        }
    }

    /// Signal carrying a waiting position.
    pub fn waiting(next: Option<SessionId>, position: usize) -> Self {
        Self { next, position }
    }
}

/// Flags read and written by both the hub and the connection task.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFlags {
    /// Monotonic false -> true.
    pub authenticated: bool,
    /// True only while held in a waiting list.
    pub waiting: bool,
    /// Current pool choice while transacting.
    pub merch_selected: bool,
}

/// Receiving ends owned by the connection handler.
#[derive(Debug)]
pub struct SessionChannels {
    /// Queue advancement.
    pub turn: watch::Receiver<TurnSignal>,
    /// Hub notifications to forward to the wire.
    pub notifications: mpsc::UnboundedReceiver<Notification>,
    /// Completion: `Ok` from the purchase flow, `Err` from the transport.
    pub done: oneshot::Receiver<AppResult<()>>,
}

/// One client's state across its connection lifetime.
pub struct ClientSession {
    id: SessionId,
    identity: OnceLock<String>,
    flags: Mutex<SessionFlags>,
    turn: watch::Sender<TurnSignal>,
    notifications: mpsc::UnboundedSender<Notification>,
    done: Mutex<Option<oneshot::Sender<AppResult<()>>>>,
    connected_at: DateTime<Utc>,
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("id", &self.id)
            .field("identity", &self.identity.get())
            .field("connected_at", &self.connected_at)
            .finish()
    }
}

impl ClientSession {
    /// Creates a session and the channel ends its handler consumes.
    pub fn new() -> (Arc<Self>, SessionChannels) {
        let (turn_tx, turn_rx) = watch::channel(TurnSignal::default());
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = oneshot::channel();

        let session = Arc::new(Self {
            id: SessionId::new(),
            identity: OnceLock::new(),
            flags: Mutex::new(SessionFlags::default()),
            turn: turn_tx,
            notifications: notify_tx,
            done: Mutex::new(Some(done_tx)),
            connected_at: Utc::now(),
        });

        let channels = SessionChannels {
            turn: turn_rx,
            notifications: notify_rx,
            done: done_rx,
        };

        (session, channels)
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Authenticated identity, once set.
    pub fn identity(&self) -> Option<&str> {
        self.identity.get().map(String::as_str)
    }

    /// When the connection was accepted.
    pub fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Records the authenticated identity. Returns false if one was already set.
    pub async fn authenticate(&self, identity: String) -> bool {
        if self.identity.set(identity).is_err() {
            return false;
        }
        self.flags.lock().await.authenticated = true;
        true
    }

    /// Whether the session authenticated.
    pub async fn is_authenticated(&self) -> bool {
        self.flags.lock().await.authenticated
    }

    /// Whether the session sits in a waiting list.
    pub async fn is_waiting(&self) -> bool {
        self.flags.lock().await.waiting
    }

    /// Sets the waiting flag.
    pub async fn set_waiting(&self, waiting: bool) {
        self.flags.lock().await.waiting = waiting;
    }

    /// Whether the with-merch pool is selected.
    pub async fn merch_selected(&self) -> bool {
        self.flags.lock().await.merch_selected
    }

    /// Sets the merch selection.
    pub async fn set_merch_selected(&self, selected: bool) {
        self.flags.lock().await.merch_selected = selected;
    }

    /// Overwrites the turn signal.
    pub fn signal_turn(&self, signal: TurnSignal) {
        self.turn.send_replace(signal);
    }

    /// Queues a notification for the handler. Dropped if the handler is gone.
    pub fn notify(&self, notification: impl Into<Notification>) {
        let _ = self.notifications.send(notification.into());
    }

    /// Signals completion. Only the first call per session is delivered;
    /// returns whether this call was it.
    pub async fn finish(&self, result: AppResult<()>) -> bool {
        let sender = self.done.lock().await.take();
        match sender {
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::QueueError;
    use ticketqueue_core::error::AppError;

    #[tokio::test]
    async fn test_identity_is_set_once() {
        let (session, _channels) = ClientSession::new();
        assert!(!session.is_authenticated().await);
        assert!(session.authenticate("alice".to_string()).await);
        assert!(!session.authenticate("mallory".to_string()).await);
        assert_eq!(session.identity(), Some("alice"));
        assert!(session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_done_is_delivered_once() {
        let (session, channels) = ClientSession::new();
        assert!(session.finish(Ok(())).await);
        assert!(!session.finish(Err(AppError::transport("closed"))).await);
        assert!(channels.done.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_turn_signal_keeps_latest() {
        let (session, mut channels) = ClientSession::new();
        session.signal_turn(TurnSignal::waiting(None, 3));
        session.signal_turn(TurnSignal::waiting(None, 2));
        assert!(channels.turn.has_changed().unwrap());
        assert_eq!(channels.turn.borrow_and_update().position, 2);
    }

    #[tokio::test]
    async fn test_notifications_are_ordered() {
        let (session, mut channels) = ClientSession::new();
        session.notify(QueueError::InvalidCommand);
        session.notify(Notification::Quote(10));
        assert_eq!(
            channels.notifications.recv().await,
            Some(Notification::Error(QueueError::InvalidCommand))
        );
        assert_eq!(channels.notifications.recv().await, Some(Notification::Quote(10)));
    }
}

//! Per-connection control loop.
//!
//! Drives one client through authentication, the duplicate check,
//! registration, the (unbounded) wait for a slot, and the bounded
//! transaction window. Every exit path drops the registration guard, which
//! unregisters the session exactly once.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use ticketqueue_core::config::QueueConfig;
use ticketqueue_core::error::AppError;
use ticketqueue_core::result::AppResult;
use ticketqueue_core::traits::TokenAuthenticator;

use crate::hub::HubHandle;
use crate::message::{
    AUTH_SUCCESS, ClientCommand, CommandError, Notification, PROCEED_TRANSACTION, QueueError,
    TRANSACTION_SUCCESSFUL, waiting_frame,
};
use crate::metrics::QueueMetrics;
use crate::session::{ClientSession, SessionChannels};

use super::transport::{Deadline, Deadlined, FrameSink, FrameSource};

/// Inbound frames buffered between the reader task and the handler.
const INBOUND_BUFFER: usize = 16;

/// How a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// No valid token before the authentication deadline.
    AuthTimedOut,
    /// The identity was already waiting or transacting.
    Duplicate,
    /// The tier sold out before the session got a slot.
    EventFull,
    /// The purchase flow completed the session.
    Completed,
    /// The transaction window elapsed.
    TransactionTimedOut,
    /// The peer went away or the transport failed.
    Disconnected,
    /// The tier's hub is not running.
    Unavailable,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Auth,
    Queue,
    Transaction,
}

type Step<T> = Result<T, SessionOutcome>;

/// Serves queue connections for one tier.
#[derive(Clone)]
pub struct ConnectionHandler {
    hub: HubHandle,
    authenticator: Arc<dyn TokenAuthenticator>,
    metrics: Arc<QueueMetrics>,
    auth_timeout: Duration,
    transaction_timeout: Duration,
}

impl std::fmt::Debug for ConnectionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandler")
            .field("tier", &self.hub.tier())
            .field("auth_timeout", &self.auth_timeout)
            .field("transaction_timeout", &self.transaction_timeout)
            .finish()
    }
}

impl ConnectionHandler {
    /// Creates a handler bound to one hub.
    pub fn new(
        hub: HubHandle,
        authenticator: Arc<dyn TokenAuthenticator>,
        metrics: Arc<QueueMetrics>,
        config: &QueueConfig,
    ) -> Self {
        Self {
            hub,
            authenticator,
            metrics,
            auth_timeout: Duration::from_secs(config.auth_timeout_seconds),
            transaction_timeout: Duration::from_secs(config.transaction_timeout_seconds),
        }
    }

    /// The hub this handler registers sessions with.
    pub fn hub(&self) -> &HubHandle {
        &self.hub
    }

    /// Serves one connection to completion.
    pub async fn serve<R, W>(&self, source: R, sink: W) -> SessionOutcome
    where
        R: FrameSource,
        W: FrameSink,
    {
        let deadline = Deadline::new();
        let source = deadline.bind(source);
        let mut sink = deadline.bind(sink);
        let (session, channels) = ClientSession::new();

        QueueMetrics::incr(&self.metrics.connections_opened);
        debug!(session_id = %session.id(), tier = self.hub.tier(), "Connection accepted");

        let outcome = match self
            .drive(&session, channels, &deadline, source, &mut sink)
            .await
        {
            Ok(outcome) | Err(outcome) => outcome,
        };

        sink.close().await;
        QueueMetrics::incr(&self.metrics.connections_closed);
        if matches!(
            outcome,
            SessionOutcome::AuthTimedOut | SessionOutcome::TransactionTimedOut
        ) {
            QueueMetrics::incr(&self.metrics.deadlines_expired);
        }

        info!(
            session_id = %session.id(),
            identity = session.identity().unwrap_or("-"),
            tier = self.hub.tier(),
            ?outcome,
            connected_ms = (Utc::now() - session.connected_at()).num_milliseconds(),
            "Connection closed"
        );
        outcome
    }

    async fn drive<R, W>(
        &self,
        session: &Arc<ClientSession>,
        channels: SessionChannels,
        deadline: &Deadline,
        mut source: Deadlined<R>,
        sink: &mut Deadlined<W>,
    ) -> Step<SessionOutcome>
    where
        R: FrameSource,
        W: FrameSink,
    {
        deadline.set_after(self.auth_timeout);
        let identity = self.authenticate(session, &mut source, sink).await?;
        deadline.clear();

        match self.hub.is_queued(&identity).await {
            Ok(false) => {}
            Ok(true) => {
                info!(identity = %identity, tier = self.hub.tier(), "Identity already queued");
                QueueMetrics::incr(&self.metrics.rejected_duplicate);
                send(sink, &QueueError::AlreadyQueued.to_string(), Phase::Queue).await?;
                return Ok(SessionOutcome::Duplicate);
            }
            Err(e) => {
                warn!(error = %e, "Queue check failed");
                return Ok(SessionOutcome::Unavailable);
            }
        }

        let SessionChannels {
            mut turn,
            mut notifications,
            mut done,
        } = channels;

        let mut guard = self.hub.register(Arc::clone(session));

        let (inbound_tx, mut inbound) = mpsc::channel(INBOUND_BUFFER);
        let _reader = ReaderTask(tokio::spawn(forward_frames(
            source,
            Arc::clone(session),
            inbound_tx,
        )));

        loop {
            tokio::select! {
                biased;
                changed = turn.changed() => {
                    if changed.is_err() {
                        return Ok(SessionOutcome::Unavailable);
                    }
                    let signal = *turn.borrow_and_update();
                    if signal.next == Some(session.id()) {
                        break;
                    }
                    if signal.position > 0 {
                        send(sink, &waiting_frame(signal.position), Phase::Queue).await?;
                    }
                }
                Some(notification) = notifications.recv() => {
                    send(sink, &notification.to_string(), Phase::Queue).await?;
                    if notification.is_terminal() {
                        guard.disarm();
                        return Ok(match notification {
                            Notification::Error(QueueError::EventFull) => SessionOutcome::EventFull,
                            _ => SessionOutcome::Duplicate,
                        });
                    }
                }
                result = &mut done => return Ok(finished(result)),
                Some(_) = inbound.recv() => {
                    send(sink, &QueueError::InvalidCommand.to_string(), Phase::Queue).await?;
                }
            }
        }

        deadline.set_after(self.transaction_timeout);
        send(sink, PROCEED_TRANSACTION, Phase::Transaction).await?;

        loop {
            tokio::select! {
                biased;
                result = &mut done => {
                    if let Ok(Ok(())) = result {
                        send(sink, TRANSACTION_SUCCESSFUL, Phase::Transaction).await?;
                        QueueMetrics::incr(&self.metrics.sessions_completed);
                    }
                    return Ok(finished(result));
                }
                Some(notification) = notifications.recv() => {
                    send(sink, &notification.to_string(), Phase::Transaction).await?;
                }
                Some(frame) = inbound.recv() => match ClientCommand::parse(&frame) {
                    Ok(ClientCommand::Merch(choice)) => {
                        debug!(session_id = %session.id(), %choice, "Merch selection requested");
                        self.hub.operation(Arc::clone(session), choice);
                    }
                    _ => {
                        send(sink, &QueueError::InvalidCommand.to_string(), Phase::Transaction).await?;
                    }
                },
            }
        }
    }

    /// Reads frames until a valid token arrives. Malformed frames and
    /// rejected tokens are answered and retried until the deadline.
    async fn authenticate<R, W>(
        &self,
        session: &ClientSession,
        source: &mut Deadlined<R>,
        sink: &mut Deadlined<W>,
    ) -> Step<String>
    where
        R: FrameSource,
        W: FrameSink,
    {
        loop {
            let frame = match source.read_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => return Err(SessionOutcome::Disconnected),
                Err(e) => return Err(transport_failure(&e, Phase::Auth)),
            };

            let token = match ClientCommand::parse(&frame) {
                Ok(ClientCommand::Token(token)) => token,
                Err(CommandError::MalformedToken) => {
                    send(sink, &QueueError::BadRequest.to_string(), Phase::Auth).await?;
                    continue;
                }
                Ok(ClientCommand::Merch(_)) | Err(CommandError::Unknown) => {
                    send(sink, &QueueError::InvalidCommand.to_string(), Phase::Auth).await?;
                    continue;
                }
            };

            match self.authenticator.authenticate(&token).await {
                Ok(identity) => {
                    session.authenticate(identity.clone()).await;
                    QueueMetrics::incr(&self.metrics.sessions_authenticated);
                    send(sink, AUTH_SUCCESS, Phase::Auth).await?;
                    debug!(session_id = %session.id(), identity = %identity, "Session authenticated");
                    return Ok(identity);
                }
                Err(e) => {
                    debug!(session_id = %session.id(), error = %e, "Token rejected");
                    send(sink, &QueueError::InvalidToken.to_string(), Phase::Auth).await?;
                }
            }
        }
    }
}

/// Aborts the reader task when the handler returns.
struct ReaderTask(JoinHandle<()>);

impl Drop for ReaderTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Forwards inbound frames to the handler. A closed or failed read is
/// reported through the session's completion signal.
async fn forward_frames<R: FrameSource>(
    mut source: Deadlined<R>,
    session: Arc<ClientSession>,
    inbound: mpsc::Sender<String>,
) {
    let result = loop {
        match source.read_frame().await {
            Ok(Some(frame)) => {
                if inbound.send(frame).await.is_err() {
                    return;
                }
            }
            Ok(None) => break Err(AppError::transport("Peer closed the connection")),
            Err(e) => break Err(e),
        }
    };

    if let Err(e) = &result {
        debug!(session_id = %session.id(), error = %e, "Reader stopped");
    }
    session.finish(result).await;
}

async fn send<W: FrameSink>(sink: &mut W, frame: &str, phase: Phase) -> Step<()> {
    sink.write_frame(frame)
        .await
        .map_err(|e| transport_failure(&e, phase))
}

fn transport_failure(err: &AppError, phase: Phase) -> SessionOutcome {
    debug!(error = %err, ?phase, "Transport failure");
    match (err.is_timeout(), phase) {
        (true, Phase::Auth) => SessionOutcome::AuthTimedOut,
        (true, Phase::Transaction) => SessionOutcome::TransactionTimedOut,
        _ => SessionOutcome::Disconnected,
    }
}

fn finished(result: Result<AppResult<()>, oneshot::error::RecvError>) -> SessionOutcome {
    match result {
        Ok(Ok(())) => SessionOutcome::Completed,
        Ok(Err(e)) if e.is_timeout() => SessionOutcome::TransactionTimedOut,
        _ => SessionOutcome::Disconnected,
    }
}

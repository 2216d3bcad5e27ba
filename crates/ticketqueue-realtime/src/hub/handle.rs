//! Cloneable handle to a running admission hub.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use ticketqueue_core::config::TierConfig;
use ticketqueue_core::error::AppError;
use ticketqueue_core::result::AppResult;
use ticketqueue_core::traits::PoolSnapshot;
use ticketqueue_core::types::{PoolId, SessionId};

use crate::message::MerchChoice;
use crate::session::ClientSession;

use super::guard::RegistrationGuard;

/// Messages consumed by the hub loop.
pub(crate) enum HubCommand {
    Register(Arc<ClientSession>),
    Unregister(SessionId),
    Operation {
        session: Arc<ClientSession>,
        choice: MerchChoice,
    },
    IsQueued {
        identity: String,
        reply: oneshot::Sender<bool>,
    },
    ClientInTransaction {
        identity: String,
        reply: oneshot::Sender<Option<Arc<ClientSession>>>,
    },
    Snapshot {
        reply: oneshot::Sender<HubSnapshot>,
    },
}

/// Point-in-time view of one hub.
#[derive(Debug, Clone, Serialize)]
pub struct HubSnapshot {
    /// Tier slug.
    pub tier: String,
    /// Tier display name.
    pub name: String,
    /// Sessions holding a slot.
    pub transacting: usize,
    /// Sessions in the waiting list.
    pub waiting: usize,
    /// Current ceiling on concurrent slots.
    pub ceiling: usize,
    /// Configured ceiling.
    pub max_transaction: usize,
    /// Last known with-merch pool figures.
    pub with_merch: Option<PoolSnapshot>,
    /// Last known no-merch pool figures.
    pub no_merch: Option<PoolSnapshot>,
}

/// Sends commands to one hub's mailbox.
///
/// Mutating calls are fire-and-forget; queries await a reply.
#[derive(Clone)]
pub struct HubHandle {
    tier: Arc<TierConfig>,
    mailbox: mpsc::UnboundedSender<HubCommand>,
}

impl std::fmt::Debug for HubHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubHandle")
            .field("tier", &self.tier.slug)
            .field("running", &!self.mailbox.is_closed())
            .finish()
    }
}

impl HubHandle {
    pub(crate) fn new(tier: TierConfig, mailbox: mpsc::UnboundedSender<HubCommand>) -> Self {
        Self {
            tier: Arc::new(tier),
            mailbox,
        }
    }

    /// Tier slug this hub governs.
    pub fn tier(&self) -> &str {
        &self.tier.slug
    }

    /// Tier configuration.
    pub fn tier_config(&self) -> &TierConfig {
        &self.tier
    }

    /// Whether `pool` is one of the two pools this hub governs.
    pub fn governs(&self, pool: &PoolId) -> bool {
        self.tier.with_merch_pool == *pool || self.tier.no_merch_pool == *pool
    }

    /// Asks the hub to track an authenticated session.
    ///
    /// The returned guard unregisters the session when dropped.
    pub fn register(&self, session: Arc<ClientSession>) -> RegistrationGuard {
        let guard = RegistrationGuard::new(self.clone(), session.id());
        self.send(HubCommand::Register(session));
        guard
    }

    /// Removes a session from whichever list holds it. No-op if untracked.
    pub fn unregister(&self, session: SessionId) {
        self.send(HubCommand::Unregister(session));
    }

    /// Requests a merch selection change for a transacting session.
    pub fn operation(&self, session: Arc<ClientSession>, choice: MerchChoice) {
        self.send(HubCommand::Operation { session, choice });
    }

    /// Whether `identity` is waiting or transacting.
    pub async fn is_queued(&self, identity: &str) -> AppResult<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::IsQueued {
            identity: identity.to_string(),
            reply,
        });
        self.await_reply(rx).await
    }

    /// The session holding a slot for `identity`, if any.
    pub async fn client_in_transaction(
        &self,
        identity: &str,
    ) -> AppResult<Option<Arc<ClientSession>>> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::ClientInTransaction {
            identity: identity.to_string(),
            reply,
        });
        self.await_reply(rx).await
    }

    /// Current list sizes, ceiling, and last known pool figures.
    pub async fn snapshot(&self) -> AppResult<HubSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Snapshot { reply });
        self.await_reply(rx).await
    }

    fn send(&self, command: HubCommand) {
        if self.mailbox.send(command).is_err() {
            warn!(tier = %self.tier.slug, "Admission hub is not running, command dropped");
        }
    }

    async fn await_reply<T>(&self, rx: oneshot::Receiver<T>) -> AppResult<T> {
        rx.await.map_err(|_| {
            AppError::service_unavailable(format!(
                "Admission hub for tier '{}' is not running",
                self.tier.slug
            ))
        })
    }
}

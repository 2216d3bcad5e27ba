//! Admission hub: the single authority over one tier's transaction slots.
//!
//! All list mutations happen inside one task that drains an unbounded
//! mailbox, so Register, Unregister, and Operation are totally ordered and
//! the lists need no lock. The hub never returns errors to callers; failed
//! inventory reads become notifications and the loop keeps running on the
//! last known figures.

pub mod guard;
pub mod handle;

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use ticketqueue_core::config::TierConfig;
use ticketqueue_core::result::AppResult;
use ticketqueue_core::traits::{InventorySource, PoolSnapshot};
use ticketqueue_core::types::SessionId;

use crate::message::{MerchChoice, Notification, QueueError};
use crate::metrics::QueueMetrics;
use crate::quote::QuoteStrategy;
use crate::session::{ClientSession, TurnSignal};

pub use guard::RegistrationGuard;
pub use handle::{HubHandle, HubSnapshot};

use handle::HubCommand;

/// State owned by a hub's processing task.
pub struct AdmissionHub {
    tier: TierConfig,
    inventory: Arc<dyn InventorySource>,
    quote: Arc<dyn QuoteStrategy>,
    metrics: Arc<QueueMetrics>,
    transaction: Vec<Arc<ClientSession>>,
    waiting: VecDeque<Arc<ClientSession>>,
    ceiling: usize,
    with_merch: Option<PoolSnapshot>,
    no_merch: Option<PoolSnapshot>,
}

impl AdmissionHub {
    /// Starts a hub for `tier` on the current runtime and returns its handle.
    ///
    /// The hub stops once every handle (and registration guard) is dropped.
    pub fn spawn(
        tier: TierConfig,
        inventory: Arc<dyn InventorySource>,
        quote: Arc<dyn QuoteStrategy>,
        metrics: Arc<QueueMetrics>,
    ) -> HubHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = HubHandle::new(tier.clone(), tx);

        let hub = Self {
            ceiling: tier.max_transaction,
            tier,
            inventory,
            quote,
            metrics,
            transaction: Vec::new(),
            waiting: VecDeque::new(),
            with_merch: None,
            no_merch: None,
        };
        tokio::spawn(hub.run(rx));

        handle
    }

    async fn run(mut self, mut mailbox: mpsc::UnboundedReceiver<HubCommand>) {
        self.recompute_ceiling().await;
        info!(
            tier = %self.tier.slug,
            max_transaction = self.tier.max_transaction,
            ceiling = self.ceiling,
            "Admission hub started"
        );

        while let Some(command) = mailbox.recv().await {
            self.dispatch(command).await;
        }

        info!(tier = %self.tier.slug, "Admission hub stopped");
    }

    async fn dispatch(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register(session) => self.register(session).await,
            HubCommand::Unregister(session) => self.unregister(session).await,
            HubCommand::Operation { session, choice } => self.operation(&session, choice).await,
            HubCommand::IsQueued { identity, reply } => {
                let _ = reply.send(self.is_queued(&identity));
            }
            HubCommand::ClientInTransaction { identity, reply } => {
                let found = self
                    .transaction
                    .iter()
                    .find(|s| s.identity() == Some(identity.as_str()))
                    .cloned();
                let _ = reply.send(found);
            }
            HubCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    async fn register(&mut self, session: Arc<ClientSession>) {
        let Some(identity) = session.identity() else {
            warn!(session_id = %session.id(), "Refusing to register an unauthenticated session");
            session.notify(QueueError::InvalidCommand);
            return;
        };

        if self.is_queued(identity) || self.is_tracked(session.id()) {
            info!(tier = %self.tier.slug, identity, "Duplicate registration rejected");
            QueueMetrics::incr(&self.metrics.rejected_duplicate);
            session.notify(QueueError::AlreadyQueued);
            return;
        }

        self.recompute_ceiling().await;

        if self.is_exhausted() {
            self.advance().await;
            info!(tier = %self.tier.slug, identity, "Tier sold out, registration refused");
            QueueMetrics::incr(&self.metrics.rejected_full);
            session.notify(QueueError::EventFull);
            return;
        }

        if self.no_merch.as_ref().is_some_and(PoolSnapshot::is_exhausted) {
            session.set_merch_selected(true).await;
        }

        if self.waiting.is_empty() && self.transaction.len() < self.ceiling {
            self.admit(session).await;
            self.broadcast_stock().await;
            return;
        }

        session.set_waiting(true).await;
        self.waiting.push_back(Arc::clone(&session));
        let position = self.waiting.len();
        QueueMetrics::incr(&self.metrics.sessions_queued);
        session.signal_turn(TurnSignal::waiting(None, position));
        info!(
            tier = %self.tier.slug,
            identity,
            position,
            ceiling = self.ceiling,
            "Session queued"
        );

        if self.advance().await > 0 {
            self.broadcast_stock().await;
        }
    }

    async fn unregister(&mut self, id: SessionId) {
        let was_waiting = if let Some(idx) = self.transaction.iter().position(|s| s.id() == id) {
            self.transaction.remove(idx);
            false
        } else if let Some(idx) = self.waiting.iter().position(|s| s.id() == id) {
            if let Some(session) = self.waiting.remove(idx) {
                session.set_waiting(false).await;
            }
            true
        } else {
            debug!(tier = %self.tier.slug, session_id = %id, "Unregister for untracked session ignored");
            return;
        };

        debug!(tier = %self.tier.slug, session_id = %id, was_waiting, "Session unregistered");

        self.recompute_ceiling().await;
        let admitted = self.advance().await;
        if was_waiting && admitted == 0 {
            self.signal_positions(None);
        }
        self.broadcast_stock().await;
    }

    async fn operation(&mut self, session: &Arc<ClientSession>, choice: MerchChoice) {
        if !self.transaction.iter().any(|s| s.id() == session.id()) {
            debug!(session_id = %session.id(), "Operation from a session without a slot");
            session.notify(QueueError::InvalidCommand);
            return;
        }

        let (with_merch, no_merch) = match self.read_pools().await {
            Ok(pools) => pools,
            Err(_) => {
                session.notify(QueueError::InventoryUnavailable);
                return;
            }
        };

        let target = match choice {
            MerchChoice::WithMerch => with_merch,
            MerchChoice::NoMerch => no_merch,
        };
        if target.is_exhausted() {
            debug!(session_id = %session.id(), %choice, "Selection refused, pool sold out");
            session.notify(QueueError::InvalidCommand);
            return;
        }

        session.set_merch_selected(choice.is_with_merch()).await;
        self.broadcast_stock().await;
        session.notify(Notification::Quote(self.quote.quote(&target)));
    }

    /// Moves `session` into a slot and tells it so.
    async fn admit(&mut self, session: Arc<ClientSession>) {
        session.set_waiting(false).await;
        session.signal_turn(TurnSignal::admitted(session.id()));
        QueueMetrics::incr(&self.metrics.sessions_admitted);
        info!(
            tier = %self.tier.slug,
            identity = session.identity().unwrap_or_default(),
            transacting = self.transaction.len() + 1,
            ceiling = self.ceiling,
            "Session admitted"
        );
        self.transaction.push(session);
    }

    /// Fills free slots from the front of the waiting list, or flushes the
    /// list when the tier is sold out. Returns how many sessions were admitted.
    async fn advance(&mut self) -> usize {
        if self.waiting.is_empty() {
            return 0;
        }

        if self.is_exhausted() {
            let flushed = self.waiting.len();
            for session in self.waiting.drain(..) {
                session.set_waiting(false).await;
                session.notify(QueueError::EventFull);
            }
            QueueMetrics::add(&self.metrics.rejected_full, flushed as u64);
            info!(tier = %self.tier.slug, flushed, "Tier sold out, waiting list cleared");
            return 0;
        }

        let mut admitted = 0;
        let mut last = None;
        while self.transaction.len() < self.ceiling {
            let Some(next) = self.waiting.pop_front() else {
                break;
            };
            last = Some(next.id());
            self.admit(next).await;
            admitted += 1;
        }

        if last.is_some() {
            self.signal_positions(last);
        }
        admitted
    }

    fn signal_positions(&self, next: Option<SessionId>) {
        for (idx, session) in self.waiting.iter().enumerate() {
            session.signal_turn(TurnSignal::waiting(next, idx + 1));
        }
    }

    /// Pushes remaining stock, net of one provisional unit per slot holder,
    /// to every transacting session.
    async fn broadcast_stock(&mut self) {
        if self.transaction.is_empty() {
            return;
        }

        let (mut with_merch, mut no_merch) = match self.read_pools().await {
            Ok(pools) => pools,
            Err(_) => {
                for session in &self.transaction {
                    session.notify(QueueError::InventoryUnavailable);
                }
                return;
            }
        };

        for session in &self.transaction {
            if session.merch_selected().await {
                with_merch.registered += 1;
            } else {
                no_merch.registered += 1;
            }
        }

        let stock = Notification::Stock {
            with_merch: with_merch.remaining(),
            no_merch: no_merch.remaining(),
        };
        debug!(tier = %self.tier.slug, %stock, "Broadcasting stock");
        for session in &self.transaction {
            session.notify(stock.clone());
        }
    }

    /// Clamps the ceiling down to `remaining + transacting`. The ceiling
    /// starts at the configured maximum and only ever moves down; it keeps its
    /// value when the inventory cannot be read.
    async fn recompute_ceiling(&mut self) {
        if self.read_pools().await.is_err() {
            return;
        }
        if let Some(remaining) = self.remaining() {
            let bound = usize::try_from(remaining).unwrap_or(0) + self.transaction.len();
            self.ceiling = self.ceiling.min(bound);
        }
    }

    async fn read_pools(&mut self) -> AppResult<(PoolSnapshot, PoolSnapshot)> {
        let result: AppResult<(PoolSnapshot, PoolSnapshot)> = async {
            let with_merch = self.inventory.get_by_id(&self.tier.with_merch_pool).await?;
            let no_merch = self.inventory.get_by_id(&self.tier.no_merch_pool).await?;
            Ok((with_merch, no_merch))
        }
        .await;

        match result {
            Ok((with_merch, no_merch)) => {
                self.with_merch = Some(with_merch.clone());
                self.no_merch = Some(no_merch.clone());
                Ok((with_merch, no_merch))
            }
            Err(e) => {
                QueueMetrics::incr(&self.metrics.inventory_failures);
                warn!(tier = %self.tier.slug, error = %e, "Inventory read failed");
                Err(e)
            }
        }
    }

    /// Units left across both pools, from the last successful read.
    fn remaining(&self) -> Option<i64> {
        match (&self.with_merch, &self.no_merch) {
            (Some(with_merch), Some(no_merch)) => Some(with_merch.remaining() + no_merch.remaining()),
            _ => None,
        }
    }

    fn is_exhausted(&self) -> bool {
        self.remaining() == Some(0)
    }

    fn is_queued(&self, identity: &str) -> bool {
        self.transaction
            .iter()
            .chain(self.waiting.iter())
            .any(|s| s.identity() == Some(identity))
    }

    fn is_tracked(&self, id: SessionId) -> bool {
        self.transaction
            .iter()
            .chain(self.waiting.iter())
            .any(|s| s.id() == id)
    }

    fn snapshot(&self) -> HubSnapshot {
        HubSnapshot {
            tier: self.tier.slug.clone(),
            name: self.tier.name.clone(),
            transacting: self.transaction.len(),
            waiting: self.waiting.len(),
            ceiling: self.ceiling,
            max_transaction: self.tier.max_transaction,
            with_merch: self.with_merch.clone(),
            no_merch: self.no_merch.clone(),
        }
    }
}

//! Deferred unregistration.

use tracing::debug;

use ticketqueue_core::types::SessionId;

use super::handle::HubHandle;

/// Unregisters its session from the hub when dropped.
///
/// Every exit path of a connection handler drops exactly one guard, so the
/// hub hears about a departing session exactly once.
#[derive(Debug)]
#[must_use = "dropping the guard unregisters the session immediately"]
pub struct RegistrationGuard {
    hub: HubHandle,
    session: SessionId,
    armed: bool,
}

impl RegistrationGuard {
    pub(crate) fn new(hub: HubHandle, session: SessionId) -> Self {
        Self {
            hub,
            session,
            armed: true,
        }
    }

    /// Skips the unregistration, for sessions the hub has already dropped.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Session this guard releases.
    pub fn session(&self) -> SessionId {
        self.session
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        if self.armed {
            debug!(session_id = %self.session, tier = self.hub.tier(), "Releasing queue registration");
            self.hub.unregister(self.session);
        }
    }
}

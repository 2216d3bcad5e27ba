//! Queue engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level counters shared by every hub and connection handler.
#[derive(Debug, Default)]
pub struct QueueMetrics {
    /// Connections accepted by a handler
    pub connections_opened: AtomicU64,
    /// Connections whose handler returned
    pub connections_closed: AtomicU64,
    /// Sessions that presented a valid token
    pub sessions_authenticated: AtomicU64,
    /// Sessions placed on a waiting list
    pub sessions_queued: AtomicU64,
    /// Sessions moved into a transaction slot
    pub sessions_admitted: AtomicU64,
    /// Sessions completed by the purchase flow
    pub sessions_completed: AtomicU64,
    /// Queue attempts refused because the identity was already tracked
    pub rejected_duplicate: AtomicU64,
    /// Sessions turned away or flushed because the tier sold out
    pub rejected_full: AtomicU64,
    /// Authentication or transaction deadlines that elapsed
    pub deadlines_expired: AtomicU64,
    /// Failed inventory reads
    pub inventory_failures: AtomicU64,
}

impl QueueMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter by one.
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment a counter by `n`.
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    /// Connections currently being served.
    pub fn connections_active(&self) -> u64 {
        let opened = self.connections_opened.load(Ordering::Relaxed);
        let closed = self.connections_closed.load(Ordering::Relaxed);
        opened.saturating_sub(closed)
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_active: self.connections_active(),
            sessions_authenticated: self.sessions_authenticated.load(Ordering::Relaxed),
            sessions_queued: self.sessions_queued.load(Ordering::Relaxed),
            sessions_admitted: self.sessions_admitted.load(Ordering::Relaxed),
            sessions_completed: self.sessions_completed.load(Ordering::Relaxed),
            rejected_duplicate: self.rejected_duplicate.load(Ordering::Relaxed),
            rejected_full: self.rejected_full.load(Ordering::Relaxed),
            deadlines_expired: self.deadlines_expired.load(Ordering::Relaxed),
            inventory_failures: self.inventory_failures.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Connections ever accepted
    pub connections_opened: u64,
    /// Connections currently open
    pub connections_active: u64,
    /// Sessions that authenticated
    pub sessions_authenticated: u64,
    /// Sessions that had to wait
    pub sessions_queued: u64,
    /// Sessions admitted to a slot
    pub sessions_admitted: u64,
    /// Sessions completed
    pub sessions_completed: u64,
    /// Duplicate queue attempts
    pub rejected_duplicate: u64,
    /// Sold-out rejections
    pub rejected_full: u64,
    /// Elapsed deadlines
    pub deadlines_expired: u64,
    /// Failed inventory reads
    pub inventory_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_connections() {
        let metrics = QueueMetrics::new();
        QueueMetrics::incr(&metrics.connections_opened);
        QueueMetrics::incr(&metrics.connections_opened);
        QueueMetrics::incr(&metrics.connections_closed);
        QueueMetrics::add(&metrics.rejected_full, 3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.connections_active, 1);
        assert_eq!(snapshot.rejected_full, 3);
    }
}

//! Internal counters
//!
//! Nothing in the real-time path surfaces errors to users; dropped events,
//! failed sends and defensive no-ops are counted here instead so they can be
//! inspected through `/internal/stats`.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Gateway-wide diagnostic counters
#[derive(Debug, Default)]
pub struct Diagnostics {
    /// Inbound frames dropped as malformed
    protocol_errors: AtomicU64,
    /// Outbound sends that failed (closed or saturated connection)
    send_failures: AtomicU64,
    /// Outbound sends that reached a connection queue
    deliveries: AtomicU64,
    /// Defensive no-ops (zero-count release, double teardown)
    invariant_violations: AtomicU64,
    /// Online edges emitted
    online_edges: AtomicU64,
    /// Offline edges emitted
    offline_edges: AtomicU64,
    /// User directory calls that failed or timed out
    directory_failures: AtomicU64,
    /// Connection handlers that panicked
    handler_panics: AtomicU64,
}

impl Diagnostics {
    /// Create zeroed counters
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deliveries(&self, count: usize) {
        self.deliveries.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_invariant_violation(&self) {
        self.invariant_violations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a presence edge (`true` for online)
    pub fn record_edge(&self, online: bool) {
        let counter = if online {
            &self.online_edges
        } else {
            &self.offline_edges
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_directory_failure(&self) {
        self.directory_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_handler_panic(&self) {
        self.handler_panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all counters
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            invariant_violations: self.invariant_violations.load(Ordering::Relaxed),
            online_edges: self.online_edges.load(Ordering::Relaxed),
            offline_edges: self.offline_edges.load(Ordering::Relaxed),
            directory_failures: self.directory_failures.load(Ordering::Relaxed),
            handler_panics: self.handler_panics.load(Ordering::Relaxed),
        }
    }
}

/// Serializable counter snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSnapshot {
    pub protocol_errors: u64,
    pub send_failures: u64,
    pub deliveries: u64,
    pub invariant_violations: u64,
    pub online_edges: u64,
    pub offline_edges: u64,
    pub directory_failures: u64,
    pub handler_panics: u64,
}

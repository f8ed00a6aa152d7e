//! Event pipeline statistics.
//!
//! A small struct of atomic counters shared between the bus, the handlers
//! and the façade. Explicitly constructed and injected rather than a
//! process global, and updated with relaxed atomics since increments come
//! from many short-lived handler tasks.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Running totals for the event pipeline.
#[derive(Debug, Default)]
pub struct EventStats {
    orders_created: AtomicU64,
    status_updates: AtomicU64,
    orders_cancelled: AtomicU64,
    events_published: AtomicU64,
    processing_errors: AtomicU64,
}

impl EventStats {
    /// Creates a zeroed counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one published event of any type.
    pub fn record_published(&self) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one `order.created` event.
    pub fn record_order_created(&self) {
        self.orders_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one `order.status.updated` event.
    pub fn record_status_update(&self) {
        self.status_updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one transition into the cancelled status.
    pub fn record_cancellation(&self) {
        self.orders_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one failed handler invocation.
    pub fn record_processing_error(&self) {
        self.processing_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent-enough point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            orders_created: self.orders_created.load(Ordering::Relaxed),
            status_updates: self.status_updates.load(Ordering::Relaxed),
            orders_cancelled: self.orders_cancelled.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            event_processing_errors: self.processing_errors.load(Ordering::Relaxed),
        }
    }
}

/// Serializable snapshot of [`EventStats`], keyed the way the monitoring
/// endpoint exposes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Orders created.
    pub orders_created: u64,
    /// Status updates seen.
    pub status_updates: u64,
    /// Cancellations seen.
    pub orders_cancelled: u64,
    /// Total events published.
    pub events_published: u64,
    /// Total failed handler invocations.
    pub event_processing_errors: u64,
}

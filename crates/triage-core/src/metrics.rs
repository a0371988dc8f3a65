//! Global atomic counters for triage observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. on shutdown or a periodic tick).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::EscalationTarget;

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters.
pub struct Metrics {
    messages_scored: AtomicU64,
    counselor_escalations: AtomicU64,
    hotline_escalations: AtomicU64,
    sink_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            messages_scored: AtomicU64::new(0),
            counselor_escalations: AtomicU64::new(0),
            hotline_escalations: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
        }
    }

    pub fn inc_messages_scored(&self) {
        self.messages_scored.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "messages_scored", "counter incremented");
    }

    /// Increment the escalation counter for the given target.
    pub fn inc_escalations(&self, target: EscalationTarget) {
        let (counter, name) = match target {
            EscalationTarget::Counselor => (&self.counselor_escalations, "counselor_escalations"),
            EscalationTarget::Hotline => (&self.hotline_escalations, "hotline_escalations"),
        };
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = name, "counter incremented");
    }

    pub fn inc_sink_failures(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "sink_failures", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            messages_scored = self.messages_scored(),
            counselor_escalations = self.counselor_escalations(),
            hotline_escalations = self.hotline_escalations(),
            sink_failures = self.sink_failures(),
        );
    }

    pub fn messages_scored(&self) -> u64 {
        self.messages_scored.load(Ordering::Relaxed)
    }

    pub fn counselor_escalations(&self) -> u64 {
        self.counselor_escalations.load(Ordering::Relaxed)
    }

    pub fn hotline_escalations(&self) -> u64 {
        self.hotline_escalations.load(Ordering::Relaxed)
    }

    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.messages_scored.store(0, Ordering::Relaxed);
        self.counselor_escalations.store(0, Ordering::Relaxed);
        self.hotline_escalations.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
    }
}

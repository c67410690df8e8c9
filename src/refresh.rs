//! Poll response sequencing
//!
//! The dashboard re-runs the whole pipeline on every poll tick and does not
//! cancel requests that are still in flight. A slow response can therefore
//! land after a newer one. `ResponseSequencer` tags each request with a ticket
//! and only lets a response through if no newer response has been applied.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::config::RefreshConfig;

/// Ticket identifying one poll request, ordered by issue time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Last-write-wins gate for poll responses
#[derive(Debug, Default)]
pub struct ResponseSequencer {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl ResponseSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a request about to be sent
    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Record a response; returns `false` when a newer response was already applied
    pub fn try_apply(&self, ticket: Ticket) -> bool {
        let previous = self.applied.fetch_max(ticket.0, Ordering::SeqCst);
        let accepted = previous < ticket.0;
        if !accepted {
            debug!(ticket = ticket.0, latest = previous, "discarding stale response");
        }
        accepted
    }

    /// Whether `ticket` belongs to the most recently issued request
    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket.0
    }

    /// Ticket of the last applied response, if any
    pub fn last_applied(&self) -> Option<Ticket> {
        match self.applied.load(Ordering::SeqCst) {
            0 => None,
            n => Some(Ticket(n)),
        }
    }
}

impl RefreshConfig {
    pub fn dataset_interval(&self) -> Duration {
        Duration::from_secs(self.dataset_interval_secs)
    }

    pub fn realtime_interval(&self) -> Duration {
        Duration::from_secs(self.realtime_interval_secs)
    }
}

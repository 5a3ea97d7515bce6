//! Read-only registry statistics.

use std::time::Duration;

use serde::Serialize;

/// Connection counts bucketed by age.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AgeHistogram {
    /// Connected less than a minute ago.
    pub under_1m: usize,
    /// Connected 1–5 minutes ago.
    pub under_5m: usize,
    /// Connected 5 minutes – 1 hour ago.
    pub under_1h: usize,
    /// Connected an hour or more ago.
    pub over_1h: usize,
}

impl AgeHistogram {
    /// Account one connection of the given age.
    pub(crate) fn record(&mut self, age: Duration) {
        if age < Duration::from_secs(60) {
            self.under_1m += 1;
        } else if age < Duration::from_secs(300) {
            self.under_5m += 1;
        } else if age < Duration::from_secs(3600) {
            self.under_1h += 1;
        } else {
            self.over_1h += 1;
        }
    }
}

/// Snapshot of the realtime subsystem. Computing one mutates nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Connected clients, authenticated or not.
    pub total_clients: usize,
    /// Clients that presented the correct token.
    pub authenticated_clients: usize,
    /// Sum of all three subscription sets across all clients.
    pub total_subscriptions: usize,
    /// Connection counts by age bucket.
    pub connections_by_age: AgeHistogram,
    /// Distinct entities with a cached state.
    pub tracked_entities: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

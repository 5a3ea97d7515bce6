//! Periodic registry maintenance.
//!
//! One fixed-period task per process, independent of any client's
//! heartbeat: evicts stale connections and resets lapsed rate windows.
//! Fire-and-forget — abort the returned handle on shutdown.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::debug;

use crate::registry::ClientRegistry;

/// Spawn the maintenance sweep at the registry's configured period.
///
/// Each pass calls [`ClientRegistry::sweep`]. Returns the task handle —
/// abort it on shutdown after the final sweep you care about.
pub fn spawn_maintenance(registry: Arc<ClientRegistry>) -> JoinHandle<()> {
    let period = registry.config().maintenance_period;
    let mut ticker = interval_at(Instant::now() + period, period);
    tokio::spawn(async move {
        loop {
            let _ = ticker.tick().await;
            debug!("maintenance sweep");
            registry.sweep().await;
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Per-connection client record.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use hearth_core::errors::SendError;
use hearth_core::ids::ClientId;

use crate::rate_limit::RateWindow;
use crate::subscriptions::Subscriptions;

/// The send capability: one bounded channel of pre-serialized frames.
///
/// `try_send` only — a slow or hung peer surfaces as `Full`/`Closed`
/// instead of stalling the broadcast pass. The transport end drains the
/// receiver and owns the actual socket flush.
pub type Sink = mpsc::Sender<Arc<String>>;

/// One connected observer: auth state, interests, rate budget, liveness.
///
/// All mutable state lives behind `parking_lot` mutexes with short critical
/// sections (never held across an `.await`). Records are created and
/// deleted only by the registry.
pub struct Client {
    /// Opaque caller-supplied id.
    pub id: ClientId,
    sink: Sink,
    /// Fixed at creation from token equality; never re-evaluated.
    pub authenticated: bool,
    pub(crate) subscriptions: Mutex<Subscriptions>,
    pub(crate) rate: Mutex<RateWindow>,
    last_activity: Mutex<Instant>,
    connected_at: Instant,
    pub(crate) heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl Client {
    pub(crate) fn new(id: ClientId, sink: Sink, authenticated: bool, now: Instant) -> Self {
        Self {
            id,
            sink,
            authenticated,
            subscriptions: Mutex::new(Subscriptions::default()),
            rate: Mutex::new(RateWindow::new(now)),
            last_activity: Mutex::new(now),
            connected_at: now,
            heartbeat: Mutex::new(None),
        }
    }

    /// Push one frame into the sink without blocking.
    pub fn try_send(&self, payload: Arc<String>) -> Result<(), SendError> {
        self.sink.try_send(payload).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }

    /// Record outbound activity (liveness proxy).
    pub(crate) fn touch(&self, now: Instant) {
        *self.last_activity.lock() = now;
    }

    /// Instant of the most recent successful outbound send.
    #[must_use]
    pub fn last_activity(&self) -> Instant {
        *self.last_activity.lock()
    }

    /// When the client connected. Immutable.
    #[must_use]
    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }

    /// Total interests across all three subscription sets.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("authenticated", &self.authenticated)
            .field("subscriptions", &self.subscription_count())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

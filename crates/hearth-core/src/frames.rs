//! Outbound wire frames delivered to connected observers.
//!
//! Every frame is a flat struct with a `type` tag and a delivery-time
//! `timestamp` (ISO 8601, millisecond precision, UTC). Payloads are opaque
//! [`serde_json::Value`] so event data passes through unmodified. The
//! timestamp is stamped when the frame is built for delivery, not when the
//! underlying event occurred — event-native times travel in their own
//! fields (`time_fired`, `last_changed`, ...).

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event tag matched by clients subscribed to all state changes.
pub const STATE_CHANGED: &str = "state_changed";
/// Event tag for service-call notifications.
pub const SERVICE_CALLED: &str = "service_called";
/// Event tag for automation-trigger notifications.
pub const AUTOMATION_TRIGGERED: &str = "automation_triggered";
/// Event tag for script-execution notifications.
pub const SCRIPT_EXECUTED: &str = "script_executed";

/// Current instant as an ISO 8601 string with millisecond precision (UTC).
#[must_use]
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Last known state snapshot for one entity.
///
/// Replaced wholesale on every state-change broadcast; no history is kept.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Entity id, e.g. `light.kitchen`.
    pub entity_id: String,
    /// Current state value.
    pub state: String,
    /// Free-form entity attributes.
    #[serde(default)]
    pub attributes: Value,
    /// When the state value last changed (event-native time).
    pub last_changed: String,
    /// When the snapshot was last written (event-native time).
    pub last_updated: String,
}

/// Handshake acknowledgement sent immediately after a client is admitted.
#[derive(Clone, Debug, Serialize)]
pub struct ConnectionAck {
    #[serde(rename = "type")]
    kind: &'static str,
    status: &'static str,
    /// The id assigned to the connection.
    pub id: String,
    /// Whether the presented token matched the configured secret.
    pub authenticated: bool,
    /// Delivery-time timestamp.
    pub timestamp: String,
}

impl ConnectionAck {
    /// Build the ack for a freshly admitted client.
    #[must_use]
    pub fn new(id: impl Into<String>, authenticated: bool) -> Self {
        Self {
            kind: "connection",
            status: "connected",
            id: id.into(),
            authenticated,
            timestamp: now_iso(),
        }
    }
}

/// Liveness heartbeat.
#[derive(Clone, Debug, Serialize)]
pub struct Ping {
    #[serde(rename = "type")]
    kind: &'static str,
    /// Delivery-time timestamp.
    pub timestamp: String,
}

impl Ping {
    /// Build a ping stamped with the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kind: "ping",
            timestamp: now_iso(),
        }
    }
}

impl Default for Ping {
    fn default() -> Self {
        Self::new()
    }
}

/// State-change notification carrying the full entity snapshot.
#[derive(Clone, Debug, Serialize)]
pub struct StateChanged {
    #[serde(rename = "type")]
    kind: &'static str,
    /// The new entity snapshot.
    pub data: EntityState,
    /// Delivery-time timestamp.
    pub timestamp: String,
}

impl StateChanged {
    /// Wrap an entity snapshot for delivery.
    #[must_use]
    pub fn new(data: EntityState) -> Self {
        Self {
            kind: STATE_CHANGED,
            data,
            timestamp: now_iso(),
        }
    }
}

/// Generic event notification. The `type` tag is the event's own type
/// string, so service/automation/script notifications are just instances
/// with a fixed tag.
#[derive(Clone, Debug, Serialize)]
pub struct EventFrame {
    /// Event type tag, serialized as `type`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload, passed through opaque.
    pub data: Value,
    /// Where the event originated (`LOCAL` or `REMOTE`).
    pub origin: String,
    /// Event-native occurrence time; `null` when the source supplied none.
    pub time_fired: Option<String>,
    /// Opaque correlation context from the source; `null` when absent.
    pub context: Option<Value>,
    /// Delivery-time timestamp.
    pub timestamp: String,
}

impl EventFrame {
    /// Build an event frame stamped with the current instant.
    #[must_use]
    pub fn new(
        event_type: impl Into<String>,
        data: Value,
        origin: impl Into<String>,
        time_fired: Option<String>,
        context: Option<Value>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            origin: origin.into(),
            time_fired,
            context,
            timestamp: now_iso(),
        }
    }
}

/// In-band error notification, e.g. the frame substituted for a delivery
/// suppressed by the rate limiter.
#[derive(Clone, Debug, Serialize)]
pub struct ErrorFrame {
    #[serde(rename = "type")]
    kind: &'static str,
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Delivery-time timestamp.
    pub timestamp: String,
}

impl ErrorFrame {
    /// The frame substituted for a delivery the rate limiter suppressed.
    #[must_use]
    pub fn rate_limit_exceeded(max: u32, window_secs: u64) -> Self {
        Self {
            kind: "error",
            error: "rate_limit_exceeded",
            message: format!("rate limit exceeded ({max} messages per {window_secs}s)"),
            timestamp: now_iso(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Realtime subsystem configuration.
//!
//! The limits are fixed policy in production — the struct exists so tests
//! can build isolated instances with short windows, not as a user-facing
//! tuning surface.

use std::time::Duration;

/// Maximum number of simultaneously connected clients.
pub const MAX_CLIENTS: usize = 100;
/// Sliding rate-limit window length.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);
/// Maximum deliveries admitted per client per window.
pub const RATE_LIMIT_MAX: u32 = 1000;
/// A client with no outbound activity for this long is evicted.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(300);
/// Per-client heartbeat period.
pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(30);
/// Maintenance sweep period.
pub const MAINTENANCE_PERIOD: Duration = Duration::from_secs(60);

/// Policy knobs for the registry, broadcaster, and maintenance sweep.
#[derive(Clone, Debug)]
pub struct RealtimeConfig {
    /// Registry capacity; `add_client` rejects beyond this.
    pub max_clients: usize,
    /// Sliding rate-limit window length.
    pub rate_limit_window: Duration,
    /// Deliveries admitted per client per window.
    pub rate_limit_max: u32,
    /// Idle threshold for stale-connection eviction.
    pub idle_timeout: Duration,
    /// Per-client heartbeat period.
    pub heartbeat_period: Duration,
    /// Maintenance sweep period.
    pub maintenance_period: Duration,
    /// Shared secret compared for equality at connection time. With no
    /// token configured every client comes up unauthenticated.
    pub auth_token: Option<String>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_clients: MAX_CLIENTS,
            rate_limit_window: RATE_LIMIT_WINDOW,
            rate_limit_max: RATE_LIMIT_MAX,
            idle_timeout: IDLE_TIMEOUT,
            heartbeat_period: HEARTBEAT_PERIOD,
            maintenance_period: MAINTENANCE_PERIOD,
            auth_token: None,
        }
    }
}

impl RealtimeConfig {
    /// Default limits with a configured shared secret.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            auth_token: Some(token.into()),
            ..Self::default()
        }
    }
}

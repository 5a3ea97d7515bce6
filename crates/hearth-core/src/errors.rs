//! Error types for the realtime subsystem, built on [`thiserror`].
//!
//! The taxonomy is deliberately small: capacity rejection is the only error
//! surfaced to callers of the registry; everything else (unauthenticated
//! subscribes, rate-limited deliveries) is handled in-band as silent no-ops
//! or substituted frames, and a transport failure is fatal for that one
//! client only.

use thiserror::Error;

/// Failure to admit a client into the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The registry already holds the maximum number of clients.
    /// No partial state is created for the rejected connection.
    #[error("client registry full ({max} clients connected)")]
    CapacityExceeded {
        /// The configured capacity limit.
        max: usize,
    },
}

/// Failure of a client's send capability.
///
/// Both variants are transport failures: the client is removed and never
/// retried. `Full` means the outbound channel backed up — an unresponsive
/// peer must not stall delivery to other clients.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The peer hung up (channel closed).
    #[error("client channel closed")]
    Closed,

    /// The outbound buffer is full (unresponsive peer).
    #[error("client channel full")]
    Full,
}

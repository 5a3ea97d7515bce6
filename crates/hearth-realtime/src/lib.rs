//! # hearth-realtime
//!
//! Real-time broadcast subsystem for the Hearth controller: pushes live
//! state-change and domain events to many simultaneously connected
//! observers, each with its own authentication state, subscription
//! interests, and delivery budget.
//!
//! ## Components
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `client` | Per-connection record: sink, auth, interests, rate budget |
//! | `rate_limit` | Sliding-window delivery counter per client |
//! | `subscriptions` | Entity / domain / event-type interest sets |
//! | `registry` | Authoritative client map, capacity, heartbeats, delivery path |
//! | `broadcast` | Fan-out, entity-state cache, subscribe-time replay |
//! | `maintenance` | Periodic sweep: idle eviction, window resets |
//! | `stats` | Read-only snapshot with connection-age histogram |
//!
//! ## Data Flow
//!
//! Event source → [`Broadcaster`] → subscription match → rate gate →
//! per-client sink. A failed send removes that client; nobody else is
//! affected. The maintenance sweep and per-client heartbeats run as
//! independent tokio tasks.

#![deny(unsafe_code)]

pub mod broadcast;
pub mod client;
pub mod config;
pub mod maintenance;
pub mod rate_limit;
pub mod registry;
pub mod stats;
pub mod subscriptions;

pub use broadcast::{Broadcaster, DomainEvent};
pub use client::{Client, Sink};
pub use config::RealtimeConfig;
pub use maintenance::spawn_maintenance;
pub use registry::ClientRegistry;
pub use stats::{AgeHistogram, Statistics};
pub use subscriptions::Subscriptions;

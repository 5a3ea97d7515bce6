//! # hearth-core
//!
//! Foundation types for the Hearth home-automation controller.
//!
//! This crate provides the shared vocabulary the realtime crate depends on:
//!
//! - **Branded IDs**: [`ids::ClientId`], [`ids::EntityId`] as newtypes
//! - **Frames**: [`frames`] — the outbound wire shapes delivered to observers
//! - **Errors**: [`errors::RegistryError`], [`errors::SendError`] via `thiserror`
//! - **Logging**: [`logging::init_subscriber`] for `tracing` setup
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `hearth-realtime`.

#![deny(unsafe_code)]

pub mod constants;
pub mod errors;
pub mod frames;
pub mod ids;
pub mod logging;

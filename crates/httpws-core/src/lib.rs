//! httpws core: transport-agnostic protocol primitives and the error surface.
//!
//! This crate defines the wire contracts of the tunnel (frame header and the
//! Request/Response envelope) plus the error taxonomy shared by the gateway.
//! It carries no runtime or socket dependencies so the same codec can back a
//! server, a test harness, or a native client.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed frames and envelopes surface as `TunnelError`, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, TunnelError};

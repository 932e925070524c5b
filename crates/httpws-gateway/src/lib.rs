//! httpws gateway library entry.
//!
//! Wires the WebSocket transport, the tunnel channel runtime and the HTTP
//! surface into one axum application. Consumed by the binary (`main.rs`)
//! and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod app_state;
pub mod config;
pub mod error;
pub mod forward;
pub mod ops;
pub mod router;
pub mod transport;
pub mod tunnel;

//! Top-level facade crate for httpws.
//!
//! Re-exports the protocol types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use httpws_core::*;
}

pub mod gateway {
    pub use httpws_gateway::*;
}

//! Tunnel runtime: channel, correlation, response capture, handler seam.

pub mod channel;
pub mod correlation;
pub mod handler;
pub mod options;
pub mod recorder;
pub mod registry;

pub use channel::{ChannelState, TunnelChannel};
pub use correlation::CorrelationTable;
pub use handler::{HttpHandler, RouterHandler};
pub use options::{SaturationPolicy, TunnelOptions};
pub use recorder::ResponseRecorder;
pub use registry::ChannelRegistry;

//! Transport layer.
//!
//! Turns a message-oriented duplex link (WebSocket, or the in-process memory
//! link) into a stream of length-prefixed frames.

pub mod buffered;
pub mod framed;
pub mod link;
pub mod memory;
pub mod ws;

pub use buffered::BufferedReader;
pub use framed::{read_frame, write_frame};
pub use link::{LinkMessage, LinkRead, LinkWrite};

//! # roverdeck-link - Control Channel
//!
//! Reconnect-tolerant session to the platform's Socket.IO control channel,
//! spoken directly over a WebSocket (`tokio-tungstenite`).
//!
//! ## Public API
//!
//! - [`ChannelSession`] - Owns the connection; `connect`, `send`, `on`/`off`,
//!   `next_event`, observable [`ConnectionState`](roverdeck_core::ConnectionState)
//! - [`SessionOptions`] - Backoff, handshake timeout, sequence numbers
//! - [`SessionEvent`] - Connectivity changes and decoded inbound events
//! - [`CommandSink`] - Outbound seam; `MockCommandSink` with `test-helpers`
//! - [`protocol`] - Engine.IO / Socket.IO text framing

mod client;
pub mod protocol;
mod session;

pub use session::{ChannelSession, CommandSink, HandlerId, SessionEvent, SessionOptions};

#[cfg(any(test, feature = "test-helpers"))]
pub use session::MockCommandSink;

//! Relay networking
//!
//! The relay is a dumb broadcaster: it forwards positions to everyone else,
//! fans fire events out to every participant including the shooter, and
//! announces departures when a connection ends.

pub mod memory;
pub mod protocol;
pub mod transport;
#[cfg(target_arch = "wasm32")]
pub mod websocket;

pub use memory::{MemoryRelay, MemoryTransport};
pub use protocol::{DecodeError, EncodeError, WireMessage, decode, encode};
pub use transport::{Inbox, LinkState, Transport, TransportAdapter, TransportError};
#[cfg(target_arch = "wasm32")]
pub use websocket::WebSocketTransport;

/// Relay address for a page served from `hostname` over `page_protocol`
/// (`"https:"` selects `wss`). An explicit override wins when non-empty.
pub fn relay_url(page_protocol: &str, hostname: &str, override_url: Option<&str>) -> String {
    if let Some(url) = override_url.filter(|u| !u.is_empty()) {
        return url.to_string();
    }
    let scheme = if page_protocol == "https:" { "wss" } else { "ws" };
    let host = if hostname.is_empty() {
        "localhost"
    } else {
        hostname
    };
    format!("{}://{}:{}", scheme, host, crate::consts::RELAY_PORT)
}

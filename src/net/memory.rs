//! In-process relay
//!
//! Implements the relay's fan-out rules without a network so sessions can be
//! wired together in the native demo and in tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::protocol::{self, WireMessage};
use super::transport::{Inbox, Transport, TransportError};
use crate::sim::state::SessionId;

struct Connection {
    inbox: Inbox,
    /// Last sender id seen on this connection
    sender: Option<SessionId>,
}

#[derive(Default)]
struct RelayInner {
    next_conn: u64,
    conns: BTreeMap<u64, Connection>,
    down: bool,
}

impl RelayInner {
    fn deliver(&self, frame: &str, skip: Option<u64>) {
        for (id, conn) in &self.conns {
            if Some(*id) != skip {
                conn.inbox.push(frame.to_string());
            }
        }
    }

    fn route(&mut self, from: u64, frame: &str) -> Result<(), TransportError> {
        if self.down {
            return Err(TransportError::Closed);
        }
        if !self.conns.contains_key(&from) {
            return Err(TransportError::Closed);
        }
        // The relay forwards only what it understands
        let Ok(message) = protocol::decode(frame) else {
            log::debug!("Relay dropped unreadable frame from connection {}", from);
            return Ok(());
        };
        if let Some(conn) = self.conns.get_mut(&from) {
            conn.sender = Some(message.sender_id().clone());
        }
        match message {
            WireMessage::Position { .. } => self.deliver(frame, Some(from)),
            WireMessage::Fire { .. } => self.deliver(frame, None),
            // Departures are the relay's to announce
            WireMessage::Departure { .. } => {}
        }
        Ok(())
    }

    fn disconnect(&mut self, conn: u64) {
        let Some(gone) = self.conns.remove(&conn) else {
            return;
        };
        let Some(sender_id) = gone.sender else {
            return;
        };
        match protocol::encode(&WireMessage::Departure { sender_id }) {
            Ok(frame) => self.deliver(&frame, None),
            Err(e) => log::warn!("Relay could not announce departure: {}", e),
        }
    }
}

/// Shared handle to an in-process relay
#[derive(Clone, Default)]
pub struct MemoryRelay {
    inner: Rc<RefCell<RelayInner>>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new participant connection
    pub fn connect(&self) -> MemoryTransport {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_conn;
        inner.next_conn += 1;
        let inbox = Inbox::new();
        inner.conns.insert(
            id,
            Connection {
                inbox: inbox.clone(),
                sender: None,
            },
        );
        log::debug!("Relay connection {} opened", id);
        MemoryTransport {
            relay: self.clone(),
            conn: id,
            inbox,
            open: true,
        }
    }

    pub fn connection_count(&self) -> usize {
        self.inner.borrow().conns.len()
    }

    /// Deliver a raw frame to every connection as-is
    pub fn inject_raw(&self, frame: &str) {
        self.inner.borrow().deliver(frame, None);
    }

    /// Make every subsequent send fail
    pub fn shut_down(&self) {
        self.inner.borrow_mut().down = true;
    }
}

/// One participant's end of a [`MemoryRelay`]
pub struct MemoryTransport {
    relay: MemoryRelay,
    conn: u64,
    inbox: Inbox,
    open: bool,
}

impl Transport for MemoryTransport {
    fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        self.relay.inner.borrow_mut().route(self.conn, frame)
    }

    fn poll(&mut self) -> Vec<String> {
        self.inbox.drain()
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.relay.inner.borrow_mut().disconnect(self.conn);
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(message: &WireMessage) -> String {
        protocol::encode(message).unwrap()
    }

    fn position(id: &str) -> WireMessage {
        WireMessage::Position {
            sender_id: SessionId::new(id),
            x: 10.0,
            y: 20.0,
            name: id.to_string(),
        }
    }

    fn fire(id: &str) -> WireMessage {
        WireMessage::Fire {
            sender_id: SessionId::new(id),
            x: 10.0,
            y: 20.0,
            angle: 0.5,
        }
    }

    #[test]
    fn test_position_goes_to_others() {
        let relay = MemoryRelay::new();
        let mut a = relay.connect();
        let mut b = relay.connect();

        a.send(&frame(&position("a"))).unwrap();
        assert!(a.poll().is_empty());
        assert_eq!(b.poll().len(), 1);
    }

    #[test]
    fn test_fire_echoes_to_sender() {
        let relay = MemoryRelay::new();
        let mut a = relay.connect();
        let mut b = relay.connect();

        a.send(&frame(&fire("a"))).unwrap();
        assert_eq!(a.poll().len(), 1);
        assert_eq!(b.poll().len(), 1);
    }

    #[test]
    fn test_close_announces_departure() {
        let relay = MemoryRelay::new();
        let mut a = relay.connect();
        let mut b = relay.connect();
        a.send(&frame(&position("a"))).unwrap();
        b.poll();

        a.close();
        a.close();
        assert_eq!(relay.connection_count(), 1);

        let frames = b.poll();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            protocol::decode(&frames[0]).unwrap(),
            WireMessage::Departure {
                sender_id: SessionId::new("a")
            }
        );
    }

    #[test]
    fn test_silent_connection_leaves_quietly() {
        let relay = MemoryRelay::new();
        let a = relay.connect();
        let mut b = relay.connect();
        drop(a);
        assert!(b.poll().is_empty());
        assert_eq!(relay.connection_count(), 1);
    }

    #[test]
    fn test_send_after_close_or_shutdown_fails() {
        let relay = MemoryRelay::new();
        let mut a = relay.connect();
        let mut b = relay.connect();

        a.close();
        assert_eq!(a.send(&frame(&position("a"))), Err(TransportError::Closed));

        relay.shut_down();
        assert_eq!(b.send(&frame(&position("b"))), Err(TransportError::Closed));
    }

    #[test]
    fn test_unreadable_frames_not_forwarded() {
        let relay = MemoryRelay::new();
        let mut a = relay.connect();
        let mut b = relay.connect();

        assert!(a.send("{broken").is_ok());
        assert!(b.poll().is_empty());
    }
}

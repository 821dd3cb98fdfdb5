//! Transport adapter
//!
//! Wraps one unreliable broadcast channel per session. Inbound text frames
//! are queued by the channel's callbacks and drained once per step; outbound
//! messages are encoded and sent immediately. A failed send is terminal for
//! the channel: the adapter logs it once and the session carries on offline.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::protocol::{self, WireMessage};

/// Transport-level failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("Connection closed")]
    Closed,
    #[error("Connect failed: {0}")]
    Connect(String),
    #[error("Send failed: {0}")]
    Send(String),
}

/// A broadcast channel carrying text frames
pub trait Transport {
    /// Send one text frame
    fn send(&mut self, frame: &str) -> Result<(), TransportError>;
    /// Take every frame received since the last poll, in arrival order
    fn poll(&mut self) -> Vec<String>;
    /// Close the channel; must be safe to call repeatedly
    fn close(&mut self);
    fn is_open(&self) -> bool;
}

/// Single-writer inbound queue shared with a transport's receive callback
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    queue: Rc<RefCell<VecDeque<String>>>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, frame: String) {
        self.queue.borrow_mut().push_back(frame);
    }

    pub fn drain(&self) -> Vec<String> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

/// Connection health as seen by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Online,
    /// A send failed; the session runs local-only
    Degraded,
    Closed,
}

/// Encodes outbound and decodes inbound messages for one session
pub struct TransportAdapter<T: Transport> {
    transport: T,
    link: LinkState,
    sent_frames: u64,
    dropped_frames: u64,
}

impl<T: Transport> TransportAdapter<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            link: LinkState::Online,
            sent_frames: 0,
            dropped_frames: 0,
        }
    }

    /// Send a message; no-op once degraded or closed
    pub fn send(&mut self, message: &WireMessage) {
        if self.link != LinkState::Online {
            return;
        }
        let frame = match protocol::encode(message) {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Dropping outbound message: {}", e);
                return;
            }
        };
        match self.transport.send(&frame) {
            Ok(()) => self.sent_frames += 1,
            Err(e) => {
                log::warn!("Transport failed ({}); continuing offline", e);
                self.link = LinkState::Degraded;
            }
        }
    }

    /// Send a batch in order
    pub fn send_all<'a>(&mut self, messages: impl IntoIterator<Item = &'a WireMessage>) {
        for message in messages {
            self.send(message);
        }
    }

    /// Decode everything received since the last call.
    ///
    /// Malformed frames are dropped and counted; they never reach the state.
    pub fn drain_inbound(&mut self) -> Vec<WireMessage> {
        if self.link == LinkState::Closed {
            return Vec::new();
        }
        let frames = self.transport.poll();
        let mut messages = Vec::with_capacity(frames.len());
        for frame in frames {
            match protocol::decode(&frame) {
                Ok(message) => messages.push(message),
                Err(e) => {
                    self.dropped_frames += 1;
                    log::debug!("Dropped inbound frame: {}", e);
                }
            }
        }
        messages
    }

    /// Close the channel; repeated calls are no-ops
    pub fn close(&mut self) {
        if self.link == LinkState::Closed {
            return;
        }
        self.transport.close();
        self.link = LinkState::Closed;
        log::info!("Transport closed ({} frames sent)", self.sent_frames);
    }

    pub fn link(&self) -> LinkState {
        self.link
    }

    pub fn sent_frames(&self) -> u64 {
        self.sent_frames
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::SessionId;

    /// Records sends; can be told to fail
    #[derive(Default)]
    struct FakeTransport {
        sent: Vec<String>,
        inbox: Inbox,
        fail: bool,
        closes: u32,
    }

    impl Transport for FakeTransport {
        fn send(&mut self, frame: &str) -> Result<(), TransportError> {
            if self.fail {
                return Err(TransportError::Send("socket gone".to_string()));
            }
            self.sent.push(frame.to_string());
            Ok(())
        }

        fn poll(&mut self) -> Vec<String> {
            self.inbox.drain()
        }

        fn close(&mut self) {
            self.closes += 1;
        }

        fn is_open(&self) -> bool {
            self.closes == 0
        }
    }

    fn position(id: &str) -> WireMessage {
        WireMessage::Position {
            sender_id: SessionId::new(id),
            x: 1.0,
            y: 2.0,
            name: "A".to_string(),
        }
    }

    #[test]
    fn test_send_encodes_frames() {
        let mut adapter = TransportAdapter::new(FakeTransport::default());
        adapter.send_all(&[position("a"), position("b")]);
        assert_eq!(adapter.sent_frames(), 2);
        assert!(adapter.transport().sent[0].contains("\"type\":\"position\""));
    }

    #[test]
    fn test_failure_degrades_once() {
        let mut adapter = TransportAdapter::new(FakeTransport {
            fail: true,
            ..Default::default()
        });
        adapter.send(&position("a"));
        assert_eq!(adapter.link(), LinkState::Degraded);
        adapter.send(&position("a"));
        assert_eq!(adapter.sent_frames(), 0);
    }

    #[test]
    fn test_malformed_inbound_dropped() {
        let transport = FakeTransport::default();
        let inbox = transport.inbox.clone();
        let mut adapter = TransportAdapter::new(transport);

        inbox.push(r#"{"type":"departure","sender_id":"p1"}"#.to_string());
        inbox.push("{garbage".to_string());
        inbox.push(r#"{"type":"fire","sender_id":"p2","x":1}"#.to_string());
        inbox.push(r#"{"type":"departure","sender_id":"p3"}"#.to_string());

        let messages = adapter.drain_inbound();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender_id(), &SessionId::new("p1"));
        assert_eq!(messages[1].sender_id(), &SessionId::new("p3"));
        assert_eq!(adapter.dropped_frames(), 2);
        assert!(inbox.is_empty());
    }

    #[test]
    fn test_close_idempotent() {
        let mut adapter = TransportAdapter::new(FakeTransport::default());
        adapter.close();
        adapter.close();
        assert_eq!(adapter.transport().closes, 1);
        assert_eq!(adapter.link(), LinkState::Closed);
        assert!(!adapter.transport().is_open());

        adapter.send(&position("a"));
        assert_eq!(adapter.sent_frames(), 0);
    }
}

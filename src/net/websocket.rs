//! Browser WebSocket transport

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use super::transport::{Inbox, Transport, TransportError};

/// Frames sent while the socket is still connecting are held until it opens
const MAX_PENDING_FRAMES: usize = 64;

pub struct WebSocketTransport {
    socket: Option<WebSocket>,
    inbox: Inbox,
    pending: Vec<String>,
    open: Rc<Cell<bool>>,
    _on_message: Option<Closure<dyn FnMut(MessageEvent)>>,
    _on_open: Option<Closure<dyn FnMut(web_sys::Event)>>,
    _on_close: Option<Closure<dyn FnMut(CloseEvent)>>,
}

impl WebSocketTransport {
    /// Open a socket to the relay at `url`
    pub fn connect(url: &str) -> Result<Self, TransportError> {
        let socket =
            WebSocket::new(url).map_err(|e| TransportError::Connect(format!("{:?}", e)))?;

        let inbox = Inbox::new();
        let open = Rc::new(Cell::new(false));

        let on_message = {
            let inbox = inbox.clone();
            Closure::<dyn FnMut(_)>::new(move |event: MessageEvent| {
                if let Some(text) = event.data().as_string() {
                    inbox.push(text);
                }
            })
        };
        socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));

        let on_open = {
            let open = open.clone();
            Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                open.set(true);
                log::info!("Connected to relay");
            })
        };
        socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        let on_close = {
            let open = open.clone();
            Closure::<dyn FnMut(_)>::new(move |event: CloseEvent| {
                open.set(false);
                log::warn!("Relay connection closed (code {})", event.code());
            })
        };
        socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        log::info!("Connecting to relay at {}", url);
        Ok(Self {
            socket: Some(socket),
            inbox,
            pending: Vec::new(),
            open,
            _on_message: Some(on_message),
            _on_open: Some(on_open),
            _on_close: Some(on_close),
        })
    }

    /// A transport whose sends always fail, for when the relay is unreachable
    pub fn disconnected() -> Self {
        Self {
            socket: None,
            inbox: Inbox::new(),
            pending: Vec::new(),
            open: Rc::new(Cell::new(false)),
            _on_message: None,
            _on_open: None,
            _on_close: None,
        }
    }

    fn send_now(socket: &WebSocket, frame: &str) -> Result<(), TransportError> {
        socket
            .send_with_str(frame)
            .map_err(|e| TransportError::Send(format!("{:?}", e)))
    }
}

impl Transport for WebSocketTransport {
    fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        let Some(socket) = &self.socket else {
            return Err(TransportError::Closed);
        };
        match socket.ready_state() {
            WebSocket::CONNECTING => {
                if self.pending.len() < MAX_PENDING_FRAMES {
                    self.pending.push(frame.to_string());
                }
                Ok(())
            }
            WebSocket::OPEN => {
                for queued in self.pending.drain(..) {
                    Self::send_now(socket, &queued)?;
                }
                Self::send_now(socket, frame)
            }
            _ => Err(TransportError::Closed),
        }
    }

    fn poll(&mut self) -> Vec<String> {
        self.inbox.drain()
    }

    fn close(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.set_onmessage(None);
            socket.set_onopen(None);
            socket.set_onclose(None);
            let _ = socket.close();
        }
        self.open.set(false);
        self.pending.clear();
        self._on_message = None;
        self._on_open = None;
        self._on_close = None;
    }

    fn is_open(&self) -> bool {
        self.open.get()
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.close();
    }
}

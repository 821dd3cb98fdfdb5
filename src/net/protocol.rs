//! Relay wire protocol
//!
//! JSON text frames, internally tagged by `"type"`. The relay stamps nothing:
//! every participant sends its own `sender_id`, and the relay remembers the
//! last id seen on a connection so it can announce the departure.

use serde::{Deserialize, Serialize};

use crate::sim::state::SessionId;

/// Messages exchanged through the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    /// Sent by every participant every simulation step
    Position {
        sender_id: SessionId,
        x: f32,
        y: f32,
        name: String,
    },
    /// Sent once per fire action; the relay fans it out to everyone
    Fire {
        sender_id: SessionId,
        x: f32,
        y: f32,
        angle: f32,
    },
    /// Sent by the relay when a participant's connection ends
    Departure { sender_id: SessionId },
}

impl WireMessage {
    pub fn sender_id(&self) -> &SessionId {
        match self {
            WireMessage::Position { sender_id, .. }
            | WireMessage::Fire { sender_id, .. }
            | WireMessage::Departure { sender_id } => sender_id,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            WireMessage::Position { .. } => "position",
            WireMessage::Fire { .. } => "fire",
            WireMessage::Departure { .. } => "departure",
        }
    }

    fn is_finite(&self) -> bool {
        match self {
            WireMessage::Position { x, y, .. } => x.is_finite() && y.is_finite(),
            WireMessage::Fire { x, y, angle, .. } => {
                x.is_finite() && y.is_finite() && angle.is_finite()
            }
            WireMessage::Departure { .. } => true,
        }
    }
}

/// Encode a message as a JSON text frame
pub fn encode(message: &WireMessage) -> Result<String, EncodeError> {
    serde_json::to_string(message).map_err(|e| EncodeError(e.to_string()))
}

/// Decode a JSON text frame, rejecting anything that would corrupt state
pub fn decode(text: &str) -> Result<WireMessage, DecodeError> {
    let message: WireMessage =
        serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    if message.sender_id().as_str().is_empty() {
        return Err(DecodeError::MissingSender(message.kind()));
    }
    if !message.is_finite() {
        return Err(DecodeError::NonFinite(message.kind()));
    }
    Ok(message)
}

#[derive(Debug, thiserror::Error)]
#[error("Encode error: {0}")]
pub struct EncodeError(String);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed message: {0}")]
    Malformed(String),
    #[error("Empty sender id in {0} message")]
    MissingSender(&'static str),
    #[error("Non-finite number in {0} message")]
    NonFinite(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_wire_shape() {
        let msg = WireMessage::Position {
            sender_id: SessionId::new("abc"),
            x: 12.5,
            y: 40.0,
            name: "Alice".to_string(),
        };
        let json: serde_json::Value = serde_json::from_str(&encode(&msg).unwrap()).unwrap();
        assert_eq!(json["type"], "position");
        assert_eq!(json["sender_id"], "abc");
        assert_eq!(json["x"], 12.5);
        assert_eq!(json["name"], "Alice");
    }

    #[test]
    fn test_decode_fire() {
        let msg = decode(r#"{"type":"fire","sender_id":"p1","x":1,"y":2,"angle":3.5}"#).unwrap();
        match msg {
            WireMessage::Fire {
                sender_id,
                x,
                y,
                angle,
            } => {
                assert_eq!(sender_id, SessionId::new("p1"));
                assert_eq!((x, y, angle), (1.0, 2.0, 3.5));
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_decode_departure() {
        let msg = decode(r#"{"type":"departure","sender_id":"p9"}"#).unwrap();
        assert_eq!(
            msg,
            WireMessage::Departure {
                sender_id: SessionId::new("p9")
            }
        );
    }

    #[test]
    fn test_decode_rejects_bad_shapes() {
        assert!(matches!(decode("not json"), Err(DecodeError::Malformed(_))));
        assert!(matches!(
            decode(r#"{"type":"teleport","sender_id":"p1"}"#),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode(r#"{"type":"position","sender_id":"p1","x":"left","y":2,"name":"x"}"#),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode(r#"{"type":"departure","sender_id":""}"#),
            Err(DecodeError::MissingSender("departure"))
        ));
    }
}

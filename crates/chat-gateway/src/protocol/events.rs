//! Gateway event envelopes
//!
//! Every text frame is `{"event": "<name>", "data": {...}}`. Inbound frames
//! decode into [`ClientEvent`], outbound frames encode from [`ServerEvent`].

use super::payloads::{
    AuthPayload, MessagePayload, PresenceUpdatePayload, RoomsPayload, TypingPayload,
    TypingUpdatePayload,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Events a client may send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Bind this connection to a (pre-verified) user
    #[serde(rename = "auth")]
    Auth(AuthPayload),
    /// Start listening to rooms
    #[serde(rename = "join:rooms")]
    JoinRooms(RoomsPayload),
    /// Stop listening to rooms
    #[serde(rename = "leave:rooms")]
    LeaveRooms(RoomsPayload),
    #[serde(rename = "typing:start")]
    TypingStart(TypingPayload),
    #[serde(rename = "typing:stop")]
    TypingStop(TypingPayload),
}

/// Events the gateway sends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// A user's aggregate presence changed (sent to every connection)
    #[serde(rename = "presence:update")]
    PresenceUpdate(PresenceUpdatePayload),
    /// A room peer started or stopped typing
    #[serde(rename = "typing:update")]
    TypingUpdate(TypingUpdatePayload),
    /// A message was committed to a room
    #[serde(rename = "message:new")]
    MessageNew(MessagePayload),
    /// A committed message changed (delivery/read bookkeeping happened upstream)
    #[serde(rename = "message:update")]
    MessageUpdate(MessagePayload),
}

/// Reasons an inbound frame is dropped
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Binary frames are not supported")]
    Binary,
}

impl ClientEvent {
    /// Event name as it appears on the wire
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::JoinRooms(_) => "join:rooms",
            Self::LeaveRooms(_) => "leave:rooms",
            Self::TypingStart(_) => "typing:start",
            Self::TypingStop(_) => "typing:stop",
        }
    }

    /// Decode and validate a text frame
    ///
    /// Blank identifiers count as missing. Blank entries inside a room list are
    /// skipped rather than failing the whole frame.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let mut event: Self = serde_json::from_str(text)?;

        match &mut event {
            Self::Auth(p) if p.user_id.is_empty() => return Err(ProtocolError::MissingField("userId")),
            Self::JoinRooms(p) | Self::LeaveRooms(p) => p.room_ids.retain(|id| !id.is_empty()),
            Self::TypingStart(p) | Self::TypingStop(p) => {
                if p.room_id.is_empty() {
                    return Err(ProtocolError::MissingField("roomId"));
                }
                if p.user_id.is_empty() {
                    return Err(ProtocolError::MissingField("userId"));
                }
            }
            Self::Auth(_) => {}
        }

        Ok(event)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ServerEvent {
    /// Event name as it appears on the wire
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PresenceUpdate(_) => "presence:update",
            Self::TypingUpdate(_) => "typing:update",
            Self::MessageNew(_) => "message:new",
            Self::MessageUpdate(_) => "message:update",
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ServerEvent({})", self.name())
    }
}

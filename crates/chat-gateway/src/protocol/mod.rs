//! Gateway protocol definitions
//!
//! Defines the WebSocket wire contract: event envelopes and their payloads.

mod events;
mod payloads;

pub use events::{ClientEvent, ProtocolError, ServerEvent};
pub use payloads::{
    AuthPayload, MessageNotification, MessagePayload, PresenceUpdatePayload, RoomsPayload,
    TypingPayload, TypingUpdatePayload,
};

//! Event payload definitions
//!
//! Field names are camelCase on the wire; clients depend on them.

use chat_core::{RoomId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// === Client payloads ===

/// Payload for `auth`
///
/// The user id has already been verified by the caller's credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user_id: UserId,
}

/// Payload for `join:rooms` and `leave:rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomsPayload {
    pub room_ids: Vec<RoomId>,
}

/// Payload for `typing:start` and `typing:stop`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub room_id: RoomId,
    pub user_id: UserId,
}

// === Server payloads ===

/// Payload for `presence:update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUpdatePayload {
    pub user_id: UserId,
    pub is_online: bool,
}

/// Payload for `typing:update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingUpdatePayload {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub typing: bool,
}

/// Payload for `message:new` and `message:update`
///
/// The message body is whatever the message store committed; it is relayed untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub message: Value,
}

// === Ingress payloads ===

/// Notification sent by the message store after a durable write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageNotification {
    pub room_id: RoomId,
    pub message: Value,
}

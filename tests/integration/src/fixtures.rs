//! Test fixtures and frame builders
//!
//! Provides reusable wire frames and identifiers for integration tests.

use serde::Serialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A user id no other test uses
pub fn unique_user() -> String {
    format!("user-{}", unique_suffix())
}

/// A room id no other test uses
pub fn unique_room() -> String {
    format!("room-{}", unique_suffix())
}

/// `auth` frame
pub fn auth_frame(user_id: &str) -> Value {
    json!({ "event": "auth", "data": { "userId": user_id } })
}

/// `join:rooms` frame
pub fn join_frame(room_ids: &[&str]) -> Value {
    json!({ "event": "join:rooms", "data": { "roomIds": room_ids } })
}

/// `leave:rooms` frame
pub fn leave_frame(room_ids: &[&str]) -> Value {
    json!({ "event": "leave:rooms", "data": { "roomIds": room_ids } })
}

/// `typing:start` / `typing:stop` frame
pub fn typing_frame(room_id: &str, user_id: &str, typing: bool) -> Value {
    let event = if typing { "typing:start" } else { "typing:stop" };
    json!({ "event": event, "data": { "roomId": room_id, "userId": user_id } })
}

/// Body the message store posts to the ingress
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageNotification {
    pub room_id: String,
    pub message: Value,
}

impl MessageNotification {
    /// A notification carrying a freshly committed message
    pub fn new(room_id: &str, content: &str) -> Self {
        Self {
            room_id: room_id.to_string(),
            message: json!({
                "_id": format!("msg-{}", unique_suffix()),
                "roomId": room_id,
                "content": content,
                "deliveredTo": [],
                "readBy": [],
            }),
        }
    }
}

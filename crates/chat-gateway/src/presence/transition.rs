//! Presence edges

use crate::protocol::{PresenceUpdatePayload, ServerEvent};
use chat_core::UserId;
use chrono::{DateTime, Utc};

/// A user crossed between OFFLINE and ONLINE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceTransition {
    pub user_id: UserId,
    pub online: bool,
    /// When the edge was observed
    pub at: DateTime<Utc>,
}

impl PresenceTransition {
    #[must_use]
    pub fn online(user_id: UserId, at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            online: true,
            at,
        }
    }

    #[must_use]
    pub fn offline(user_id: UserId, at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            online: false,
            at,
        }
    }

    /// The `presence:update` event announcing this edge
    #[must_use]
    pub fn to_event(&self) -> ServerEvent {
        ServerEvent::PresenceUpdate(PresenceUpdatePayload {
            user_id: self.user_id.clone(),
            is_online: self.online,
        })
    }
}

/// Receives presence edges in per-user linearization order
///
/// `publish` is called while the user's registry entry is locked, so
/// implementations must not block or do I/O.
pub trait TransitionSink: Send + Sync {
    fn publish(&self, transition: PresenceTransition);
}

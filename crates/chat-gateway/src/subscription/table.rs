//! Room subscription table
//!
//! Tracks which connections are listening to which rooms. Subscription is
//! live interest declared by the client, not room membership: authorization
//! is the room-membership store's job and has already happened by the time a
//! client knows a room id.

use chat_core::{ConnectionId, RoomId};
use dashmap::DashMap;
use std::collections::HashSet;

/// Room → connections, with a reverse index for teardown
///
/// Lock order is always `joined` before `rooms`.
#[derive(Debug, Default)]
pub struct SubscriptionTable {
    /// Room ID to subscribed connection IDs
    rooms: DashMap<RoomId, HashSet<ConnectionId>>,

    /// Connection ID to joined room IDs
    joined: DashMap<ConnectionId, HashSet<RoomId>>,
}

impl SubscriptionTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a connection to a room
    ///
    /// Returns `false` if it was already subscribed.
    pub fn join(&self, room_id: &RoomId, connection_id: ConnectionId) -> bool {
        let mut joined = self.joined.entry(connection_id).or_default();
        if !joined.insert(room_id.clone()) {
            return false;
        }

        self.rooms
            .entry(room_id.clone())
            .or_default()
            .insert(connection_id);

        tracing::trace!(
            connection_id = %connection_id,
            room_id = %room_id,
            "Connection joined room"
        );

        true
    }

    /// Unsubscribe a connection from a room
    ///
    /// Returns `false` if it was not subscribed.
    pub fn leave(&self, room_id: &RoomId, connection_id: ConnectionId) -> bool {
        let mut was_joined = false;
        self.joined.remove_if_mut(&connection_id, |_, rooms| {
            was_joined = rooms.remove(room_id);
            rooms.is_empty()
        });

        if was_joined {
            self.detach(room_id, connection_id);
            tracing::trace!(
                connection_id = %connection_id,
                room_id = %room_id,
                "Connection left room"
            );
        }

        was_joined
    }

    /// Remove a connection from every room it joined
    ///
    /// Returns the rooms it was removed from.
    pub fn leave_all(&self, connection_id: ConnectionId) -> Vec<RoomId> {
        let Some((_, rooms)) = self.joined.remove(&connection_id) else {
            return Vec::new();
        };

        for room_id in &rooms {
            self.detach(room_id, connection_id);
        }

        tracing::trace!(
            connection_id = %connection_id,
            rooms = rooms.len(),
            "Connection left all rooms"
        );

        rooms.into_iter().collect()
    }

    /// Drop a connection from a room set, pruning the set if it empties
    fn detach(&self, room_id: &RoomId, connection_id: ConnectionId) {
        self.rooms.remove_if_mut(room_id, |_, members| {
            members.remove(&connection_id);
            members.is_empty()
        });
    }

    /// Snapshot of the connections subscribed to a room
    ///
    /// The returned list is a copy; it does not track later joins or leaves.
    pub fn members_of(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of rooms with at least one subscriber
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Total number of (room, connection) subscriptions
    pub fn subscription_count(&self) -> usize {
        self.joined.iter().map(|rooms| rooms.len()).sum()
    }
}

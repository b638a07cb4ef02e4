//! Typing state
//!
//! Process-local relay state: which (room, user) pairs are typing. Each pair
//! remembers the connection that last signalled it, and a connection's pairs
//! go away with the connection. Only pairs that are currently typing are
//! stored.

use chat_core::{ConnectionId, RoomId, UserId};
use dashmap::DashMap;
use std::collections::HashSet;

type Pair = (RoomId, UserId);

/// (room, user) pairs currently typing
#[derive(Debug, Default)]
pub struct TypingState {
    /// Pair -> connection that last started it
    pairs: DashMap<Pair, ConnectionId>,
    /// Connection -> pairs it started; may hold pairs since taken over by
    /// another connection
    by_connection: DashMap<ConnectionId, HashSet<Pair>>,
}

impl TypingState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest signal a connection sent for a pair
    pub fn set(&self, connection_id: ConnectionId, room_id: &RoomId, user_id: &UserId, typing: bool) {
        let pair = (room_id.clone(), user_id.clone());
        if typing {
            self.by_connection
                .entry(connection_id)
                .or_default()
                .insert(pair.clone());
            self.pairs.insert(pair, connection_id);
        } else {
            self.pairs.remove(&pair);
            self.by_connection.remove_if_mut(&connection_id, |_, pairs| {
                pairs.remove(&pair);
                pairs.is_empty()
            });
        }
    }

    /// Forget every pair a connection still owns, returning how many
    pub fn clear_connection(&self, connection_id: ConnectionId) -> usize {
        let Some((_, started)) = self.by_connection.remove(&connection_id) else {
            return 0;
        };

        started
            .iter()
            .filter(|pair| {
                self.pairs
                    .remove_if(*pair, |_, owner| *owner == connection_id)
                    .is_some()
            })
            .count()
    }

    /// Number of pairs currently typing
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

//! Connection registry
//!
//! Binds live connections to authenticated users and keeps the per-user
//! live-connection count that presence is derived from.
//!
//! Every count change for a user happens while that user's map entry is
//! locked, and the resulting edge is published before the lock is released.
//! That makes the sequence of edges for one user strictly alternate
//! (online, offline, online, ...) no matter how connects and disconnects
//! from different tasks interleave.
//!
//! Lock order is `bindings` before `users`. Neither lock is held across an
//! await point or any I/O.

use crate::diagnostics::Diagnostics;
use crate::presence::{Edge, PresenceCounter, PresenceTransition, TransitionSink};
use crate::subscription::SubscriptionTable;
use chat_core::{ConnectionId, RoomId, UserId};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Presence bookkeeping for one online user
#[derive(Debug, Clone, Copy)]
struct UserPresenceEntry {
    counter: PresenceCounter,
    /// Last time the user was observed coming online
    last_seen: DateTime<Utc>,
}

/// Outcome of tearing down a connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unregistered {
    /// Owning user, if the connection had authenticated
    pub user_id: Option<UserId>,
    /// Rooms the connection was removed from
    pub rooms: Vec<RoomId>,
    /// Offline edge, if this was the user's last connection
    pub transition: Option<PresenceTransition>,
}

/// Live connections per user
pub struct ConnectionRegistry {
    /// Connection to owning user
    bindings: DashMap<ConnectionId, UserId>,

    /// Online users only; an entry is removed when its count reaches zero
    users: DashMap<UserId, UserPresenceEntry>,

    subscriptions: Arc<SubscriptionTable>,
    sink: Arc<dyn TransitionSink>,
    diagnostics: Arc<Diagnostics>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new(
        subscriptions: Arc<SubscriptionTable>,
        sink: Arc<dyn TransitionSink>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            bindings: DashMap::new(),
            users: DashMap::new(),
            subscriptions,
            sink,
            diagnostics,
        }
    }

    /// Bind a connection to a user
    ///
    /// Binding the same pair again is a no-op. Binding an already bound
    /// connection to a different user releases the old binding first, so the
    /// result can hold an offline edge for the old user followed by an online
    /// edge for the new one.
    pub fn register(&self, user_id: &UserId, connection_id: ConnectionId) -> Vec<PresenceTransition> {
        let mut transitions = Vec::new();

        match self.bindings.entry(connection_id) {
            Entry::Occupied(mut bound) => {
                if bound.get() == user_id {
                    return transitions;
                }

                let previous = bound.insert(user_id.clone());
                tracing::info!(
                    connection_id = %connection_id,
                    previous_user_id = %previous,
                    user_id = %user_id,
                    "Connection rebound to another user"
                );

                transitions.extend(self.release(&previous));
                transitions.extend(self.acquire(user_id));
            }
            Entry::Vacant(slot) => {
                slot.insert(user_id.clone());
                transitions.extend(self.acquire(user_id));
            }
        }

        tracing::debug!(
            connection_id = %connection_id,
            user_id = %user_id,
            live = self.live_connections(user_id),
            "Connection registered"
        );

        transitions
    }

    /// Tear down a connection
    ///
    /// Removes it from every room it joined and releases its user binding.
    /// Unknown and unauthenticated connections only have their rooms cleared.
    pub fn unregister(&self, connection_id: ConnectionId) -> Unregistered {
        let user_id = self.bindings.remove(&connection_id).map(|(_, user_id)| user_id);
        let rooms = self.subscriptions.leave_all(connection_id);
        let transition = user_id.as_ref().and_then(|user_id| self.release(user_id));

        tracing::debug!(
            connection_id = %connection_id,
            user_id = ?user_id.as_ref().map(UserId::as_str),
            rooms = rooms.len(),
            "Connection unregistered"
        );

        Unregistered {
            user_id,
            rooms,
            transition,
        }
    }

    /// Count one more connection for a user, publishing the online edge
    fn acquire(&self, user_id: &UserId) -> Option<PresenceTransition> {
        let now = Utc::now();
        let mut entry = self
            .users
            .entry(user_id.clone())
            .or_insert_with(|| UserPresenceEntry {
                counter: PresenceCounter::new(),
                last_seen: now,
            });

        match entry.counter.increment() {
            Edge::Rose => {
                entry.last_seen = now;
                let transition = PresenceTransition::online(user_id.clone(), now);
                self.emit(&transition);
                Some(transition)
            }
            Edge::Fell | Edge::Unchanged => None,
        }
    }

    /// Count one fewer connection for a user, publishing the offline edge
    fn release(&self, user_id: &UserId) -> Option<PresenceTransition> {
        let now = Utc::now();
        let mut present = false;
        let mut transition = None;

        self.users.remove_if_mut(user_id, |_, entry| {
            present = true;
            match entry.counter.decrement() {
                Some(Edge::Fell) => {
                    entry.last_seen = now;
                    let offline = PresenceTransition::offline(user_id.clone(), now);
                    self.emit(&offline);
                    transition = Some(offline);
                    true
                }
                Some(Edge::Rose | Edge::Unchanged) => false,
                None => {
                    self.diagnostics.record_invariant_violation();
                    tracing::warn!(user_id = %user_id, "Zero-count presence entry released");
                    true
                }
            }
        });

        if !present {
            self.diagnostics.record_invariant_violation();
            tracing::warn!(user_id = %user_id, "Released user with no live connections");
        }

        transition
    }

    /// Publish an edge; caller holds the user's entry lock
    fn emit(&self, transition: &PresenceTransition) {
        self.diagnostics.record_edge(transition.online);
        self.sink.publish(transition.clone());
    }

    /// Whether the user has at least one live connection
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.users
            .get(user_id)
            .is_some_and(|entry| entry.counter.is_online())
    }

    /// Number of live connections bound to a user
    pub fn live_connections(&self, user_id: &UserId) -> u32 {
        self.users
            .get(user_id)
            .map_or(0, |entry| entry.counter.live())
    }

    /// When the user last came online, if they are online now
    pub fn last_seen(&self, user_id: &UserId) -> Option<DateTime<Utc>> {
        self.users.get(user_id).map(|entry| entry.last_seen)
    }

    /// Number of online users
    pub fn online_users(&self) -> usize {
        self.users.len()
    }

    /// Number of connections bound to a user
    pub fn bound_connections(&self) -> usize {
        self.bindings.len()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("bindings", &self.bindings.len())
            .field("users", &self.users.len())
            .finish_non_exhaustive()
    }
}

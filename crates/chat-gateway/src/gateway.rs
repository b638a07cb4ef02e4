//! Gateway facade
//!
//! Owns the registry, subscription table, router and connection manager for
//! one process. Constructed once at startup; every transport handler and the
//! message-store ingress go through it.

use crate::connection::{Connection, ConnectionManager, ConnectionRegistry, Frame};
use crate::diagnostics::{Diagnostics, DiagnosticsSnapshot};
use crate::presence::{PresenceAggregator, PresencePump};
use crate::router::EventRouter;
use crate::subscription::SubscriptionTable;
use chat_core::{ConnectionId, RoomId, UserDirectory, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Presence of one user as seen by this process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPresence {
    pub user_id: UserId,
    pub is_online: bool,
    pub connections: u32,
    /// When the user came online, while they are online
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen_at: Option<DateTime<Utc>>,
}

/// Live gauges plus diagnostic counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStats {
    pub connections: usize,
    pub bound_connections: usize,
    pub online_users: usize,
    pub active_rooms: usize,
    pub subscriptions: usize,
    pub typing: usize,
    pub diagnostics: DiagnosticsSnapshot,
}

/// The real-time layer of one process
pub struct Gateway {
    connections: Arc<ConnectionManager>,
    subscriptions: Arc<SubscriptionTable>,
    registry: Arc<ConnectionRegistry>,
    router: EventRouter,
    diagnostics: Arc<Diagnostics>,
    outbound_buffer: usize,
}

impl Gateway {
    /// Build a gateway and the presence pump that must run alongside it
    ///
    /// Presence updates are only broadcast while the pump is running.
    pub fn new(directory: Arc<dyn UserDirectory>, outbound_buffer: usize) -> (Arc<Self>, PresencePump) {
        let diagnostics = Arc::new(Diagnostics::new());
        let connections = Arc::new(ConnectionManager::new(diagnostics.clone()));
        let subscriptions = Arc::new(SubscriptionTable::new());

        let (aggregator, feed) = PresenceAggregator::new();
        let registry = Arc::new(ConnectionRegistry::new(
            subscriptions.clone(),
            Arc::new(aggregator),
            diagnostics.clone(),
        ));
        let router = EventRouter::new(registry.clone(), subscriptions.clone(), diagnostics.clone());
        let pump = PresencePump::new(feed, connections.clone(), directory, diagnostics.clone());

        let gateway = Arc::new(Self {
            connections,
            subscriptions,
            registry,
            router,
            diagnostics,
            outbound_buffer: outbound_buffer.max(1),
        });

        (gateway, pump)
    }

    /// Accept a new transport session
    ///
    /// The returned receiver is the connection's outbound queue; it closes once
    /// the connection is torn down.
    pub fn open_connection(&self) -> (Arc<Connection>, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(self.outbound_buffer);
        let connection = self.connections.add_connection(ConnectionId::new(), tx);
        (connection, rx)
    }

    /// Handle an inbound text frame, returning the number of frames queued
    ///
    /// Frames for a connection that is not open are ignored, so nothing a
    /// closed connection sends can bind it to a user or a room again.
    pub fn handle_text(&self, connection_id: ConnectionId, text: &str) -> usize {
        if !self.connections.has_connection(connection_id) {
            tracing::debug!(connection_id = %connection_id, "Frame for closed connection ignored");
            return 0;
        }

        let deliveries = self.router.handle_text(connection_id, text);
        self.connections.deliver_all(&deliveries)
    }

    /// Count an inbound frame the transport could not interpret
    pub fn reject_frame(&self, connection_id: ConnectionId, reason: &str) {
        self.diagnostics.record_protocol_error();
        tracing::debug!(connection_id = %connection_id, reason = reason, "Dropped inbound frame");
    }

    /// Tear down a connection
    ///
    /// Must run exactly once per opened connection, after the transport has
    /// stopped calling [`Gateway::handle_text`] for it. A second call is
    /// counted as an invariant violation and otherwise ignored.
    pub fn close_connection(&self, connection_id: ConnectionId) {
        if self.connections.remove_connection(connection_id).is_none() {
            self.diagnostics.record_invariant_violation();
            tracing::warn!(connection_id = %connection_id, "Connection torn down twice");
            return;
        }

        let outcome = self.router.disconnect(connection_id);

        tracing::info!(
            connection_id = %connection_id,
            user_id = ?outcome.user_id.as_ref().map(UserId::as_str),
            rooms_left = outcome.rooms.len(),
            went_offline = outcome.transition.is_some(),
            "Connection closed"
        );
    }

    /// Fan out a newly committed message to a room
    pub fn message_created(&self, room_id: &RoomId, message: Value) -> usize {
        self.connections
            .deliver(&self.router.message_created(room_id, message))
    }

    /// Fan out an updated message to a room
    pub fn message_updated(&self, room_id: &RoomId, message: Value) -> usize {
        self.connections
            .deliver(&self.router.message_updated(room_id, message))
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.registry.is_online(user_id)
    }

    /// Presence of a user as seen by this process
    pub fn presence_of(&self, user_id: &UserId) -> UserPresence {
        let connections = self.registry.live_connections(user_id);
        UserPresence {
            user_id: user_id.clone(),
            is_online: connections > 0,
            connections,
            last_seen_at: self.registry.last_seen(user_id),
        }
    }

    /// Current gauges and counters
    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            connections: self.connections.connection_count(),
            bound_connections: self.registry.bound_connections(),
            online_users: self.registry.online_users(),
            active_rooms: self.subscriptions.room_count(),
            subscriptions: self.subscriptions.subscription_count(),
            typing: self.router.typing().len(),
            diagnostics: self.diagnostics.snapshot(),
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("connections", &self.connections)
            .field("registry", &self.registry)
            .field("outbound_buffer", &self.outbound_buffer)
            .finish_non_exhaustive()
    }
}

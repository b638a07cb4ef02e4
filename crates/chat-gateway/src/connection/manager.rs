//! Connection manager
//!
//! Owns the outbound side of every live connection and performs fan-out.

use super::{Connection, Frame};
use crate::diagnostics::Diagnostics;
use crate::router::{Audience, Delivery};
use chat_core::ConnectionId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Manages all active WebSocket connections
///
/// Uses `DashMap` for concurrent access to connection state. Fan-out copies
/// the recipient handles out of the map before sending, so no map lock is held
/// while a frame is queued.
pub struct ConnectionManager {
    /// Active connections by ID
    connections: DashMap<ConnectionId, Arc<Connection>>,

    diagnostics: Arc<Diagnostics>,
}

impl ConnectionManager {
    /// Create a new connection manager
    #[must_use]
    pub fn new(diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            connections: DashMap::new(),
            diagnostics,
        }
    }

    /// Register a new connection with its outbound queue
    pub fn add_connection(&self, id: ConnectionId, sender: mpsc::Sender<Frame>) -> Arc<Connection> {
        let connection = Connection::new(id, sender);
        self.connections.insert(id, connection.clone());

        tracing::debug!(connection_id = %id, "Connection added");

        connection
    }

    /// Remove a connection
    ///
    /// Dropping the returned handle (and the handler's own) closes the
    /// outbound queue, which ends the send task.
    pub fn remove_connection(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        let removed = self.connections.remove(&id).map(|(_, connection)| connection);
        if removed.is_some() {
            tracing::debug!(connection_id = %id, "Connection removed");
        }
        removed
    }

    /// Get a connection by ID
    pub fn get_connection(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(&id).map(|r| r.clone())
    }

    /// Send a delivery to its audience
    ///
    /// The event is serialized once. Sends are best-effort: a closed or
    /// saturated recipient is skipped and counted, and the rest still receive
    /// the frame. Returns the number of connections the frame was queued on.
    pub fn deliver(&self, delivery: &Delivery) -> usize {
        let frame: Frame = match delivery.event.to_json() {
            Ok(json) => Arc::from(json),
            Err(e) => {
                tracing::error!(event = %delivery.event, error = %e, "Failed to serialize event");
                return 0;
            }
        };

        let recipients = self.snapshot(&delivery.audience);
        let mut sent = 0;

        for connection in recipients {
            match connection.try_deliver(frame.clone()) {
                Ok(()) => sent += 1,
                Err(e) => {
                    self.diagnostics.record_send_failure();
                    tracing::debug!(
                        connection_id = %connection.id(),
                        event = %delivery.event,
                        error = %e,
                        "Dropped outbound frame"
                    );
                }
            }
        }

        self.diagnostics.record_deliveries(sent);
        tracing::trace!(event = %delivery.event, sent = sent, "Event delivered");

        sent
    }

    /// Send every delivery in order, returning the total number of frames queued
    pub fn deliver_all(&self, deliveries: &[Delivery]) -> usize {
        deliveries.iter().map(|delivery| self.deliver(delivery)).sum()
    }

    /// Copy the recipient handles out of the map
    fn snapshot(&self, audience: &Audience) -> Vec<Arc<Connection>> {
        match audience {
            Audience::Everyone => self.connections.iter().map(|r| r.value().clone()).collect(),
            Audience::Connections(ids) => ids
                .iter()
                .filter_map(|id| self.get_connection(*id))
                .collect(),
        }
    }

    /// Get the total number of active connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Check if a connection exists
    pub fn has_connection(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .finish_non_exhaustive()
    }
}

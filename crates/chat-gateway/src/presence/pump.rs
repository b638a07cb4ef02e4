//! Presence pump
//!
//! Single task that drains the presence feed. Each edge is broadcast as
//! `presence:update` to every live connection in linearization order, then
//! handed to the [`DirectoryWriter`], which reports it to the user directory
//! without holding up the next broadcast.

use super::{DirectoryWriter, PresenceFeed, PresenceTransition};
use crate::connection::ConnectionManager;
use crate::diagnostics::Diagnostics;
use crate::router::Delivery;
use chat_core::UserDirectory;
use std::sync::Arc;
use std::time::Duration;

/// Drains the presence feed
pub struct PresencePump {
    feed: PresenceFeed,
    connections: Arc<ConnectionManager>,
    writer: DirectoryWriter,
}

impl PresencePump {
    pub fn new(
        feed: PresenceFeed,
        connections: Arc<ConnectionManager>,
        directory: Arc<dyn UserDirectory>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            feed,
            connections,
            writer: DirectoryWriter::new(directory, diagnostics),
        }
    }

    /// Override the directory call timeout
    #[must_use]
    pub fn with_directory_timeout(mut self, timeout: Duration) -> Self {
        self.writer = self.writer.with_timeout(timeout);
        self
    }

    /// Run until the feed closes
    ///
    /// Returns the writer so callers can wait for outstanding directory
    /// writes.
    pub async fn run(mut self) -> DirectoryWriter {
        tracing::info!("Presence pump started");

        while let Some(transition) = self.feed.next().await {
            self.dispatch(transition);
        }

        tracing::info!(
            pending_writes = self.writer.pending(),
            "Presence pump stopped"
        );
        self.writer
    }

    /// Spawn the pump onto the runtime
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    fn dispatch(&self, transition: PresenceTransition) {
        let sent = self
            .connections
            .deliver(&Delivery::everyone(transition.to_event()));

        tracing::debug!(
            user_id = %transition.user_id,
            online = transition.online,
            sent = sent,
            "Presence update broadcast"
        );

        self.writer.submit(transition);
    }
}

impl std::fmt::Debug for PresencePump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresencePump")
            .field("writer", &self.writer)
            .finish_non_exhaustive()
    }
}

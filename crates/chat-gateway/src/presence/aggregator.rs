//! Presence aggregator
//!
//! Collects the edges the registry detects into a single ordered feed. The
//! feed is drained by one [`PresencePump`](super::PresencePump), so every
//! connection observes presence updates in the order they were linearized.

use super::{PresenceTransition, TransitionSink};
use tokio::sync::mpsc;

/// Sink side of the presence feed
#[derive(Debug)]
pub struct PresenceAggregator {
    feed: mpsc::UnboundedSender<PresenceTransition>,
}

/// Receiving side of the presence feed
#[derive(Debug)]
pub struct PresenceFeed {
    receiver: mpsc::UnboundedReceiver<PresenceTransition>,
}

impl PresenceAggregator {
    /// Create an aggregator and the feed it writes to
    #[must_use]
    pub fn new() -> (Self, PresenceFeed) {
        let (feed, receiver) = mpsc::unbounded_channel();
        (Self { feed }, PresenceFeed { receiver })
    }
}

impl TransitionSink for PresenceAggregator {
    fn publish(&self, transition: PresenceTransition) {
        tracing::debug!(
            user_id = %transition.user_id,
            online = transition.online,
            "Presence edge"
        );

        // Unbounded so the registry never waits on the pump.
        if self.feed.send(transition).is_err() {
            tracing::debug!("Presence feed closed, edge dropped");
        }
    }
}

impl PresenceFeed {
    /// Next edge, or `None` once every aggregator is gone
    pub async fn next(&mut self) -> Option<PresenceTransition> {
        self.receiver.recv().await
    }
}

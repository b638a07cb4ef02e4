//! Individual WebSocket connection
//!
//! The outbound half of one live transport session. Frames are serialized
//! once per fan-out and shared between recipients.

use chat_core::ConnectionId;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A serialized outbound text frame
pub type Frame = Arc<str>;

/// A single WebSocket connection
pub struct Connection {
    id: ConnectionId,

    /// Queue drained by the connection's send task
    sender: mpsc::Sender<Frame>,
}

impl Connection {
    /// Create a new connection
    pub fn new(id: ConnectionId, sender: mpsc::Sender<Frame>) -> Arc<Self> {
        Arc::new(Self { id, sender })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a frame without waiting
    ///
    /// Fails if the send task has gone away or the queue is full; a slow
    /// consumer never holds up the broadcaster.
    pub fn try_deliver(&self, frame: Frame) -> Result<(), mpsc::error::TrySendError<Frame>> {
        self.sender.try_send(frame)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("queued", &(self.sender.max_capacity() - self.sender.capacity()))
            .finish()
    }
}

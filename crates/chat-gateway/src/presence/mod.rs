//! Presence aggregation
//!
//! Turns per-user connection counts into edge-triggered online/offline
//! signals and fans them out to every connection.

mod aggregator;
mod counter;
mod pump;
mod transition;
mod writer;

pub use aggregator::{PresenceAggregator, PresenceFeed};
pub use counter::{Edge, PresenceCounter};
pub use pump::PresencePump;
pub use transition::{PresenceTransition, TransitionSink};
pub use writer::{DirectoryWriter, DIRECTORY_TIMEOUT};

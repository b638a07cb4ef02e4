//! Outbound deliveries
//!
//! The router decides who receives what; the connection manager performs the
//! sends. A [`Delivery`] is the hand-off between the two.

use crate::protocol::ServerEvent;
use chat_core::ConnectionId;

/// Recipients of a delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Every live connection, authenticated or not
    Everyone,
    /// A snapshot of specific connections
    Connections(Vec<ConnectionId>),
}

/// One event addressed to an audience
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub audience: Audience,
    pub event: ServerEvent,
}

impl Delivery {
    #[must_use]
    pub fn everyone(event: ServerEvent) -> Self {
        Self {
            audience: Audience::Everyone,
            event,
        }
    }

    #[must_use]
    pub fn to(connections: Vec<ConnectionId>, event: ServerEvent) -> Self {
        Self {
            audience: Audience::Connections(connections),
            event,
        }
    }
}

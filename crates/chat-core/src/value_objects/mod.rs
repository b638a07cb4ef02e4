//! Value objects

mod ids;

pub use ids::{ConnectionId, RoomId, UserId};

//! Event routing
//!
//! Maps inbound client events and message-store notifications to the
//! connections that should see them.

mod delivery;
mod router;
mod typing;

pub use delivery::{Audience, Delivery};
pub use router::EventRouter;
pub use typing::TypingState;

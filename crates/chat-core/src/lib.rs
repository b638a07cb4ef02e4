//! # chat-core
//!
//! Domain layer for the real-time gateway: identifier value objects, the
//! collaborator traits the gateway depends on, and domain errors.
//! This crate has zero dependencies on infrastructure (web framework, transport, etc.).

pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use error::DomainError;
pub use traits::{DirectoryResult, UserDirectory};
pub use value_objects::{ConnectionId, RoomId, UserId};

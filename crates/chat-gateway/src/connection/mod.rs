//! Connection management
//!
//! Live transport connections, their outbound queues, and the registry that
//! binds them to users.

mod connection;
mod manager;
mod registry;

pub use connection::{Connection, Frame};
pub use manager::ConnectionManager;
pub use registry::{ConnectionRegistry, Unregistered};

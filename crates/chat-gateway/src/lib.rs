//! # chat-gateway
//!
//! Real-time layer of the chat product: tracks which users are reachable
//! across their live connections, which connections listen to which rooms,
//! and fans presence, typing and message events out to the right sockets.

pub mod connection;
pub mod diagnostics;
pub mod directory;
pub mod gateway;
pub mod presence;
pub mod protocol;
pub mod router;
pub mod server;
pub mod subscription;

pub use directory::{InMemoryUserDirectory, NoopUserDirectory};
pub use gateway::{Gateway, GatewayStats, UserPresence};
pub use server::{create_app, create_gateway_state, run, run_server, GatewayState};

//! Room subscriptions
//!
//! Which live connections are listening to which rooms.

mod table;

pub use table::SubscriptionTable;

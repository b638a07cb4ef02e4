//! User directory port
//!
//! The user directory is the external store that owns user records. The
//! real-time layer never reads from it on the hot path; it only reports
//! presence transitions so the directory can keep its `is_online` /
//! `last_seen_at` fields current.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DomainError;
use crate::value_objects::UserId;

/// Result type for directory operations
pub type DirectoryResult<T> = Result<T, DomainError>;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Record a presence transition for a user
    ///
    /// Called once per online/offline edge, in the order the edges happened.
    async fn set_presence(&self, user_id: &UserId, online: bool, at: DateTime<Utc>)
        -> DirectoryResult<()>;
}

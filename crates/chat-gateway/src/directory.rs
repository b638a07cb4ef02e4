//! User directory adapters
//!
//! The gateway reports presence edges to the user directory. Deployments wire
//! in their own store; these two cover running without one and tests.

use async_trait::async_trait;
use chat_core::{DirectoryResult, DomainError, UserDirectory, UserId};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Directory that accepts and discards every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUserDirectory;

#[async_trait]
impl UserDirectory for NoopUserDirectory {
    async fn set_presence(
        &self,
        user_id: &UserId,
        online: bool,
        _at: DateTime<Utc>,
    ) -> DirectoryResult<()> {
        tracing::trace!(user_id = %user_id, online = online, "Directory update skipped");
        Ok(())
    }
}

/// Stored presence fields of one user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceRecord {
    pub is_online: bool,
    pub last_seen_at: DateTime<Utc>,
}

/// Process-local directory
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    records: DashMap<UserId, PresenceRecord>,
    unavailable: AtomicBool,
}

impl InMemoryUserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored record for a user
    pub fn get(&self, user_id: &UserId) -> Option<PresenceRecord> {
        self.records.get(user_id).map(|r| *r)
    }

    /// Make subsequent updates fail with `DirectoryUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn set_presence(
        &self,
        user_id: &UserId,
        online: bool,
        at: DateTime<Utc>,
    ) -> DirectoryResult<()> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(DomainError::DirectoryUnavailable(
                "in-memory directory switched off".to_string(),
            ));
        }

        self.records.insert(
            user_id.clone(),
            PresenceRecord {
                is_online: online,
                last_seen_at: at,
            },
        );
        Ok(())
    }
}

//! Directory writer
//!
//! Reports presence edges to the user directory off the broadcast path. Each
//! edge gets its own task; a task first waits for the previous write of the
//! same user, so writes stay in edge order per user while different users
//! never wait on each other.

use super::PresenceTransition;
use crate::diagnostics::Diagnostics;
use chat_core::{UserDirectory, UserId};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Upper bound on a single directory call
pub const DIRECTORY_TIMEOUT: Duration = Duration::from_secs(5);

/// Last write scheduled for a user
#[derive(Debug)]
struct Tail {
    sequence: u64,
    handle: Option<JoinHandle<()>>,
}

/// Per-user ordered directory updates
pub struct DirectoryWriter {
    directory: Arc<dyn UserDirectory>,
    diagnostics: Arc<Diagnostics>,
    tails: Arc<DashMap<UserId, Tail>>,
    sequence: AtomicU64,
    timeout: Duration,
}

impl DirectoryWriter {
    pub fn new(directory: Arc<dyn UserDirectory>, diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            directory,
            diagnostics,
            tails: Arc::new(DashMap::new()),
            sequence: AtomicU64::new(0),
            timeout: DIRECTORY_TIMEOUT,
        }
    }

    /// Override the directory call timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Schedule a directory write for an edge
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, transition: PresenceTransition) {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let user_id = transition.user_id.clone();

        // The entry lock is held until the new tail is stored, so a finishing
        // task can never remove a tail it does not own.
        let mut tail = self.tails.entry(user_id.clone()).or_insert(Tail {
            sequence,
            handle: None,
        });
        let previous = tail.handle.take();

        let directory = self.directory.clone();
        let diagnostics = self.diagnostics.clone();
        let tails = self.tails.clone();
        let timeout = self.timeout;

        let handle = tokio::spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            write(directory.as_ref(), &diagnostics, &transition, timeout).await;
            tails.remove_if(&user_id, |_, tail| tail.sequence == sequence);
        });

        tail.sequence = sequence;
        tail.handle = Some(handle);
    }

    /// Users with a directory write still in flight
    pub fn pending(&self) -> usize {
        self.tails.len()
    }
}

async fn write(
    directory: &dyn UserDirectory,
    diagnostics: &Diagnostics,
    transition: &PresenceTransition,
    timeout: Duration,
) {
    let update = directory.set_presence(&transition.user_id, transition.online, transition.at);

    match tokio::time::timeout(timeout, update).await {
        Ok(Ok(())) => {
            tracing::trace!(
                user_id = %transition.user_id,
                online = transition.online,
                "User directory updated"
            );
        }
        Ok(Err(e)) => {
            diagnostics.record_directory_failure();
            tracing::warn!(
                user_id = %transition.user_id,
                code = e.code(),
                error = %e,
                "User directory update failed"
            );
        }
        Err(_) => {
            diagnostics.record_directory_failure();
            tracing::warn!(
                user_id = %transition.user_id,
                timeout_ms = timeout.as_millis(),
                "User directory update timed out"
            );
        }
    }
}

impl std::fmt::Debug for DirectoryWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryWriter")
            .field("pending", &self.tails.len())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

//! Edge-detecting connection counter

/// What a counter change did to aggregate presence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// 0 → 1: the user came online
    Rose,
    /// 1 → 0: the user went offline
    Fell,
    /// Count changed without crossing zero
    Unchanged,
}

/// Live connection count for one user
///
/// Callers must serialize access per user; the counter itself is plain data.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PresenceCounter {
    live: u32,
}

impl PresenceCounter {
    #[must_use]
    pub const fn new() -> Self {
        Self { live: 0 }
    }

    pub const fn live(self) -> u32 {
        self.live
    }

    pub const fn is_online(self) -> bool {
        self.live > 0
    }

    /// Count one more connection
    pub fn increment(&mut self) -> Edge {
        self.live = self.live.saturating_add(1);
        if self.live == 1 {
            Edge::Rose
        } else {
            Edge::Unchanged
        }
    }

    /// Count one fewer connection
    ///
    /// Returns `None` when the count is already zero; the counter is left
    /// untouched.
    pub fn decrement(&mut self) -> Option<Edge> {
        self.live = self.live.checked_sub(1)?;
        Some(if self.live == 0 {
            Edge::Fell
        } else {
            Edge::Unchanged
        })
    }
}

//! Persistence seams used by the gate.
//!
//! Both stores are the single source of truth: the gate keeps no in-process
//! cache on top of them. Implementations must be safe to share between
//! request handlers.

use chrono::{DateTime, Utc};

use crate::Result;

/// Per-client request counters keyed by `(client_id, window_start)`.
pub trait CounterStore: Send + Sync {
    /// Current count for the window, `0` when no row exists.
    fn get(&self, client_id: &str, window_start: DateTime<Utc>) -> Result<u32>;

    /// Insert the window at 1 or increment it, atomically, returning the new count.
    fn upsert_increment(&self, client_id: &str, window_start: DateTime<Utc>) -> Result<u32>;

    /// Increment the window only while its count is below `ceiling`, in one
    /// atomic step. Returns the new count, or `None` when the window is full.
    fn try_increment(
        &self,
        client_id: &str,
        window_start: DateTime<Utc>,
        ceiling: u32,
    ) -> Result<Option<u32>>;

    /// Delete every window that started before `cutoff`; returns rows removed.
    fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

/// The single site-wide API key.
pub trait SecretStore: Send + Sync {
    /// The active key, if one has been set.
    fn get_current_key(&self) -> Result<Option<String>>;

    /// Replace the active key. The previous key is not retained.
    fn set_current_key(&self, key: &str) -> Result<()>;
}

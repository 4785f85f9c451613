//! In-memory TTL cache
//!
//! Entries carry an absolute expiry instant and are checked lazily on read.
//! There is no background sweeper and no size bound: the cache lives for one
//! client session and is emptied by `clear()` at logout.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::clock::{self, Clock, SystemClock};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Key/value store with per-entry time-to-live
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Creates an empty cache reading wall-clock time
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty cache reading time from `clock`
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Stores `value` under `key`, replacing any previous entry and its expiry
    pub fn set(&self, key: &str, value: V, ttl_ms: u64) {
        let now = self.clock.now();
        let entry = CacheEntry {
            value,
            expires_at: clock::expires_at(now, ttl_ms),
        };
        self.entries.lock().insert(key.to_string(), entry);
    }

    /// Returns the value for `key` if present and not expired
    ///
    /// An expired entry is removed as a side effect.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let entry = entries.get(key)?;
        if clock::is_live(now, entry.expires_at) {
            return Some(entry.value.clone());
        }

        entries.remove(key);
        None
    }

    /// Removes `key` regardless of expiry
    pub fn invalidate(&self, key: &str) {
        self.entries.lock().remove(key);
    }

    /// Removes every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Drops all expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, e| clock::is_live(now, e.expires_at));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet read
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no entries are stored
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

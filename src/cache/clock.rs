//! Time sources for cache expiry
//!
//! Cache stores never call `Utc::now()` directly; they read time through a
//! `Clock` so tests can advance simulated time instead of sleeping.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Source of the current time
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
///
/// Clones share the same underlying instant, so a test can keep one handle
/// and give another to a cache.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Creates a clock frozen at the given instant
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Moves the clock forward by `ms` milliseconds
    pub fn advance_ms(&self, ms: i64) {
        let mut now = self.now.lock();
        *now += Duration::milliseconds(ms);
    }

    /// Sets the clock to an absolute instant
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Computes `now + ttl_ms`, saturating at the maximum representable instant
pub(crate) fn expires_at(now: DateTime<Utc>, ttl_ms: u64) -> DateTime<Utc> {
    i64::try_from(ttl_ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// An entry is live strictly before its expiry instant
pub(crate) fn is_live(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> bool {
    now < expires_at
}

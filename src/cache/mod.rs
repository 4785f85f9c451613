//! Cache module for storing API responses
//!
//! Two stores share one contract: `TtlCache` keeps entries in memory for the
//! life of a client, `CacheManager` persists them as JSON files. Both check
//! expiry lazily on read and never surface an error to the caller; absence is
//! an ordinary outcome.

mod clock;
mod key;
mod manager;
mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use key::{cache_key, KEY_PREFIX};
pub use manager::CacheManager;
pub use memory::TtlCache;

use serde_json::Value;

/// Storage backend for decoded response bodies
pub trait ResponseStore: Send + Sync {
    /// Returns the live value for `key`, if any
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key` for `ttl_ms` milliseconds
    fn set(&self, key: &str, value: Value, ttl_ms: u64);

    /// Removes `key` regardless of expiry
    fn invalidate(&self, key: &str);

    /// Removes every entry
    fn clear(&self);
}

impl ResponseStore for TtlCache<Value> {
    fn get(&self, key: &str) -> Option<Value> {
        TtlCache::get(self, key)
    }

    fn set(&self, key: &str, value: Value, ttl_ms: u64) {
        TtlCache::set(self, key, value, ttl_ms)
    }

    fn invalidate(&self, key: &str) {
        TtlCache::invalidate(self, key)
    }

    fn clear(&self) {
        TtlCache::clear(self)
    }
}

impl ResponseStore for CacheManager {
    fn get(&self, key: &str) -> Option<Value> {
        self.read(key)
    }

    fn set(&self, key: &str, value: Value, ttl_ms: u64) {
        self.write(key, &value, ttl_ms)
    }

    fn invalidate(&self, key: &str) {
        self.remove(key)
    }

    fn clear(&self) {
        CacheManager::clear(self)
    }
}

impl<S: ResponseStore + ?Sized> ResponseStore for Box<S> {
    fn get(&self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value, ttl_ms: u64) {
        (**self).set(key, value, ttl_ms)
    }

    fn invalidate(&self, key: &str) {
        (**self).invalidate(key)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

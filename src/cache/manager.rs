//! Cache manager for persisting API responses to disk
//!
//! Provides a `CacheManager` that stores serializable data as JSON files with
//! expiry timestamps, so cached responses survive between CLI invocations.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use super::clock::{self, Clock, SystemClock};

/// Longest escaped key used verbatim as a file stem
const MAX_PLAIN_STEM: usize = 200;

/// Escaped-key prefix kept in front of the digest for long keys
const HASHED_PREFIX_LEN: usize = 120;

/// Wrapper struct for cached data stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// The full cache key, checked on read since long keys share a hashed name
    key: String,
    /// The cached data
    data: T,
    /// When the data was cached
    cached_at: DateTime<Utc>,
    /// When the cache entry expires
    expires_at: DateTime<Utc>,
}

/// Manages reading and writing cached data to disk
///
/// The cache manager stores data as JSON files in an XDG-compliant cache directory
/// (`~/.cache/healthtrack/` on Linux). Expired entries are never returned; reading
/// one deletes its file.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl CacheManager {
    /// Creates a new CacheManager using XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "healthtrack")?;
        let cache_dir = project_dirs.cache_dir().join("responses");
        Some(Self::with_dir(cache_dir))
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source used for expiry checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the path to a cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", file_stem(key)))
    }

    /// Writes data to the cache with a TTL in milliseconds
    ///
    /// Failures are logged and otherwise ignored: a cache that cannot persist
    /// behaves like a cache that missed.
    pub fn write<T: Serialize>(&self, key: &str, data: &T, ttl_ms: u64) {
        if let Err(e) = self.try_write(key, data, ttl_ms) {
            warn!(key, error = %e, "failed to persist cache entry");
        }
    }

    fn try_write<T: Serialize>(&self, key: &str, data: &T, ttl_ms: u64) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;

        let now = self.clock.now();
        let entry = CacheEntry {
            key: key.to_string(),
            data,
            cached_at: now,
            expires_at: clock::expires_at(now, ttl_ms),
        };

        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(self.cache_path(key), json)
    }

    /// Reads live data from the cache
    ///
    /// Returns `None` if the entry doesn't exist, cannot be parsed, or has
    /// expired. Unreadable and expired files are removed.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.cache_path(key);
        let content = fs::read_to_string(&path).ok()?;

        let entry: CacheEntry<T> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key, error = %e, "discarding unreadable cache file");
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        if entry.key != key {
            debug!(key, stored = %entry.key, "cache file belongs to another key");
            return None;
        }

        if !clock::is_live(self.clock.now(), entry.expires_at) {
            let _ = fs::remove_file(&path);
            return None;
        }

        Some(entry.data)
    }

    /// Deletes the entry for `key` if one exists
    pub fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.cache_path(key));
    }

    /// Deletes every cache file in the directory
    pub fn clear(&self) {
        let Ok(dir) = fs::read_dir(&self.cache_dir) else {
            return;
        };
        for entry in dir.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Err(e) = fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %e, "failed to remove cache file");
                }
            }
        }
    }
}

/// Escapes a cache key into a file name
///
/// ASCII alphanumerics, `-` and `.` pass through; every other byte becomes
/// `_xx`. Escaped keys longer than `MAX_PLAIN_STEM` are cut to a prefix and
/// suffixed with `~` and the SHA3-256 of the full key, keeping names under
/// the filesystem's 255-byte limit. `~` never appears in an escaped key, so
/// hashed and plain names cannot collide.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'.' {
            stem.push(byte as char);
        } else {
            let _ = write!(stem, "_{:02x}", byte);
        }
    }

    if stem.len() > MAX_PLAIN_STEM {
        // Escaped stems are pure ASCII, so any byte index is a char boundary
        stem.truncate(HASHED_PREFIX_LEN);
        stem.push('~');
        stem.push_str(&hex::encode(Sha3_256::digest(key.as_bytes())));
    }
    stem
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn create_test_cache() -> (CacheManager, ManualClock, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let clock = ManualClock::default();
        let cache = CacheManager::with_dir(temp_dir.path().to_path_buf())
            .with_clock(Arc::new(clock.clone()));
        (cache, clock, temp_dir)
    }

    fn sample(name: &str, value: i32) -> TestData {
        TestData {
            name: name.to_string(),
            value,
        }
    }

    #[test]
    fn test_write_creates_file_in_cache_directory() {
        let (cache, _clock, temp_dir) = create_test_cache();

        cache.write("test_key", &sample("test", 42), 60_000);

        let expected_path = temp_dir.path().join(format!("{}.json", file_stem("test_key")));
        assert!(expected_path.exists(), "Cache file should exist");

        let content = fs::read_to_string(&expected_path).expect("Should read file");
        assert!(content.contains("\"name\""));
        assert!(content.contains("\"test\""));
        assert!(content.contains("42"));
    }

    #[test]
    fn test_read_returns_none_for_missing_key() {
        let (cache, _clock, _temp_dir) = create_test_cache();

        let result: Option<TestData> = cache.read("nonexistent_key");

        assert!(result.is_none(), "Should return None for missing key");
    }

    #[test]
    fn test_read_returns_fresh_data() {
        let (cache, _clock, _temp_dir) = create_test_cache();
        let data = sample("fresh", 100);

        cache.write("fresh_key", &data, 60_000);

        let result: Option<TestData> = cache.read("fresh_key");
        assert_eq!(result, Some(data));
    }

    #[test]
    fn test_read_returns_none_and_deletes_file_when_expired() {
        let (cache, clock, temp_dir) = create_test_cache();

        cache.write("expired_key", &sample("expired", 0), 1000);
        clock.advance_ms(1500);

        let result: Option<TestData> = cache.read("expired_key");

        assert!(result.is_none(), "Expired entry must not be returned");
        let path = temp_dir.path().join(format!("{}.json", file_stem("expired_key")));
        assert!(!path.exists(), "Expired file should be removed");
    }

    #[test]
    fn test_unparseable_file_is_treated_as_missing() {
        let (cache, _clock, temp_dir) = create_test_cache();
        let path = temp_dir.path().join(format!("{}.json", file_stem("broken")));
        fs::write(&path, "not json").expect("Should write file");

        let result: Option<TestData> = cache.read("broken");

        assert!(result.is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_write_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache").join("dir");
        let cache = CacheManager::with_dir(nested_path.clone());

        cache.write("nested_key", &sample("nested", 1), 60_000);

        assert!(nested_path.exists(), "Nested directory should be created");
    }

    #[test]
    fn test_overwrite_existing_cache() {
        let (cache, _clock, _temp_dir) = create_test_cache();

        cache.write("overwrite_key", &sample("first", 1), 60_000);
        cache.write("overwrite_key", &sample("second", 2), 60_000);

        let result: Option<TestData> = cache.read("overwrite_key");
        assert_eq!(result, Some(sample("second", 2)), "Cache should contain latest data");
    }

    #[test]
    fn test_entries_survive_a_new_manager_over_same_dir() {
        let (cache, clock, temp_dir) = create_test_cache();
        cache.write("shared", &sample("persisted", 7), 60_000);

        let reopened = CacheManager::with_dir(temp_dir.path().to_path_buf())
            .with_clock(Arc::new(clock.clone()));

        let result: Option<TestData> = reopened.read("shared");
        assert_eq!(result, Some(sample("persisted", 7)));
    }

    #[test]
    fn test_remove_and_clear() {
        let (cache, _clock, _temp_dir) = create_test_cache();
        cache.write("a", &sample("a", 1), 60_000);
        cache.write("b", &sample("b", 2), 60_000);
        cache.write("c", &sample("c", 3), 60_000);

        cache.remove("a");
        assert!(cache.read::<TestData>("a").is_none());
        assert!(cache.read::<TestData>("b").is_some());

        cache.clear();
        assert!(cache.read::<TestData>("b").is_none());
        assert!(cache.read::<TestData>("c").is_none());
    }

    #[test]
    fn test_clear_on_missing_directory_is_noop() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = CacheManager::with_dir(temp_dir.path().join("absent"));
        cache.clear();
    }

    #[test]
    fn test_file_stem_escapes_path_characters() {
        assert_eq!(file_stem("api:GET /reports"), "api_3aGET_20_2freports");
        assert_eq!(file_stem("plain-key.v1"), "plain-key.v1");
    }

    #[test]
    fn test_file_stem_is_injective_for_underscores() {
        assert_ne!(file_stem("a/b"), file_stem("a_2fb"));
        assert_ne!(file_stem("a_b"), file_stem("a/b"));
    }

    #[test]
    fn test_long_key_gets_bounded_hashed_name() {
        let (cache, _clock, temp_dir) = create_test_cache();
        let key = format!("api:GET /reports/{}", "a".repeat(240));

        cache.write(&key, &sample("long", 240), 60_000);

        let stem = file_stem(&key);
        assert!(stem.len() + ".json".len() <= 255, "stem too long: {}", stem.len());
        assert!(stem.contains('~'));
        assert!(temp_dir.path().join(format!("{}.json", stem)).exists());
        assert_eq!(cache.read::<TestData>(&key), Some(sample("long", 240)));
    }

    #[test]
    fn test_long_keys_with_shared_prefix_stay_distinct() {
        let (cache, _clock, _temp_dir) = create_test_cache();
        let base = "b".repeat(300);
        let first = format!("{}1", base);
        let second = format!("{}2", base);

        assert_ne!(file_stem(&first), file_stem(&second));

        cache.write(&first, &sample("first", 1), 60_000);
        cache.write(&second, &sample("second", 2), 60_000);

        assert_eq!(cache.read::<TestData>(&first), Some(sample("first", 1)));
        assert_eq!(cache.read::<TestData>(&second), Some(sample("second", 2)));
    }

    #[test]
    fn test_entry_for_other_key_is_not_returned() {
        let (cache, _clock, temp_dir) = create_test_cache();
        cache.write("owner", &sample("owner", 1), 60_000);

        // Place owner's file under another key's name
        let from = temp_dir.path().join(format!("{}.json", file_stem("owner")));
        let to = temp_dir.path().join(format!("{}.json", file_stem("intruder")));
        fs::rename(from, to).expect("Should rename file");

        assert!(cache.read::<TestData>("intruder").is_none());
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(cache) = CacheManager::new() {
            let path_str = cache.cache_dir.to_string_lossy();
            assert!(
                path_str.contains("healthtrack"),
                "Cache path should contain project name"
            );
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }
}

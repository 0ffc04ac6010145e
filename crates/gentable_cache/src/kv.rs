//! Generic key/value cache with per-entry TTL (spec §4.H).

use gentable_error::{CacheError, CacheErrorKind, GentableResult};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// A string-keyed cache of JSON values, each with its own expiry.
///
/// Entries are lazily swept: a `get` past its TTL is treated as a miss and
/// removed on the spot, rather than run down by a background sweeper.
pub struct KvCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for KvCache {
    fn default() -> Self {
        Self::new()
    }
}

impl KvCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store `value` under `key`, replacing any existing entry, expiring
    /// after `ttl`.
    pub fn set<T: serde::Serialize>(&self, key: &str, value: &T, ttl: Duration) -> GentableResult<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| CacheError::new(CacheErrorKind::Malformed { key: key.to_string(), reason: e.to_string() }))?;
        let mut entries = self.entries.lock().expect("kv cache mutex poisoned");
        entries.insert(
            key.to_string(),
            Entry { value, expires_at: Instant::now() + ttl },
        );
        Ok(())
    }

    /// Fetch and deserialize the value stored at `key`, if present and
    /// unexpired.
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> GentableResult<Option<T>> {
        let mut entries = self.entries.lock().expect("kv cache mutex poisoned");
        let Some(entry) = entries.get(key) else { return Ok(None) };
        if entry.expires_at <= Instant::now() {
            entries.remove(key);
            return Ok(None);
        }
        let value = serde_json::from_value(entry.value.clone())
            .map_err(|e| CacheError::new(CacheErrorKind::Malformed { key: key.to_string(), reason: e.to_string() }))?;
        Ok(Some(value))
    }

    /// Remove the entry at `key`, if any. Idempotent.
    pub fn remove(&self, key: &str) {
        self.entries.lock().expect("kv cache mutex poisoned").remove(key);
    }

    /// Extend `key`'s expiry to `ttl` from now, leaving its value
    /// unchanged. A no-op if the key is absent.
    pub fn touch(&self, key: &str, ttl: Duration) {
        let mut entries = self.entries.lock().expect("kv cache mutex poisoned");
        if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Instant::now() + ttl;
        }
    }

    /// Drop every expired entry. Callers with a background sweep loop can
    /// invoke this periodically; it is never required for correctness.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.entries.lock().expect("kv cache mutex poisoned").retain(|_, e| e.expires_at > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_value() {
        let cache = KvCache::new();
        cache.set("k", &42u32, Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get::<u32>("k").unwrap(), Some(42));
    }

    #[test]
    fn expired_entry_reads_as_miss() {
        let cache = KvCache::new();
        cache.set("k", &42u32, Duration::from_millis(0)).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get::<u32>("k").unwrap(), None);
    }

    #[test]
    fn remove_is_idempotent() {
        let cache = KvCache::new();
        cache.remove("missing");
        cache.set("k", &1u32, Duration::from_secs(60)).unwrap();
        cache.remove("k");
        cache.remove("k");
        assert_eq!(cache.get::<u32>("k").unwrap(), None);
    }
}

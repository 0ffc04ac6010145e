//! Named locks with TTL auto-release (spec §4.H).
//!
//! Held locks gate exclusive per-key operations (e.g. reindexing a
//! knowledge table). A lock whose holder never releases it — a crashed
//! worker — is reclaimed once its TTL elapses, rather than wedging the key
//! forever.

use gentable_error::{CacheError, CacheErrorKind, GentableResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

struct Held {
    token: Uuid,
    expires_at: Instant,
}

/// Registry of named locks backed by an in-process table.
#[derive(Clone)]
pub struct LockManager {
    held: Arc<Mutex<HashMap<String, Held>>>,
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LockManager {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { held: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Attempt to take `name` without waiting. Raises `LockHeld` if another
    /// owner's lease on `name` has not yet expired.
    pub fn try_acquire(&self, name: &str, ttl: Duration) -> GentableResult<LockGuard> {
        let mut held = self.held.lock().expect("lock table mutex poisoned");
        let now = Instant::now();
        if let Some(existing) = held.get(name) {
            if existing.expires_at > now {
                return Err(CacheError::new(CacheErrorKind::LockHeld(name.to_string())).into());
            }
        }
        let token = Uuid::new_v4();
        held.insert(name.to_string(), Held { token, expires_at: now + ttl });
        Ok(LockGuard { manager: self.clone(), name: name.to_string(), token })
    }

    /// Take `name`, polling every `poll_interval` until it becomes free or
    /// `wait` elapses, whichever comes first.
    pub async fn acquire(&self, name: &str, ttl: Duration, wait: Duration, poll_interval: Duration) -> GentableResult<LockGuard> {
        let deadline = Instant::now() + wait;
        loop {
            match self.try_acquire(name, ttl) {
                Ok(guard) => return Ok(guard),
                Err(_) if Instant::now() < deadline => {
                    tokio::time::sleep(poll_interval).await;
                }
                Err(_) => return Err(CacheError::new(CacheErrorKind::LockTimeout(name.to_string())).into()),
            }
        }
    }

    /// Release `name` if `token` is still its current holder. A no-op if
    /// the lock has already expired, been taken over, or was already
    /// released — release is always idempotent.
    fn release(&self, name: &str, token: Uuid) {
        let mut held = self.held.lock().expect("lock table mutex poisoned");
        if let Some(existing) = held.get(name) {
            if existing.token == token {
                held.remove(name);
            }
        }
    }
}

/// An acquired lock, released on drop.
pub struct LockGuard {
    manager: LockManager,
    name: String,
    token: Uuid,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.manager.release(&self.name, self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_try_acquire_is_rejected_while_held() {
        let manager = LockManager::new();
        let guard = manager.try_acquire("reindex:t1", Duration::from_secs(60)).unwrap();
        assert!(manager.try_acquire("reindex:t1", Duration::from_secs(60)).is_err());
        drop(guard);
        assert!(manager.try_acquire("reindex:t1", Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn expired_lock_is_reclaimable() {
        let manager = LockManager::new();
        let guard = manager.try_acquire("reindex:t1", Duration::from_millis(0)).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        assert!(manager.try_acquire("reindex:t1", Duration::from_secs(60)).is_ok());
        // The original guard's drop must not evict the new holder's lease.
        drop(guard);
        assert!(manager.try_acquire("reindex:t1", Duration::from_secs(60)).is_err());
    }

    #[tokio::test]
    async fn acquire_times_out_when_never_released() {
        let manager = LockManager::new();
        let _guard = manager.try_acquire("reindex:t1", Duration::from_secs(60)).unwrap();
        let result = manager
            .acquire("reindex:t1", Duration::from_secs(60), Duration::from_millis(20), Duration::from_millis(5))
            .await;
        assert!(result.is_err());
    }
}

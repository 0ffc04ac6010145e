//! Append-only usage buffer with a background flush loop (spec §4.H, §4.G).
//!
//! The quota/billing manager accumulates usage events per request and
//! hands them to [`UsageBuffer::push`] on `process_all`. A periodic task
//! started with [`spawn_flusher`] drains the buffer into durable storage;
//! draining assigns each event a monotonic id so a flush run twice (e.g.
//! after a crash mid-flush) never double-counts what it already drained.

use gentable_core::UsageEvent;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A usage event tagged with the buffer-local id it was assigned at push
/// time.
#[derive(Debug, Clone)]
pub struct BufferedUsageEvent {
    /// Monotonic id, unique within this buffer's lifetime.
    pub id: u64,
    /// The underlying event.
    pub event: UsageEvent,
}

/// Durable-pending buffer of usage events awaiting a flush.
pub struct UsageBuffer {
    pending: Mutex<Vec<BufferedUsageEvent>>,
    next_id: AtomicU64,
    last_flushed_id: AtomicU64,
}

impl Default for UsageBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            last_flushed_id: AtomicU64::new(0),
        }
    }

    /// Append one event. Never blocks on I/O.
    pub fn push(&self, event: UsageEvent) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.pending.lock().expect("usage buffer mutex poisoned").push(BufferedUsageEvent { id, event });
    }

    /// Number of events currently pending a flush.
    pub fn len(&self) -> usize {
        self.pending.lock().expect("usage buffer mutex poisoned").len()
    }

    /// `true` if no events are pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every event not yet handed to a flush, skipping any whose id
    /// this buffer has already flushed (the dedup guard against a flusher
    /// running twice concurrently).
    pub fn drain(&self) -> Vec<BufferedUsageEvent> {
        let mut pending = self.pending.lock().expect("usage buffer mutex poisoned");
        let already_flushed = self.last_flushed_id.load(Ordering::SeqCst);
        let taken: Vec<BufferedUsageEvent> = std::mem::take(&mut *pending);
        let (fresh, _stale): (Vec<_>, Vec<_>) = taken.into_iter().partition(|e| e.id >= already_flushed);
        if let Some(max_id) = fresh.iter().map(|e| e.id).max() {
            self.last_flushed_id.store(max_id + 1, Ordering::SeqCst);
        }
        fresh
    }
}

/// Spawn a background task that drains `buffer` into `sink` every
/// `interval`. The returned handle can be aborted on shutdown.
pub fn spawn_flusher<F, Fut>(buffer: Arc<UsageBuffer>, interval: Duration, mut sink: F) -> tokio::task::JoinHandle<()>
where
    F: FnMut(Vec<BufferedUsageEvent>) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            if buffer.is_empty() {
                continue;
            }
            let batch = buffer.drain();
            sink(batch).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(ts: i64) -> UsageEvent {
        UsageEvent::llm("org_1".to_string(), "proj_1".to_string(), "model".to_string(), 10, 5, ts)
    }

    #[test]
    fn drain_empties_the_buffer() {
        let buffer = UsageBuffer::new();
        buffer.push(event(1));
        buffer.push(event(2));
        assert_eq!(buffer.len(), 2);
        let drained = buffer.drain();
        assert_eq!(drained.len(), 2);
        assert!(buffer.is_empty());
    }

    #[test]
    fn second_drain_never_repeats_already_flushed_events() {
        let buffer = UsageBuffer::new();
        buffer.push(event(1));
        let first = buffer.drain();
        assert_eq!(first.len(), 1);
        buffer.push(event(2));
        let second = buffer.drain();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].event.ts, 2);
    }

    #[tokio::test]
    async fn flusher_drains_on_interval() {
        let buffer = Arc::new(UsageBuffer::new());
        buffer.push(event(1));
        let seen: Arc<Mutex<Vec<BufferedUsageEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let handle = spawn_flusher(buffer.clone(), Duration::from_millis(5), move |batch| {
            let seen = sink_seen.clone();
            async move {
                seen.lock().expect("test mutex poisoned").extend(batch);
            }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.abort();
        assert!(!seen.lock().expect("test mutex poisoned").is_empty());
    }
}

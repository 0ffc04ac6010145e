//! Cache, lock, progress, and usage-buffer layer for the execution engine
//! (spec §4.H, §4.I).
//!
//! This crate is the engine's shared in-memory infrastructure: a TTL'd
//! key/value cache, named locks with TTL auto-release, a keyed progress
//! pub/sub channel, and the append-only usage buffer the quota manager
//! flushes into durable storage.

#![warn(missing_docs)]

mod kv;
mod lock;
mod progress;
mod usage;

pub use kv::KvCache;
pub use lock::{LockGuard, LockManager};
pub use progress::ProgressPublisher;
pub use usage::{BufferedUsageEvent, UsageBuffer, spawn_flusher};

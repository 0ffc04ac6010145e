//! Durable persistence for usage events and progress records.
//!
//! This crate is the optional backstop beneath [`gentable_cache`]: the
//! cache layer answers reads with low latency and a TTL, this crate
//! answers them after the TTL expires and gives billing/audit a
//! durable home. Nothing in `gentable_engine` depends on it directly —
//! a process wires a repository in as a sink for
//! `gentable_cache::spawn_flusher` and as the backing store behind a
//! progress lookup, entirely at the bootstrap layer.

#![warn(missing_docs)]

mod connection;
mod models;
mod progress_repository;
mod schema;
mod usage_repository;

pub use connection::{establish_pool, run_migrations, ConnectionPool, MIGRATIONS};
pub use models::{NewProgressRecordRow, NewUsageEventRow, ProgressRecordRow, UsageEventRow};
pub use progress_repository::{PostgresProgressRepository, ProgressRepository};
pub use usage_repository::{PostgresUsageEventRepository, UsageEventRepository};

/// Result type returned by every operation in this crate.
pub type DatabaseResult<T> = Result<T, gentable_error::DatabaseError>;

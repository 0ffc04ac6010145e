//! Durable backstop for progress records, persisted past the cache
//! layer's TTL (spec §4.H: `gentable_cache::ProgressPublisher` owns the
//! live, low-latency view; this repository is the long-lived copy a
//! client can still query after the in-memory entry expires).

use crate::models::{NewProgressRecordRow, ProgressRecordRow};
use crate::schema::progress_records;
use crate::{ConnectionPool, DatabaseResult};
use async_trait::async_trait;
use diesel::prelude::*;
use gentable_core::ProgressRecord;
use gentable_error::{DatabaseError, DatabaseErrorKind};

/// Persists progress records, upserting by key on every write.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Insert or update the record for `record.key`, stamped with `now_ms`.
    async fn upsert(&self, record: &ProgressRecord, now_ms: i64) -> DatabaseResult<()>;

    /// Fetch the durable record for `key`, if one has ever been written.
    async fn get(&self, key: &str) -> DatabaseResult<Option<ProgressRecord>>;
}

/// Postgres-backed [`ProgressRepository`].
pub struct PostgresProgressRepository {
    pool: ConnectionPool,
}

impl PostgresProgressRepository {
    /// Build a repository over a connection pool.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

fn millis_to_naive(ms: i64) -> DatabaseResult<chrono::NaiveDateTime> {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::Serialization(format!("timestamp out of range: {ms}"))))
}

#[async_trait]
impl ProgressRepository for PostgresProgressRepository {
    async fn upsert(&self, record: &ProgressRecord, now_ms: i64) -> DatabaseResult<()> {
        let updated_at = millis_to_naive(now_ms)?;
        let row = NewProgressRecordRow::from_record(record, updated_at);
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|err| DatabaseError::new(DatabaseErrorKind::Connection(err.to_string())))?;
            diesel::insert_into(progress_records::table)
                .values(&row)
                .on_conflict(progress_records::key)
                .do_update()
                .set(&row)
                .execute(&mut conn)?;
            Ok::<(), DatabaseError>(())
        })
        .await
        .map_err(|err| DatabaseError::new(DatabaseErrorKind::Query(format!("blocking task panicked: {err}"))))??;

        Ok(())
    }

    async fn get(&self, key: &str) -> DatabaseResult<Option<ProgressRecord>> {
        let pool = self.pool.clone();
        let key = key.to_string();

        let row: Option<ProgressRecordRow> = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|err| DatabaseError::new(DatabaseErrorKind::Connection(err.to_string())))?;
            progress_records::table
                .find(key)
                .select(ProgressRecordRow::as_select())
                .first(&mut conn)
                .optional()
                .map_err(DatabaseError::from)
        })
        .await
        .map_err(|err| DatabaseError::new(DatabaseErrorKind::Query(format!("blocking task panicked: {err}"))))??;

        row.map(ProgressRecord::try_from)
            .transpose()
            .map_err(|err| DatabaseError::new(DatabaseErrorKind::Serialization(err)))
    }
}

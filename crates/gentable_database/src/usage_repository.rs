//! Durable sink for flushed usage events (spec §4.G/§4.H: the quota
//! manager's per-request accumulator hands events to
//! `gentable_cache::UsageBuffer`; this repository is where a periodic
//! flusher persists them once drained).

use crate::models::NewUsageEventRow;
use crate::schema::usage_events;
use crate::{ConnectionPool, DatabaseResult};
use async_trait::async_trait;
use diesel::prelude::*;
use gentable_cache::BufferedUsageEvent;
use gentable_error::{DatabaseError, DatabaseErrorKind};

/// Persists flushed usage events for billing reconciliation and audit.
#[async_trait]
pub trait UsageEventRepository: Send + Sync {
    /// Persist a batch of already-drained usage events in one transaction.
    async fn record_batch(&self, events: &[BufferedUsageEvent]) -> DatabaseResult<()>;
}

/// Postgres-backed [`UsageEventRepository`].
pub struct PostgresUsageEventRepository {
    pool: ConnectionPool,
}

impl PostgresUsageEventRepository {
    /// Build a repository over a connection pool.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsageEventRepository for PostgresUsageEventRepository {
    async fn record_batch(&self, events: &[BufferedUsageEvent]) -> DatabaseResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        let rows: Vec<NewUsageEventRow> = events.iter().map(|b| NewUsageEventRow::from(&b.event)).collect();
        let pool = self.pool.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|err| DatabaseError::new(DatabaseErrorKind::Connection(err.to_string())))?;
            diesel::insert_into(usage_events::table).values(&rows).execute(&mut conn)?;
            Ok::<(), DatabaseError>(())
        })
        .await
        .map_err(|err| DatabaseError::new(DatabaseErrorKind::Query(format!("blocking task panicked: {err}"))))??;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUsageEventRow;
    use gentable_core::UsageEvent;

    #[test]
    fn new_row_round_trips_llm_event_fields() {
        let event = UsageEvent::llm("org_1".to_string(), "proj_1".to_string(), "gemini".to_string(), 10, 5, 100);
        let row = NewUsageEventRow::from(&event);
        assert_eq!(row.kind, "llm");
        assert_eq!(row.prompt_tokens, Some(10));
        assert_eq!(row.completion_tokens, Some(5));
    }
}

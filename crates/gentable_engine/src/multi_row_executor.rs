//! Multi-row executor (spec §4.F): orchestrates a batch of rows concurrently,
//! multiplexes their chunk streams into one ordered SSE channel per request,
//! and commits closed rows to storage in a single batched write.

use crate::dispatch::{CellChunk, DispatchContext};
use crate::graph::ColumnGraph;
use crate::planner::BatchPlan;
use crate::row_executor::{RowChunk, RowExecutor};
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use gentable_core::{
    CellCompletionChunk, GenTableReferencesEvent, Row, RowCompletionResponse, Schema, SseEvent,
    UsageEvent,
};
use gentable_error::GentableResult;
use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, watch};
use tracing::instrument;

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// The minimum chunk-channel capacity the multi-row executor opens between
/// row executors and its own multiplexing loop (spec §5: "the channel
/// carrying chunks from a dispatcher to its row's output channel has
/// capacity at least 64").
const MIN_CHUNK_CHANNEL_CAPACITY: usize = 64;

/// How a multi-row executor's closed rows should be persisted (spec §4.F
/// step 5: `AddRows` inserts new rows, `RegenRows` updates existing ones).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Rows are new; persisted with `StorageEngine::insert_rows`.
    Insert,
    /// Rows already exist; persisted with `StorageEngine::update_rows`.
    Update,
}

/// The result of running a row-write request to completion, or to client
/// disconnection.
pub struct ExecutionOutcome {
    /// Every row this request touched, in input order, whichever state it
    /// ended in — closed and successful, closed with a failed cell, or (for
    /// a row still in flight at cancellation) left as an open draft.
    pub rows: Vec<Row>,
    /// Usage events recorded across every row this request dispatched.
    pub usage: Vec<UsageEvent>,
    /// `true` if the request ran every row to completion; `false` if the
    /// client disconnected before the last batch finished (spec §5
    /// "Cancellation": no terminal `[DONE]`, in-flight rows are discarded).
    pub completed: bool,
}

/// Orchestrates one row-write request: runs its rows in batches of at most
/// `plan.row_batch` concurrently, forwards every chunk as an `SseEvent`, and
/// commits finished rows to storage (spec §4.F).
pub struct MultiRowExecutor<'a> {
    table_id: &'a str,
    schema: &'a Schema,
    graph: &'a ColumnGraph,
    ctx: &'a DispatchContext,
    plan: BatchPlan,
}

impl<'a> MultiRowExecutor<'a> {
    /// Construct a multi-row executor for one request, bound to the target
    /// table's schema, its precomputed column graph, the shared dispatch
    /// backends, and the planner's `(column_batch, row_batch)` decision.
    pub fn new(
        table_id: &'a str,
        schema: &'a Schema,
        graph: &'a ColumnGraph,
        ctx: &'a DispatchContext,
        plan: BatchPlan,
    ) -> Self {
        Self { table_id, schema, graph, ctx, plan }
    }

    /// Run every row in `rows` to completion (or to cancellation), emitting
    /// `SseEvent`s on `events` in arrival order (spec §4.F steps 1-4).
    ///
    /// `rows` pairs each row draft with the output columns it still needs
    /// materialized (spec §4.B rule 3, computed by the caller once per row
    /// for `AddRows`, once for the whole request for `RegenRows`). `history`
    /// is the Chat table's prior rows; empty outside Chat tables (only one
    /// row runs per request when multi-turn, so there is at most one row's
    /// worth of history to thread through). `cancelled` is watched between
    /// batches and forwarded into every row executor; once it flips, the
    /// current batch is allowed to drain but no further batch starts.
    #[instrument(skip_all, fields(table_id = %self.table_id, rows = rows.len()))]
    pub async fn run(
        &self,
        rows: Vec<(Row, HashSet<String>)>,
        history: &[Row],
        events: mpsc::Sender<SseEvent>,
        cancelled: watch::Receiver<bool>,
    ) -> ExecutionOutcome {
        let row_batch = self.plan.row_batch.max(1);
        let mut finished_rows = Vec::with_capacity(rows.len());
        let mut total_usage = Vec::new();
        let mut aborted = false;

        for batch in rows.chunks(row_batch) {
            if *cancelled.borrow() {
                aborted = true;
                break;
            }

            let (chunk_tx, chunk_rx) = mpsc::channel::<RowChunk>(MIN_CHUNK_CHANNEL_CAPACITY);

            let run_rows = async {
                let mut running = FuturesUnordered::new();
                for (row, to_generate) in batch {
                    let executor = RowExecutor::new(self.schema, self.graph, self.ctx, self.plan.column_batch);
                    let row = row.clone();
                    let tx = chunk_tx.clone();
                    let cancel_rx = cancelled.clone();
                    running.push(async move { executor.run(row, to_generate, history, tx, cancel_rx).await });
                }
                // Drop the executor's own handle; the channel closes once
                // every per-row clone above is dropped, i.e. once every row
                // in this batch has returned.
                drop(chunk_tx);

                let mut outcomes = Vec::with_capacity(running.len());
                while let Some(outcome) = running.next().await {
                    outcomes.push(outcome);
                }
                outcomes
            };

            let drain_chunks = async {
                let mut rx = chunk_rx;
                while let Some(row_chunk) = rx.recv().await {
                    self.emit_chunk(row_chunk, &events).await;
                }
            };

            let (outcomes, _) = tokio::join!(run_rows, drain_chunks);

            for outcome in outcomes {
                if outcome.completed {
                    let _ = events.send(SseEvent::RowCompletion(RowCompletionResponse::from_row(&outcome.row))).await;
                } else {
                    aborted = true;
                }
                total_usage.extend(outcome.usage);
                finished_rows.push(outcome.row);
            }

            if aborted {
                break;
            }
        }

        ExecutionOutcome {
            rows: finished_rows,
            usage: total_usage,
            completed: !aborted,
        }
    }

    async fn emit_chunk(&self, row_chunk: RowChunk, events: &mpsc::Sender<SseEvent>) {
        let RowChunk { row_id, column_id, chunk } = row_chunk;
        let event = match chunk {
            CellChunk::References(refs) => SseEvent::References(GenTableReferencesEvent {
                object: "gen_table.references",
                output_column_name: column_id,
                row_id,
                chunks: refs.chunks,
            }),
            CellChunk::TextDelta(delta) => {
                SseEvent::CompletionChunk(CellCompletionChunk::text_delta(column_id, row_id, delta))
            }
            CellChunk::Terminal { finish_reason, usage, .. } => {
                SseEvent::CompletionChunk(CellCompletionChunk::terminal(column_id, row_id, finish_reason, usage))
            }
        };
        let _ = events.send(event).await;
    }

    /// Persist the rows an [`ExecutionOutcome`] produced, stamping each
    /// closed row's `UpdatedAt` to the commit time and writing every row in
    /// one batched call (spec §4.F step 5). A row left open by cancellation
    /// is skipped — it was never forwarded to the caller as completed, so
    /// it's discarded rather than committed (spec §5 "Cancellation"). A row
    /// that failed a cell is still committed with its error state: it
    /// reached `close()` in the executor, just carrying a `CellState::error`
    /// on the failed column, so it's indistinguishable here from a clean row.
    pub async fn commit(&self, rows: &mut [Row], mode: CommitMode) -> GentableResult<()> {
        let commit_ts = now_ms();
        let mut payload = Vec::new();
        let mut updates = HashMap::new();

        for row in rows.iter_mut() {
            if row.status() != gentable_core::RowStatus::Closed {
                continue;
            }
            row.close(commit_ts);
            match mode {
                CommitMode::Insert => payload.push(row.values().clone()),
                CommitMode::Update => {
                    updates.insert(row.id().to_string(), row.values().clone());
                }
            }
        }

        match mode {
            CommitMode::Insert => {
                if !payload.is_empty() {
                    self.ctx.storage.insert_rows(self.table_id, payload).await?;
                }
            }
            CommitMode::Update => {
                if !updates.is_empty() {
                    self.ctx.storage.update_rows(self.table_id, updates).await?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gentable_core::{Column, DType, EmbedConfig, GenConfig, ReferenceChunk, TableKind, Value};
    use gentable_interface::{
        CodeSandbox, Embedder, OrderBy, QuotaManager, RowFilter, RowPage, SandboxOutput, StorageEngine,
    };
    use std::sync::{Arc, Mutex};

    struct NullQuota;

    #[async_trait]
    impl QuotaManager for NullQuota {
        async fn check_llm_quota(&self, _model: &str, _estimated_prompt_tokens: u64) -> GentableResult<()> {
            Ok(())
        }
        async fn check_embed_quota(&self, _model: &str, _estimated_tokens: u64) -> GentableResult<()> {
            Ok(())
        }
        async fn check_rerank_quota(&self, _model: &str) -> GentableResult<()> {
            Ok(())
        }
        async fn check_egress_quota(&self, _gib: f64) -> GentableResult<()> {
            Ok(())
        }
        async fn check_db_quota(&self, _gib: f64) -> GentableResult<()> {
            Ok(())
        }
        async fn check_file_quota(&self, _gib: f64) -> GentableResult<()> {
            Ok(())
        }
        fn record_event(&self, _event: UsageEvent) {}
        async fn process_all(&self) -> GentableResult<()> {
            Ok(())
        }
    }

    struct NullSandbox;

    #[async_trait]
    impl CodeSandbox for NullSandbox {
        async fn run(&self, _code: &str, _row: &HashMap<String, Value>) -> GentableResult<SandboxOutput> {
            unimplemented!("not exercised by commit()")
        }
        fn time_budget(&self) -> std::time::Duration {
            std::time::Duration::from_secs(5)
        }
        fn memory_budget_mib(&self) -> u64 {
            256
        }
    }

    #[derive(Default)]
    struct RecordingStorage {
        inserted: Mutex<Vec<Vec<HashMap<String, Value>>>>,
        updated: Mutex<Vec<HashMap<String, HashMap<String, Value>>>>,
    }

    #[async_trait]
    impl StorageEngine for RecordingStorage {
        async fn list_rows(
            &self,
            _table_id: &str,
            _filters: &[RowFilter],
            _order: &[OrderBy],
            _limit: usize,
            _offset: usize,
        ) -> GentableResult<RowPage> {
            unimplemented!("not exercised by commit()")
        }
        async fn get_row(&self, _table_id: &str, _row_id: &str) -> GentableResult<Row> {
            unimplemented!("not exercised by commit()")
        }
        async fn insert_rows(
            &self,
            _table_id: &str,
            rows: Vec<HashMap<String, Value>>,
        ) -> GentableResult<Vec<String>> {
            let ids = rows.len();
            self.inserted.lock().unwrap().push(rows);
            Ok((0..ids).map(|i| format!("row_{i}")).collect())
        }
        async fn update_rows(
            &self,
            _table_id: &str,
            updates: HashMap<String, HashMap<String, Value>>,
        ) -> GentableResult<()> {
            self.updated.lock().unwrap().push(updates);
            Ok(())
        }
        async fn delete_rows(
            &self,
            _table_id: &str,
            _row_ids: &[String],
            _filters: &[RowFilter],
        ) -> GentableResult<u64> {
            unimplemented!("not exercised by commit()")
        }
        async fn hybrid_search(
            &self,
            _table_id: &str,
            _query_embedding: &[f32],
            _k: usize,
        ) -> GentableResult<Vec<ReferenceChunk>> {
            unimplemented!("not exercised by commit()")
        }
        async fn create_index(&self, _table_id: &str, _column: &str) -> GentableResult<()> {
            unimplemented!("not exercised by commit()")
        }
    }

    fn schema() -> Schema {
        let columns = vec![
            Column::input("a".to_string(), DType::Str, 1),
            Column::output(
                "b".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("m".to_string(), "a".to_string())),
                2,
            ),
        ];
        Schema::new(TableKind::Action, columns).unwrap()
    }

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, inputs: &[String]) -> GentableResult<Vec<Vec<f32>>> {
            Ok(inputs.iter().map(|_| vec![0.0, 1.0]).collect())
        }
        fn dimensions(&self) -> u32 {
            2
        }
        fn model_name(&self) -> &str {
            "m"
        }
    }

    fn ctx(storage: Arc<RecordingStorage>) -> DispatchContext {
        let mut embedders: HashMap<String, Arc<dyn Embedder>> = HashMap::new();
        embedders.insert("m".to_string(), Arc::new(StubEmbedder));
        DispatchContext {
            org_id: "org_1".to_string(),
            project_id: "proj_1".to_string(),
            quota: Arc::new(NullQuota),
            lm_engines: HashMap::new(),
            embedders,
            rerankers: HashMap::new(),
            storage,
            sandbox: Arc::new(NullSandbox),
            knowledge_embedding_models: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn commit_writes_only_closed_rows_and_skips_draft_rows() {
        let schema = schema();
        let graph = ColumnGraph::build(&schema).unwrap();
        let storage = Arc::new(RecordingStorage::default());
        let dispatch_ctx = ctx(storage.clone());
        let plan = BatchPlan { column_batch: 1, row_batch: 1 };
        let executor = MultiRowExecutor::new("tbl_1", &schema, &graph, &dispatch_ctx, plan);

        let mut closed = Row::draft("row_1".to_string());
        closed.set("a".to_string(), Value::Str("hi".to_string()));
        closed.close(0);

        let in_flight = Row::draft("row_2".to_string());

        let mut rows = vec![closed, in_flight];
        executor.commit(&mut rows, CommitMode::Insert).await.unwrap();

        let inserted = storage.inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].len(), 1);
        assert!(rows[0].updated_at().is_some());
        assert!(rows[1].updated_at().is_none());
    }

    #[tokio::test]
    async fn commit_update_mode_keys_by_row_id() {
        let schema = schema();
        let graph = ColumnGraph::build(&schema).unwrap();
        let storage = Arc::new(RecordingStorage::default());
        let dispatch_ctx = ctx(storage.clone());
        let plan = BatchPlan { column_batch: 1, row_batch: 1 };
        let executor = MultiRowExecutor::new("tbl_1", &schema, &graph, &dispatch_ctx, plan);

        let mut closed = Row::draft("row_9".to_string());
        closed.set("a".to_string(), Value::Str("hi".to_string()));
        closed.close(0);
        let mut rows = vec![closed];

        executor.commit(&mut rows, CommitMode::Update).await.unwrap();

        let updated = storage.updated.lock().unwrap();
        assert_eq!(updated.len(), 1);
        assert!(updated[0].contains_key("row_9"));
    }
}

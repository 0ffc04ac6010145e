//! Cross-component scenarios S1-S6 (spec §8), exercised against the
//! public `RowExecutor`/`MultiRowExecutor` entry points with stub
//! generator backends, in a top-level `tests/` suite for scenarios
//! spanning more than one module.

mod test_support;

use gentable_engine::{BatchPlan, ColumnGraph, DispatchContext, MultiRowExecutor, RowExecutor};
use gentable_core::{Column, DType, GenConfig, LlmConfig, Role, Row, Schema, TableKind, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use test_support::{NullQuota, NullSandbox, NullStorage, RecordingLlm};
use tokio::sync::{mpsc, watch};

fn ctx_with_llm(engine: Arc<RecordingLlm>) -> DispatchContext {
    let mut lm_engines: HashMap<String, Arc<dyn gentable_interface::Streaming>> = HashMap::new();
    lm_engines.insert("stub-model".to_string(), engine);
    DispatchContext {
        org_id: "org_1".to_string(),
        project_id: "proj_1".to_string(),
        quota: Arc::new(NullQuota),
        lm_engines,
        embedders: HashMap::new(),
        rerankers: HashMap::new(),
        storage: Arc::new(NullStorage),
        sandbox: Arc::new(NullSandbox),
        knowledge_embedding_models: HashMap::new(),
    }
}

/// An LLM output column that references `upstream` in its user prompt
/// (creating the real dependency edge the analyzer levels on) and
/// carries its own id as a static system-prompt marker (read back by
/// `RecordingLlm` to identify which column was dispatched).
fn llm_column(id: &str, upstream: &str, order: u32, multi_turn: bool) -> Column {
    let config = LlmConfig::new(
        "stub-model".to_string(),
        id.to_string(),
        format!("${{{upstream}}}"),
        None,
        None,
        None,
        None,
        None,
        multi_turn,
    );
    Column::output(id.to_string(), DType::Str, GenConfig::Llm(config), order)
}

fn linear_chain_schema() -> Schema {
    // A -> B -> C.
    let columns = vec![Column::input("a".to_string(), DType::Str, 1), llm_column("b", "a", 2, false), llm_column("c", "b", 3, false)];
    Schema::new(TableKind::Action, columns).unwrap()
}

/// S1: a linear chain executes its columns one at a time, in dependency
/// order, never two at once.
#[tokio::test]
async fn s1_linear_chain_executes_columns_in_order() {
    let schema = linear_chain_schema();
    let graph = ColumnGraph::build(&schema).unwrap();
    assert_eq!(graph.max_level_width(), 1);

    let engine = Arc::new(RecordingLlm::new(None));
    let ctx = ctx_with_llm(engine.clone());
    let executor = RowExecutor::new(&schema, &graph, &ctx, 1);

    let mut row = Row::draft("row_1".to_string());
    row.set("a".to_string(), Value::Str("seed".to_string()));
    let to_generate: HashSet<String> = ["b".to_string(), "c".to_string()].into_iter().collect();
    let (tx, mut rx) = mpsc::channel(32);
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let _outcome = executor.run(row, &to_generate, &[], tx, cancel_rx).await;
    while rx.recv().await.is_some() {}

    assert_eq!(engine.dispatched(), vec!["b".to_string(), "c".to_string()]);
}

fn fanout_llm_schema() -> Schema {
    // A -> {B, C, D}: all three reference the same input column, so the
    // analyzer places them at the same level.
    let columns = vec![
        Column::input("a".to_string(), DType::Str, 1),
        llm_column("b", "a", 2, false),
        llm_column("c", "a", 3, false),
        llm_column("d", "a", 4, false),
    ];
    Schema::new(TableKind::Action, columns).unwrap()
}

/// S2: a fan-out level dispatches every column in that level before the
/// executor moves on; order within the level is not asserted since
/// `FuturesUnordered` completion order is non-deterministic by design.
#[tokio::test]
async fn s2_fanout_dispatches_whole_level_concurrently() {
    let schema = fanout_llm_schema();
    let graph = ColumnGraph::build(&schema).unwrap();
    assert_eq!(graph.max_level_width(), 3);

    let engine = Arc::new(RecordingLlm::new(None));
    let ctx = ctx_with_llm(engine.clone());
    let executor = RowExecutor::new(&schema, &graph, &ctx, 3);

    let mut row = Row::draft("row_1".to_string());
    row.set("a".to_string(), Value::Str("seed".to_string()));
    let to_generate: HashSet<String> = ["b".to_string(), "c".to_string(), "d".to_string()].into_iter().collect();
    let (tx, mut rx) = mpsc::channel(32);
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let outcome = executor.run(row, &to_generate, &[], tx, cancel_rx).await;
    assert!(outcome.completed);
    while rx.recv().await.is_some() {}

    let mut order = engine.dispatched();
    order.sort();
    assert_eq!(order, vec!["b".to_string(), "c".to_string(), "d".to_string()]);
}

/// S3: regenerating from column `b` onward leaves `a` untouched and only
/// dispatches `b` and `c`.
#[tokio::test]
async fn s3_regen_from_column_leaves_upstream_untouched() {
    let schema = linear_chain_schema();
    let graph = ColumnGraph::build(&schema).unwrap();

    let engine = Arc::new(RecordingLlm::new(None));
    let ctx = ctx_with_llm(engine.clone());
    let executor = RowExecutor::new(&schema, &graph, &ctx, 1);

    let mut row = Row::draft("row_1".to_string());
    row.set("a".to_string(), Value::Str("original".to_string()));
    let to_generate: HashSet<String> = ["b".to_string(), "c".to_string()].into_iter().collect();
    let (tx, mut rx) = mpsc::channel(32);
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let outcome = executor.run(row, &to_generate, &[], tx, cancel_rx).await;
    while rx.recv().await.is_some() {}

    assert_eq!(outcome.row.get("a"), Some(&Value::Str("original".to_string())));
    assert_eq!(engine.dispatched(), vec!["b".to_string(), "c".to_string()]);
}

/// S4: a cell failure on `b` marks `c` (which depends on `b`) as
/// skipped-due-to-dependency without ever calling the model for `c`.
#[tokio::test]
async fn s4_cell_failure_cascades_to_dependents_without_dispatch() {
    let schema = linear_chain_schema();
    let graph = ColumnGraph::build(&schema).unwrap();

    let engine = Arc::new(RecordingLlm::new(Some("b")));
    let ctx = ctx_with_llm(engine.clone());
    let executor = RowExecutor::new(&schema, &graph, &ctx, 1);

    let mut row = Row::draft("row_1".to_string());
    row.set("a".to_string(), Value::Str("seed".to_string()));
    let to_generate: HashSet<String> = ["b".to_string(), "c".to_string()].into_iter().collect();
    let (tx, mut rx) = mpsc::channel(32);
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let outcome = executor.run(row, &to_generate, &[], tx, cancel_rx).await;
    while rx.recv().await.is_some() {}

    // Only "b" was ever dispatched to the model; "c" was never reached.
    assert_eq!(engine.dispatched(), vec!["b".to_string()]);

    let b_state = outcome.row.state("b").expect("b has a recorded state");
    assert!(b_state.error.is_some());
    let c_state = outcome.row.state("c").expect("c has a recorded state");
    assert_eq!(c_state.error.as_deref(), Some("upstream column b failed"));
}

fn embed_schema() -> Schema {
    use gentable_core::EmbedConfig;
    let columns = vec![
        Column::input("a".to_string(), DType::Str, 1),
        Column::output("b".to_string(), DType::Str, GenConfig::Embed(EmbedConfig::new("m".to_string(), "a".to_string())), 2),
    ];
    Schema::new(TableKind::Action, columns).unwrap()
}

/// S5 boundary: cancellation observed at a batch boundary stops the
/// multi-row executor before that batch's rows ever run, marking the
/// outcome incomplete so the caller never emits a terminal `[DONE]`
/// (spec §5 "Cancellation").
#[tokio::test]
async fn s5_cancellation_before_batch_start_yields_incomplete_outcome() {
    let schema = embed_schema();
    let graph = ColumnGraph::build(&schema).unwrap();
    let ctx = DispatchContext {
        org_id: "org_1".to_string(),
        project_id: "proj_1".to_string(),
        quota: Arc::new(NullQuota),
        lm_engines: HashMap::new(),
        embedders: {
            let mut m: HashMap<String, Arc<dyn gentable_interface::Embedder>> = HashMap::new();
            m.insert("m".to_string(), Arc::new(test_support::StubEmbedder));
            m
        },
        rerankers: HashMap::new(),
        storage: Arc::new(NullStorage),
        sandbox: Arc::new(NullSandbox),
        knowledge_embedding_models: HashMap::new(),
    };
    let plan = BatchPlan { column_batch: 1, row_batch: 1 };
    let executor = MultiRowExecutor::new("tbl_1", &schema, &graph, &ctx, plan);

    let mut row_1 = Row::draft("row_1".to_string());
    row_1.set("a".to_string(), Value::Str("hi".to_string()));
    let to_generate: HashSet<String> = ["b".to_string()].into_iter().collect();
    let rows = vec![(row_1, to_generate)];

    let (events_tx, mut events_rx) = mpsc::channel(32);
    let (cancel_tx, cancel_rx) = watch::channel(false);
    cancel_tx.send(true).unwrap();

    let outcome = executor.run(rows, &[], events_tx, cancel_rx).await;
    assert!(!outcome.completed);
    assert!(outcome.rows.is_empty());
    assert!(events_rx.recv().await.is_none());
}

/// S6: a `multi_turn` LLM column's rendered request carries the prior
/// row's prompt/answer pair as `User`/`Assistant` history, not just the
/// current row's own prompt.
#[tokio::test]
async fn s6_multi_turn_column_threads_prior_row_as_chat_history() {
    let columns = vec![Column::input("topic".to_string(), DType::Str, 1), llm_column("reply", "topic", 2, true)];
    let schema = Schema::new(TableKind::Chat { multi_turn_column: "reply".to_string() }, columns).unwrap();
    let graph = ColumnGraph::build(&schema).unwrap();

    let engine = Arc::new(RecordingLlm::new(None));
    let ctx = ctx_with_llm(engine.clone());
    let executor = RowExecutor::new(&schema, &graph, &ctx, 1);

    let mut prior = Row::draft("row_0".to_string());
    prior.set("topic".to_string(), Value::Str("rust".to_string()));
    prior.set("reply".to_string(), Value::Str("Rust is great.".to_string()));

    let mut row = Row::draft("row_1".to_string());
    row.set("topic".to_string(), Value::Str("rust again".to_string()));
    let to_generate: HashSet<String> = ["reply".to_string()].into_iter().collect();
    let (tx, mut rx) = mpsc::channel(32);
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let _outcome = executor.run(row, &to_generate, std::slice::from_ref(&prior), tx, cancel_rx).await;
    while rx.recv().await.is_some() {}

    let transcript = engine.last_transcript();
    assert!(transcript.iter().any(|m| m.role == Role::User));
    assert!(transcript.iter().any(|m| m.role == Role::Assistant));
}

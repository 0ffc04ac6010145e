//! Row executor (spec §4.E): orchestrates one row end to end.
//!
//! Walks the column-graph levels in order; at each level, dispatches the
//! subset of columns that still need generation in groups of at most
//! `column_batch`, concurrently. Because same-level columns never reference
//! each other (the analyzer assigns levels by longest dependency path), each
//! group can read a shared snapshot of the row and apply its writes only
//! after the whole group finishes — no column ever observes a sibling's
//! write mid-group.

use crate::dispatch::{self, CellChunk, DispatchContext};
use crate::graph::ColumnGraph;
use crate::rag::RagContext;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use gentable_core::{CellState, GenConfig, Input, Message, Role, Row, Schema, UsageEvent, Value};
use gentable_error::GentableResult;
use std::collections::HashSet;
use tokio::sync::{mpsc, watch};
use tracing::instrument;

/// One chunk forwarded by the row executor to its caller, tagged with the
/// column that produced it (spec §4.E: "forward every chunk to the row's
/// output channel, tagged with the column id").
#[derive(Debug, Clone)]
pub struct RowChunk {
    /// The row this chunk belongs to.
    pub row_id: String,
    /// The column this chunk belongs to.
    pub column_id: String,
    /// The chunk payload.
    pub chunk: CellChunk,
}

/// The outcome of running one row to completion (or to cancellation).
pub struct RowOutcome {
    /// The row, closed unless cancellation interrupted it mid-flight.
    pub row: Row,
    /// Usage events recorded while dispatching this row's cells.
    pub usage: Vec<UsageEvent>,
    /// `true` if the row ran to completion; `false` if cancelled first.
    pub completed: bool,
}

struct CellResult {
    column_id: String,
    value: Option<Value>,
    state: CellState,
    usage: Vec<UsageEvent>,
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Build the prior-turn message history for a `multi_turn` LLM column from
/// earlier rows of a Chat table (spec §4.E S6), rendering the same user
/// prompt template against each historical row and pairing it with that
/// row's own materialized value for this column.
fn render_chat_history(config: &gentable_core::LlmConfig, column_id: &str, history: &[Row]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() * 2);
    for prior in history {
        let rendered = config
            .user_prompt_template()
            .render(|col| prior.get(col).map(Value::render_for_template).unwrap_or_default());
        if !rendered.is_empty() {
            messages.push(Message { role: Role::User, content: vec![Input::Text(rendered)] });
        }
        if let Some(Value::Str(text)) = prior.get(column_id) {
            if !text.is_empty() {
                messages.push(Message { role: Role::Assistant, content: vec![Input::Text(text.clone())] });
            }
        }
    }
    messages
}

/// Resolve a RAG sub-step context for an LLM column, if it has retrieval
/// configured (spec §4.D). Returns `None` silently if the column's
/// knowledge table's embedding model or the reranker backend isn't
/// registered on the dispatch context — callers that wire up a column with
/// `rag_params` are expected to also register those backends; the RAG
/// sub-step itself raises on a missing *query* embedder, not a missing
/// registration, so a misconfigured deployment fails fast here instead of
/// silently skipping retrieval.
fn resolve_rag<'a>(
    ctx: &'a DispatchContext,
    config: &'a gentable_core::LlmConfig,
    org_id: &'a str,
    project_id: &'a str,
    fallback_query: &'a str,
) -> GentableResult<Option<RagContext<'a>>> {
    let Some(params) = config.rag_params() else {
        return Ok(None);
    };
    let embedding_model = ctx
        .knowledge_embedding_models
        .get(params.table_id())
        .ok_or_else(|| {
            gentable_error::EngineError::internal(format!(
                "no embedding model registered for knowledge table {}",
                params.table_id()
            ))
        })?;
    let embedder = ctx.embedders.get(embedding_model).cloned().ok_or_else(|| {
        gentable_error::EngineError::internal(format!("no Embedder registered for model {embedding_model}"))
    })?;
    let reranker = ctx
        .rerankers
        .get(params.reranking_model())
        .cloned()
        .ok_or_else(|| {
            gentable_error::EngineError::internal(format!(
                "no Reranker registered for model {}",
                params.reranking_model()
            ))
        })?;
    Ok(Some(RagContext {
        params,
        embedding_model,
        embedder,
        reranker,
        storage: ctx.storage.clone(),
        quota: ctx.quota.clone(),
        org_id,
        project_id,
        fallback_query,
    }))
}

/// Orchestrates one row: walks the column-graph levels in order, dispatching
/// up to `column_batch` generators concurrently per level (spec §4.E).
pub struct RowExecutor<'a> {
    schema: &'a Schema,
    graph: &'a ColumnGraph,
    ctx: &'a DispatchContext,
    column_batch: usize,
}

impl<'a> RowExecutor<'a> {
    /// Construct a row executor bound to a schema, its precomputed column
    /// graph, and the shared dispatch backends.
    pub fn new(schema: &'a Schema, graph: &'a ColumnGraph, ctx: &'a DispatchContext, column_batch: usize) -> Self {
        Self {
            schema,
            graph,
            ctx,
            column_batch: column_batch.max(1),
        }
    }

    /// Run one row draft to completion, forwarding every chunk to `sender`
    /// tagged with its column id.
    ///
    /// `to_generate` names the output columns this row still needs
    /// materialized (spec §4.B rule 3); every other output column is assumed
    /// already supplied and is left untouched. `history` is the Chat
    /// table's prior rows, used only for whichever column is `multi_turn`
    /// (empty for non-chat tables). `cancelled` is polled at every level and
    /// group boundary; once it flips, no further cells are dispatched and
    /// the row is returned unclosed (spec §5 "Cancellation").
    #[instrument(skip_all, fields(row_id = %row.id()))]
    pub async fn run(
        &self,
        mut row: Row,
        to_generate: &HashSet<String>,
        history: &[Row],
        sender: mpsc::Sender<RowChunk>,
        cancelled: watch::Receiver<bool>,
    ) -> RowOutcome {
        let row_id = row.id().to_string();
        let mut usage = Vec::new();
        let mut failed: HashSet<String> = HashSet::new();
        let mut skipped: HashSet<String> = HashSet::new();
        let mut cancelled_mid_flight = false;

        'levels: for level in self.graph.levels() {
            let due: Vec<&String> = level.iter().filter(|id| to_generate.contains(*id)).collect();
            if due.is_empty() {
                continue;
            }

            for group in due.chunks(self.column_batch) {
                if *cancelled.borrow() {
                    cancelled_mid_flight = true;
                    break 'levels;
                }

                let mut pending = FuturesUnordered::new();
                for column_id in group {
                    let column_id = (*column_id).clone();
                    let Some(column) = self.schema.column(&column_id) else {
                        continue;
                    };
                    let failed_dep = column
                        .referenced_columns()
                        .into_iter()
                        .find(|r| failed.contains(r) || skipped.contains(r));
                    if let Some(failed_dep) = failed_dep {
                        row.set_state(column_id.clone(), CellState::skipped_due_to_dependency(&failed_dep));
                        skipped.insert(column_id);
                        continue;
                    }

                    let Some(gen_config) = column.gen_config().clone() else {
                        continue;
                    };
                    pending.push(self.run_cell(row_id.clone(), column_id, gen_config, &row, history, sender.clone()));
                }

                while let Some(result) = pending.next().await {
                    if let Some(value) = result.value {
                        row.set(result.column_id.clone(), value);
                    }
                    if result.state.error.is_some() {
                        failed.insert(result.column_id.clone());
                    }
                    row.set_state(result.column_id, result.state);
                    usage.extend(result.usage);
                }
            }
        }

        if !cancelled_mid_flight {
            row.close(now_ms());
        }
        RowOutcome {
            row,
            usage,
            completed: !cancelled_mid_flight,
        }
    }

    async fn run_cell(
        &self,
        row_id: String,
        column_id: String,
        gen_config: GenConfig,
        row: &Row,
        history: &[Row],
        sender: mpsc::Sender<RowChunk>,
    ) -> CellResult {
        match gen_config {
            GenConfig::Llm(config) => self.run_llm_cell(row_id, column_id, config, row, history, sender).await,
            GenConfig::Embed(config) => self.run_embed_cell(row_id, column_id, config, row, sender).await,
            GenConfig::Python(config) => self.run_python_cell(row_id, column_id, config, row, sender).await,
        }
    }

    async fn run_llm_cell(
        &self,
        row_id: String,
        column_id: String,
        config: gentable_core::LlmConfig,
        row: &Row,
        history: &[Row],
        sender: mpsc::Sender<RowChunk>,
    ) -> CellResult {
        let fallback_query = config.user_prompt_template().render(|col| {
            row.get(col).map(Value::render_for_template).unwrap_or_default()
        });
        let rag = match resolve_rag(self.ctx, &config, &self.ctx.org_id, &self.ctx.project_id, &fallback_query) {
            Ok(rag) => rag,
            Err(err) => {
                return CellResult {
                    column_id,
                    value: None,
                    state: CellState::error(err.to_string()),
                    usage: Vec::new(),
                };
            }
        };

        let chat_history = if *config.multi_turn() {
            render_chat_history(&config, &column_id, history)
        } else {
            Vec::new()
        };

        let mut stream = dispatch::dispatch_llm(self.ctx, &config, row, &chat_history, rag);
        let mut text = String::new();
        let mut finish_reason = String::new();
        let mut references = None;
        let mut usage_events = Vec::new();

        while let Some(item) = stream.next().await {
            match item {
                Ok(CellChunk::References(refs)) => {
                    references = Some(refs.clone());
                    let _ = sender
                        .send(RowChunk { row_id: row_id.clone(), column_id: column_id.clone(), chunk: CellChunk::References(refs) })
                        .await;
                }
                Ok(CellChunk::TextDelta(delta)) => {
                    text.push_str(&delta);
                    let _ = sender
                        .send(RowChunk { row_id: row_id.clone(), column_id: column_id.clone(), chunk: CellChunk::TextDelta(delta) })
                        .await;
                }
                Ok(terminal @ CellChunk::Terminal { .. }) => {
                    if let CellChunk::Terminal { finish_reason: fr, usage, .. } = &terminal {
                        finish_reason = fr.clone();
                        if let Some(u) = usage {
                            usage_events.push(u.clone());
                        }
                    }
                    let _ = sender.send(RowChunk { row_id: row_id.clone(), column_id: column_id.clone(), chunk: terminal }).await;
                }
                Err(err) => {
                    let state = CellState::error(err.to_string());
                    let _ = sender
                        .send(RowChunk {
                            row_id: row_id.clone(),
                            column_id: column_id.clone(),
                            chunk: CellChunk::Terminal { value: Value::Null, finish_reason: "error".to_string(), usage: None },
                        })
                        .await;
                    return CellResult { column_id, value: None, state, usage: usage_events };
                }
            }
        }

        let state = if finish_reason == "error" {
            CellState::error("generation failed".to_string())
        } else {
            let mut state = CellState::ok(Some(finish_reason));
            if let Some(refs) = references {
                state = state.with_references(refs);
            }
            state
        };
        CellResult { column_id, value: Some(Value::Str(text)), state, usage: usage_events }
    }

    async fn run_embed_cell(
        &self,
        row_id: String,
        column_id: String,
        config: gentable_core::EmbedConfig,
        row: &Row,
        sender: mpsc::Sender<RowChunk>,
    ) -> CellResult {
        match dispatch::dispatch_embed(self.ctx, &config, row).await {
            Ok(terminal @ CellChunk::Terminal { ref value, ref finish_reason, ref usage }) => {
                let state = CellState::ok(Some(finish_reason.clone()));
                let value = Some(value.clone());
                let usage = usage.clone().into_iter().collect();
                let _ = sender.send(RowChunk { row_id, column_id: column_id.clone(), chunk: terminal }).await;
                CellResult { column_id, value, state, usage }
            }
            Ok(_) => unreachable!("dispatch_embed always returns a Terminal chunk"),
            Err(err) => {
                let state = CellState::error(err.to_string());
                let _ = sender
                    .send(RowChunk {
                        row_id,
                        column_id: column_id.clone(),
                        chunk: CellChunk::Terminal { value: Value::Null, finish_reason: "error".to_string(), usage: None },
                    })
                    .await;
                CellResult { column_id, value: None, state, usage: Vec::new() }
            }
        }
    }

    async fn run_python_cell(
        &self,
        row_id: String,
        column_id: String,
        config: gentable_core::PythonConfig,
        row: &Row,
        sender: mpsc::Sender<RowChunk>,
    ) -> CellResult {
        match dispatch::dispatch_python(self.ctx, &config, row).await {
            Ok(terminal @ CellChunk::Terminal { ref value, ref finish_reason, .. }) => {
                let state = CellState::ok(Some(finish_reason.clone()));
                let value = Some(value.clone());
                let _ = sender.send(RowChunk { row_id, column_id: column_id.clone(), chunk: terminal }).await;
                CellResult { column_id, value, state, usage: Vec::new() }
            }
            Ok(_) => unreachable!("dispatch_python always returns a Terminal chunk"),
            Err(err) => {
                let state = CellState::error(err.to_string());
                let _ = sender
                    .send(RowChunk {
                        row_id,
                        column_id: column_id.clone(),
                        chunk: CellChunk::Terminal { value: Value::Null, finish_reason: "error".to_string(), usage: None },
                    })
                    .await;
                CellResult { column_id, value: None, state, usage: Vec::new() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gentable_core::{Column, DType, EmbedConfig, TableKind};

    fn fanout_schema() -> Schema {
        let columns = vec![
            Column::input("a".to_string(), DType::Str, 1),
            Column::output(
                "b".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("embed-1".to_string(), "a".to_string())),
                2,
            ),
            Column::output(
                "c".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("embed-1".to_string(), "b".to_string())),
                3,
            ),
        ];
        Schema::new(TableKind::Action, columns).unwrap()
    }

    #[test]
    fn chat_history_pairs_prior_prompt_with_prior_answer() {
        let config = LlmConfig::new(
            "m".to_string(),
            "You are terse.".to_string(),
            "Continue from: ${topic}".to_string(),
            None,
            None,
            None,
            None,
            None,
            true,
        );
        let mut prior = Row::draft("row_0".to_string());
        prior.set("topic".to_string(), Value::Str("rust".to_string()));
        prior.set("reply".to_string(), Value::Str("Rust is great.".to_string()));

        let messages = render_chat_history(&config, "reply", &[prior]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
    }

    #[test]
    fn schema_builds_graph_with_expected_width() {
        let schema = fanout_schema();
        let graph = ColumnGraph::build(&schema).unwrap();
        assert_eq!(graph.max_level_width(), 1);
    }
}

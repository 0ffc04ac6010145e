//! `validate` and `plan` command handlers: load a schema from TOML and
//! exercise the column-graph analyzer (spec §4.A) and batch planner
//! (spec §4.B) against it, without touching any provider or storage
//! backend.

use gentable_core::{CellBudget, Schema};
use gentable_engine::{plan_batch, ColumnGraph};
use gentable_error::{EngineError, EngineErrorKind, GentableResult};
use std::path::Path;
use tracing::info;

fn load_schema(path: &Path) -> GentableResult<Schema> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        EngineError::new(EngineErrorKind::SchemaViolation(format!(
            "failed to read schema file {}: {err}",
            path.display()
        )))
    })?;
    let schema: Schema = toml::from_str(&text).map_err(|err| {
        EngineError::new(EngineErrorKind::SchemaViolation(format!(
            "failed to parse schema file {}: {err}",
            path.display()
        )))
    })?;
    // `Schema`'s fields are private but still reachable to serde's derived
    // `Deserialize` impl, which bypasses `Schema::new`'s validation — run it
    // explicitly so a malformed schema file is rejected before planning.
    schema.validate()?;
    Ok(schema)
}

/// Validate a schema and print its column-graph levels.
pub fn validate(path: &Path) -> GentableResult<()> {
    let schema = load_schema(path)?;
    let graph = ColumnGraph::build(&schema)?;

    println!("schema valid: {} data column(s), kind = {:?}", schema.columns().len(), schema.kind());
    for (level, columns) in graph.levels().iter().enumerate() {
        if columns.is_empty() {
            continue;
        }
        println!("  level {level}: {}", columns.join(", "));
    }
    println!("max_level_width = {}", graph.max_level_width());
    info!(columns = schema.columns().len(), max_level_width = graph.max_level_width(), "schema validated");
    Ok(())
}

/// Compute and print the planner's `(column_batch, row_batch)` decision.
pub fn plan(path: &Path, budget: u32, to_generate: usize, concurrent: bool, multi_turn: bool) -> GentableResult<()> {
    let schema = load_schema(path)?;
    let graph = ColumnGraph::build(&schema)?;

    let cell_budget = CellBudget::new(budget)
        .map_err(|msg| EngineError::new(EngineErrorKind::SchemaViolation(msg)))?;
    let decision = plan_batch(&graph, cell_budget, concurrent, multi_turn, to_generate);
    println!(
        "column_batch = {}, row_batch = {} (budget = {budget}, to_generate = {to_generate}, max_level_width = {})",
        decision.column_batch,
        decision.row_batch,
        graph.max_level_width(),
    );
    Ok(())
}

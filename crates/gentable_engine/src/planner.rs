//! Batch planner (spec §4.B).
//!
//! Decides `(column_batch, row_batch)` for one row-write request, subject
//! to the cell budget `C`, the analyzer's `max_level_width`, and whether the
//! request is multi-turn.

use crate::graph::ColumnGraph;
use gentable_core::{CellBudget, RegenStrategy, Row, Schema};

/// The scheduler's decision for one request: dispatch up to `column_batch`
/// columns and `row_batch` rows concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    /// Maximum output columns dispatched concurrently per row.
    pub column_batch: usize,
    /// Maximum rows dispatched concurrently.
    pub row_batch: usize,
}

/// Which output columns a `MultiRowRegen` request selects (spec §4.B rule 3).
#[derive(Debug, Clone, Copy)]
pub struct RegenSelection<'a> {
    /// The strategy requested.
    pub strategy: RegenStrategy,
    /// The pivot column, required for every strategy but `RunAll`.
    pub output_column_id: Option<&'a str>,
}

/// Compute the output columns that need generation for `RowAdd`/`MultiRowAdd`:
/// every output column whose value the input row does not already supply
/// (spec §4.B rule 3).
pub fn columns_needing_generation_for_add<'a>(schema: &'a Schema, row: &Row) -> Vec<&'a str> {
    schema
        .columns()
        .iter()
        .filter(|c| c.is_output())
        .map(|c| c.id().as_str())
        .filter(|id| !row.has_value(id))
        .collect()
}

/// Compute the output columns selected by a `MultiRowRegen` request's
/// `regen_strategy` (spec §4.B rule 3).
pub fn columns_needing_generation_for_regen<'a>(
    schema: &'a Schema,
    selection: RegenSelection<'_>,
) -> Vec<&'a str> {
    let output_columns: Vec<&Column> = schema.columns().iter().filter(|c| c.is_output()).collect();
    let pivot_order = selection.output_column_id.and_then(|id| {
        schema.column(id).map(|c| *c.column_order())
    });

    output_columns
        .into_iter()
        .filter(|c| match selection.strategy {
            RegenStrategy::RunAll => true,
            RegenStrategy::RunSelected => Some(c.id().as_str()) == selection.output_column_id,
            RegenStrategy::RunBefore => pivot_order.is_some_and(|p| *c.column_order() <= p),
            RegenStrategy::RunAfter => pivot_order.is_some_and(|p| *c.column_order() >= p),
        })
        .map(|c| c.id().as_str())
        .collect()
}

use gentable_core::Column;

/// Plan `(column_batch, row_batch)` for one request (spec §4.B rules 1-5).
///
/// `to_generate` is the number of output columns that actually need
/// generation for this request (spec §4.B rule 3, computed by
/// [`columns_needing_generation_for_add`] or
/// [`columns_needing_generation_for_regen`]).
pub fn plan_batch(
    graph: &ColumnGraph,
    cell_budget: CellBudget,
    concurrent: bool,
    multi_turn: bool,
    to_generate: usize,
) -> BatchPlan {
    let c = cell_budget.value() as usize;

    // Rule 1.
    if !concurrent {
        return BatchPlan {
            column_batch: 1,
            row_batch: c,
        };
    }
    // Rule 2.
    if multi_turn {
        return BatchPlan {
            column_batch: 1,
            row_batch: 1,
        };
    }

    // Rule 4.
    let max_level_width = graph.max_level_width().max(1);
    let column_batch = to_generate.max(1).min(max_level_width);
    // Rule 5.
    let row_batch = (c / column_batch).max(1);

    BatchPlan {
        column_batch,
        row_batch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gentable_core::{DType, EmbedConfig, GenConfig, TableKind};

    fn fanout_schema() -> Schema {
        let columns = vec![
            Column::input("a".to_string(), DType::Str, 1),
            Column::output(
                "b".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("m".to_string(), "a".to_string())),
                2,
            ),
            Column::output(
                "c".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("m".to_string(), "a".to_string())),
                3,
            ),
            Column::output(
                "d".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("m".to_string(), "a".to_string())),
                4,
            ),
        ];
        Schema::new(TableKind::Action, columns).unwrap()
    }

    #[test]
    fn s1_linear_chain_favors_row_parallelism() {
        // Linear chain: max_level_width = 1, to_generate = 3 (but capped by width).
        let columns = vec![
            Column::input("a".to_string(), DType::Str, 1),
            Column::output(
                "b".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("m".to_string(), "a".to_string())),
                2,
            ),
            Column::output(
                "c".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("m".to_string(), "b".to_string())),
                3,
            ),
            Column::output(
                "d".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("m".to_string(), "c".to_string())),
                4,
            ),
        ];
        let schema = Schema::new(TableKind::Action, columns).unwrap();
        let graph = ColumnGraph::build(&schema).unwrap();
        let plan = plan_batch(&graph, CellBudget::new(15).unwrap(), true, false, 3);
        assert_eq!(plan, BatchPlan { column_batch: 1, row_batch: 15 });
    }

    #[test]
    fn s2_fan_out_favors_column_parallelism() {
        let schema = fanout_schema();
        let graph = ColumnGraph::build(&schema).unwrap();
        let plan = plan_batch(&graph, CellBudget::new(15).unwrap(), true, false, 3);
        assert_eq!(plan, BatchPlan { column_batch: 3, row_batch: 5 });
    }

    #[test]
    fn s12_multi_turn_forces_single_row() {
        let schema = fanout_schema();
        let graph = ColumnGraph::build(&schema).unwrap();
        let plan = plan_batch(&graph, CellBudget::new(15).unwrap(), true, true, 3);
        assert_eq!(plan, BatchPlan { column_batch: 1, row_batch: 1 });
    }

    #[test]
    fn non_concurrent_forces_row_batch_to_budget() {
        let schema = fanout_schema();
        let graph = ColumnGraph::build(&schema).unwrap();
        let plan = plan_batch(&graph, CellBudget::new(15).unwrap(), false, false, 3);
        assert_eq!(plan, BatchPlan { column_batch: 1, row_batch: 15 });
    }

    #[test]
    fn property_column_times_row_never_exceeds_budget() {
        let schema = fanout_schema();
        let graph = ColumnGraph::build(&schema).unwrap();
        for to_generate in 0..=5 {
            for c in [1u32, 2, 15, 30] {
                let plan = plan_batch(&graph, CellBudget::new(c).unwrap(), true, false, to_generate);
                assert!(plan.column_batch * plan.row_batch <= c as usize);
                assert!(plan.column_batch <= graph.max_level_width());
            }
        }
    }

    #[test]
    fn run_after_selects_pivot_and_later() {
        // Schema [A, B, X, Y, Z] all output columns except A.
        let columns = vec![
            Column::input("a".to_string(), DType::Str, 1),
            Column::output(
                "b".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("m".to_string(), "a".to_string())),
                2,
            ),
            Column::output(
                "x".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("m".to_string(), "b".to_string())),
                3,
            ),
            Column::output(
                "y".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("m".to_string(), "x".to_string())),
                4,
            ),
            Column::output(
                "z".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("m".to_string(), "y".to_string())),
                5,
            ),
        ];
        let schema = Schema::new(TableKind::Action, columns).unwrap();
        let selection = RegenSelection {
            strategy: RegenStrategy::RunAfter,
            output_column_id: Some("x"),
        };
        let mut selected = columns_needing_generation_for_regen(&schema, selection);
        selected.sort();
        assert_eq!(selected, vec!["x", "y", "z"]);
    }
}

//! Column-graph analyzer (spec §4.A).
//!
//! Builds the dependency DAG over a schema's output columns, assigns each a
//! level (longest path from any input column), and exposes the widest
//! level's width as the batch planner's `max_level_width` bound.

use gentable_core::Schema;
use gentable_error::{EngineError, EngineErrorKind, GentableResult};
use std::collections::HashMap;

/// The output-column dependency DAG for one table schema, with levels
/// pre-computed at schema-load time (spec §9 "Cycle detection").
#[derive(Debug, Clone)]
pub struct ColumnGraph {
    levels: HashMap<String, u32>,
    by_level: Vec<Vec<String>>,
}

impl ColumnGraph {
    /// Build the graph from a validated schema.
    ///
    /// `Schema::new` already enforces invariant 1 (every reference points
    /// strictly left), which makes the reference relation a DAG by
    /// construction. This still walks it explicitly and raises `BadInput`
    /// on a cycle, since a schema reconstructed from persisted rows might
    /// not have gone through `Schema::new`.
    pub fn build(schema: &Schema) -> GentableResult<Self> {
        let output_columns: Vec<&str> = schema
            .columns()
            .iter()
            .filter(|c| c.is_output())
            .map(|c| c.id().as_str())
            .collect();

        let mut levels: HashMap<String, u32> = HashMap::new();
        let mut in_progress: Vec<String> = Vec::new();

        for id in &output_columns {
            Self::level_of(id, schema, &mut levels, &mut in_progress)?;
        }

        let max_level = levels.values().copied().max().unwrap_or(0);
        let mut by_level: Vec<Vec<String>> = vec![Vec::new(); max_level as usize + 1];
        // Deterministic tie-break by column_order (spec §9 open question (b)).
        let mut ordered: Vec<&str> = output_columns;
        ordered.sort_by_key(|id| schema.column(id).map(|c| *c.column_order()).unwrap_or(0));
        for id in ordered {
            let level = levels[id];
            by_level[level as usize].push(id.to_string());
        }

        Ok(Self { levels, by_level })
    }

    fn level_of(
        id: &str,
        schema: &Schema,
        levels: &mut HashMap<String, u32>,
        in_progress: &mut Vec<String>,
    ) -> GentableResult<u32> {
        if let Some(level) = levels.get(id) {
            return Ok(*level);
        }
        if in_progress.iter().any(|x| x == id) {
            let mut cycle = in_progress.clone();
            cycle.push(id.to_string());
            return Err(EngineError::new(EngineErrorKind::ReferenceCycle(cycle)).into());
        }
        let column = schema
            .column(id)
            .ok_or_else(|| EngineError::new(EngineErrorKind::UnknownColumn(id.to_string())))?;

        in_progress.push(id.to_string());
        let mut level = 0u32;
        for reference in column.referenced_columns() {
            let ref_column = schema.column(&reference).ok_or_else(|| {
                EngineError::new(EngineErrorKind::UnknownColumn(reference.clone()))
            })?;
            if ref_column.is_output() {
                let ref_level = Self::level_of(&reference, schema, levels, in_progress)?;
                level = level.max(ref_level + 1);
            }
        }
        in_progress.pop();
        levels.insert(id.to_string(), level);
        Ok(level)
    }

    /// Output column ids grouped by level, in ascending level order. Within
    /// a level, columns are ordered by `column_order` (spec §9 open
    /// question (b): any deterministic tie-break is valid).
    pub fn levels(&self) -> &[Vec<String>] {
        &self.by_level
    }

    /// The widest level's width — the batch planner's upper bound on
    /// `column_batch` (spec §4.A, §4.B rule 4).
    pub fn max_level_width(&self) -> usize {
        self.by_level.iter().map(|l| l.len()).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gentable_core::{Column, DType, EmbedConfig, GenConfig, TableKind};

    fn chain_schema() -> Schema {
        // A (input) -> B -> C -> D, a linear chain.
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
        Schema::new(TableKind::Action, columns).unwrap()
    }

    fn fanout_schema() -> Schema {
        // A (input) -> {B, C, D}, independent fan-out.
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
    fn linear_chain_has_width_one() {
        let schema = chain_schema();
        let graph = ColumnGraph::build(&schema).unwrap();
        assert_eq!(graph.max_level_width(), 1);
        assert_eq!(graph.levels().len(), 3);
        assert_eq!(graph.levels()[0], vec!["b".to_string()]);
        assert_eq!(graph.levels()[1], vec!["c".to_string()]);
        assert_eq!(graph.levels()[2], vec!["d".to_string()]);
    }

    #[test]
    fn fan_out_has_width_three() {
        let schema = fanout_schema();
        let graph = ColumnGraph::build(&schema).unwrap();
        assert_eq!(graph.max_level_width(), 3);
        assert_eq!(graph.levels().len(), 1);
        assert_eq!(graph.levels()[0].len(), 3);
    }
}

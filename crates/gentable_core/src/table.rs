//! Table schema and kind (spec §3 "Table", invariants 1-5).

use crate::{Column, DType};
use gentable_error::{EngineError, EngineErrorKind, GentableResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The implicit row identifier column, present on every table.
pub const ID_COLUMN: &str = "ID";
/// The implicit monotonic-timestamp column, present on every table.
pub const UPDATED_AT_COLUMN: &str = "UpdatedAt";

/// The three table kinds (spec §3, GLOSSARY).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Append-only table with arbitrary columns.
    Action,
    /// Action table with one embedding column over a text source, supporting
    /// hybrid retrieval.
    Knowledge {
        /// The vector column used for retrieval.
        vector_column: String,
        /// The text column the vector column embeds.
        source_column: String,
    },
    /// Action table with one `multi_turn` LLM column whose prompt spans
    /// prior rows.
    Chat {
        /// The multi-turn LLM column.
        multi_turn_column: String,
    },
}

/// A validated table schema: the ordered list of data columns plus the
/// table kind.
///
/// # Examples
///
/// ```
/// use gentable_core::{Column, DType, Schema, TableKind};
///
/// let columns = vec![Column::input("title".to_string(), DType::Str, 1)];
/// let schema = Schema::new(TableKind::Action, columns).unwrap();
/// assert_eq!(schema.columns().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    kind: TableKind,
    columns: Vec<Column>,
}

impl Schema {
    /// Construct and validate a schema, enforcing invariants 1-5.
    pub fn new(kind: TableKind, columns: Vec<Column>) -> GentableResult<Self> {
        let schema = Self { kind, columns };
        schema.validate()?;
        Ok(schema)
    }

    /// The table kind.
    pub fn kind(&self) -> &TableKind {
        &self.kind
    }

    /// The ordered data columns (excludes the implicit `ID`/`UpdatedAt`
    /// columns and state columns, which are not modeled as [`Column`]s).
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by id.
    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id() == id)
    }

    /// Insert a new output or input column, positioned immediately before
    /// `before_id` (or at the end, if `None`), reindexing every other
    /// column's `column_order` to stay dense and re-validating invariants
    /// 1-5 against the result. Rejects the mutation, leaving `self`
    /// untouched, if the new column's generation config references a
    /// column that ends up to its right (invariant 1).
    pub fn add_column(&self, column: Column, before_id: Option<&str>) -> GentableResult<Schema> {
        let insert_at = match before_id {
            Some(id) => self
                .columns
                .iter()
                .position(|c| c.id() == id)
                .ok_or_else(|| EngineError::not_found(format!("column '{id}'")))?,
            None => self.columns.len(),
        };
        let mut columns = self.columns.clone();
        columns.insert(insert_at, column);
        reindex(&mut columns);
        Schema::new(self.kind.clone(), columns)
    }

    /// Remove a column by id, reindexing the survivors' `column_order` to
    /// stay dense and re-validating. Rejects the mutation if any surviving
    /// column (or the table's own `kind`) still references the dropped id.
    pub fn drop_column(&self, id: &str) -> GentableResult<Schema> {
        if self.column(id).is_none() {
            return Err(EngineError::not_found(format!("column '{id}'")).into());
        }
        let mut columns: Vec<Column> = self.columns.iter().filter(|c| c.id() != id).cloned().collect();
        reindex(&mut columns);
        Schema::new(self.kind.clone(), columns)
    }

    /// Rename a column. Rejects the mutation if any other column's
    /// generation config, or the table's own `kind`, still names the old
    /// id — callers must retarget those references first, since this spec
    /// does not rewrite prompt templates on rename.
    pub fn rename_column(&self, id: &str, new_id: String) -> GentableResult<Schema> {
        if self.column(id).is_none() {
            return Err(EngineError::not_found(format!("column '{id}'")).into());
        }
        if self.column(&new_id).is_some() {
            return Err(EngineError::new(EngineErrorKind::Conflict(format!(
                "column '{new_id}' already exists"
            )))
            .into());
        }
        let mut columns = self.columns.clone();
        for column in columns.iter_mut() {
            if column.id() == id {
                column.rename(new_id.clone());
            }
        }
        Schema::new(self.kind.clone(), columns)
    }

    /// Move a column to a new 1-based position among data columns,
    /// reindexing every other column's `column_order` accordingly and
    /// re-validating. Rejects the mutation if the move would place the
    /// column to the left of something it references, or to the right of
    /// something that references it (invariant 1).
    pub fn reorder_column(&self, id: &str, new_order: u32) -> GentableResult<Schema> {
        let current = self
            .columns
            .iter()
            .position(|c| c.id() == id)
            .ok_or_else(|| EngineError::not_found(format!("column '{id}'")))?;
        let mut columns = self.columns.clone();
        let column = columns.remove(current);
        let insert_at = (new_order.saturating_sub(1) as usize).min(columns.len());
        columns.insert(insert_at, column);
        reindex(&mut columns);
        Schema::new(self.kind.clone(), columns)
    }

    /// Validate invariants 1, 2, 3, 4, 5 against the schema.
    pub fn validate(&self) -> GentableResult<()> {
        self.validate_dense_order()?;
        self.validate_references()?;
        self.validate_chat_invariant()?;
        self.validate_knowledge_invariant()?;
        Ok(())
    }

    /// Invariant 2: `column_order` is dense and 1-based.
    fn validate_dense_order(&self) -> GentableResult<()> {
        let mut orders: Vec<u32> = self.columns.iter().map(|c| *c.column_order()).collect();
        orders.sort_unstable();
        for (expected, actual) in (1..=orders.len() as u32).zip(orders.iter()) {
            if expected != *actual {
                return Err(EngineError::new(EngineErrorKind::SchemaViolation(format!(
                    "column_order is not dense/1-based: expected {expected}, found {actual}"
                )))
                .into());
            }
        }
        Ok(())
    }

    /// Invariant 1: every reference names a column strictly to the left of
    /// its holder. Because the order relation is total, this also rules out
    /// reference cycles by construction.
    fn validate_references(&self) -> GentableResult<()> {
        let order_by_id: HashMap<&str, u32> = self
            .columns
            .iter()
            .map(|c| (c.id().as_str(), *c.column_order()))
            .collect();

        for column in &self.columns {
            for reference in column.referenced_columns() {
                let ref_order = order_by_id.get(reference.as_str()).copied().ok_or_else(|| {
                    EngineError::new(EngineErrorKind::UnknownColumn(reference.clone()))
                })?;
                if ref_order >= *column.column_order() {
                    return Err(EngineError::new(EngineErrorKind::ReferenceNotLeft {
                        holder: column.id().clone(),
                        reference: reference.clone(),
                    })
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Invariant 4: for Chat tables, exactly one LLM column has `multi_turn = true`.
    fn validate_chat_invariant(&self) -> GentableResult<()> {
        let multi_turn_columns: Vec<&Column> = self
            .columns
            .iter()
            .filter(|c| {
                c.gen_config()
                    .as_ref()
                    .map(|cfg| cfg.is_multi_turn())
                    .unwrap_or(false)
            })
            .collect();

        match &self.kind {
            TableKind::Chat { multi_turn_column } => {
                if multi_turn_columns.len() != 1 {
                    return Err(EngineError::new(EngineErrorKind::SchemaViolation(format!(
                        "Chat table must have exactly one multi_turn LLM column, found {}",
                        multi_turn_columns.len()
                    )))
                    .into());
                }
                if multi_turn_columns[0].id() != multi_turn_column {
                    return Err(EngineError::new(EngineErrorKind::SchemaViolation(format!(
                        "Chat table's multi_turn_column '{multi_turn_column}' does not match the schema's multi_turn LLM column '{}'",
                        multi_turn_columns[0].id()
                    )))
                    .into());
                }
            }
            _ => {
                if !multi_turn_columns.is_empty() {
                    return Err(EngineError::new(EngineErrorKind::SchemaViolation(
                        "multi_turn LLM columns are only permitted on Chat tables".to_string(),
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Invariant 5: at most one vector column per Knowledge table; its
    /// dimensionality equals the embedding model's output size is enforced
    /// at embed time, not here (the schema cannot know the model's output
    /// size without calling it).
    fn validate_knowledge_invariant(&self) -> GentableResult<()> {
        let vector_columns: Vec<&Column> = self
            .columns
            .iter()
            .filter(|c| matches!(c.dtype(), DType::Vector(_)))
            .collect();

        match &self.kind {
            TableKind::Knowledge {
                vector_column,
                source_column,
            } => {
                if vector_columns.len() != 1 {
                    return Err(EngineError::new(EngineErrorKind::SchemaViolation(format!(
                        "Knowledge table must have exactly one vector column, found {}",
                        vector_columns.len()
                    )))
                    .into());
                }
                if vector_columns[0].id() != vector_column {
                    return Err(EngineError::new(EngineErrorKind::SchemaViolation(format!(
                        "Knowledge table's vector_column '{vector_column}' does not match schema's vector column '{}'",
                        vector_columns[0].id()
                    )))
                    .into());
                }
                if self.column(source_column).is_none() {
                    return Err(
                        EngineError::new(EngineErrorKind::UnknownColumn(source_column.clone()))
                            .into(),
                    );
                }
            }
            _ => {
                if vector_columns.len() > 1 {
                    return Err(EngineError::new(EngineErrorKind::SchemaViolation(
                        "at most one vector column is permitted outside Knowledge tables"
                            .to_string(),
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }
}

/// Stamp `column_order` 1..=n over `columns` in their current slice order,
/// the shared reindexing step behind every `Schema` lifecycle mutation.
fn reindex(columns: &mut [Column]) {
    for (i, column) in columns.iter_mut().enumerate() {
        column.set_column_order((i + 1) as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EmbedConfig, GenConfig};

    #[test]
    fn rejects_forward_reference() {
        let columns = vec![
            Column::output(
                "a".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("m".to_string(), "b".to_string())),
                1,
            ),
            Column::input("b".to_string(), DType::Str, 2),
        ];
        let err = Schema::new(TableKind::Action, columns).unwrap_err();
        assert!(format!("{err}").contains("Engine"));
    }

    #[test]
    fn accepts_valid_chain() {
        let columns = vec![
            Column::input("a".to_string(), DType::Str, 1),
            Column::output(
                "b".to_string(),
                DType::Str,
                GenConfig::Embed(EmbedConfig::new("m".to_string(), "a".to_string())),
                2,
            ),
        ];
        assert!(Schema::new(TableKind::Action, columns).is_ok());
    }

    #[test]
    fn rejects_sparse_order() {
        let columns = vec![
            Column::input("a".to_string(), DType::Str, 1),
            Column::input("b".to_string(), DType::Str, 3),
        ];
        assert!(Schema::new(TableKind::Action, columns).is_err());
    }

    fn linear_schema() -> Schema {
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

    #[test]
    fn add_column_inserts_before_named_column_and_reindexes() {
        let schema = linear_schema();
        let inserted = Column::input("mid".to_string(), DType::Str, 0);
        let updated = schema.add_column(inserted, Some("b")).unwrap();

        let orders: Vec<(String, u32)> = updated
            .columns()
            .iter()
            .map(|c| (c.id().clone(), *c.column_order()))
            .collect();
        assert_eq!(
            orders,
            vec![("a".to_string(), 1), ("mid".to_string(), 2), ("b".to_string(), 3)]
        );
    }

    #[test]
    fn add_column_rejects_forward_reference_into_new_position() {
        let schema = linear_schema();
        let bad = Column::output(
            "mid".to_string(),
            DType::Str,
            GenConfig::Embed(EmbedConfig::new("m".to_string(), "b".to_string())),
            0,
        );
        assert!(schema.add_column(bad, Some("b")).is_err());
    }

    #[test]
    fn drop_column_rejects_when_a_survivor_still_references_it() {
        let schema = linear_schema();
        assert!(schema.drop_column("a").is_err());
    }

    #[test]
    fn drop_column_reindexes_remaining_columns() {
        let columns = vec![
            Column::input("a".to_string(), DType::Str, 1),
            Column::input("b".to_string(), DType::Str, 2),
        ];
        let schema = Schema::new(TableKind::Action, columns).unwrap();
        let updated = schema.drop_column("a").unwrap();
        assert_eq!(updated.columns().len(), 1);
        assert_eq!(*updated.columns()[0].column_order(), 1);
    }

    #[test]
    fn rename_column_rejects_conflict_with_existing_id() {
        let schema = linear_schema();
        assert!(schema.rename_column("a", "b".to_string()).is_err());
    }

    #[test]
    fn rename_column_rejects_when_referenced_elsewhere() {
        let schema = linear_schema();
        assert!(schema.rename_column("a", "renamed".to_string()).is_err());
    }

    #[test]
    fn rename_column_succeeds_when_unreferenced() {
        let columns = vec![
            Column::input("a".to_string(), DType::Str, 1),
            Column::input("b".to_string(), DType::Str, 2),
        ];
        let schema = Schema::new(TableKind::Action, columns).unwrap();
        let updated = schema.rename_column("b", "renamed".to_string()).unwrap();
        assert!(updated.column("renamed").is_some());
        assert!(updated.column("b").is_none());
    }

    #[test]
    fn reorder_column_moves_and_reindexes() {
        let columns = vec![
            Column::input("a".to_string(), DType::Str, 1),
            Column::input("b".to_string(), DType::Str, 2),
            Column::input("c".to_string(), DType::Str, 3),
        ];
        let schema = Schema::new(TableKind::Action, columns).unwrap();
        let updated = schema.reorder_column("c", 1).unwrap();
        let ids: Vec<String> = updated.columns().iter().map(|c| c.id().clone()).collect();
        assert_eq!(ids, vec!["c".to_string(), "a".to_string(), "b".to_string()]);
    }

    #[test]
    fn reorder_column_rejects_move_past_its_own_dependency() {
        let schema = linear_schema();
        assert!(schema.reorder_column("b", 1).is_err());
    }
}

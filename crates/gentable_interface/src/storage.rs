//! Abstract persistence seam (spec §6). `gentable_storage` provides the
//! concrete implementation; the engine and server only ever see this trait.

use crate::{OrderBy, RowPage};
use async_trait::async_trait;
use gentable_core::{ReferenceChunk, Row, Value};
use gentable_error::GentableResult;
use std::collections::HashMap;

/// A single filter predicate applied by `list_rows`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter {
    /// Column to filter on.
    pub column: String,
    /// Operator (e.g. "=", "!=", ">", "<", "contains").
    pub op: String,
    /// Value to compare against.
    pub value: Value,
}

/// Storage engine trait for table row persistence, implemented against
/// whatever backing store a deployment chooses (Postgres, an embedded KV
/// store, or an in-memory store for tests).
#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// List rows in a table, applying filters, ordering, and pagination.
    async fn list_rows(
        &self,
        table_id: &str,
        filters: &[RowFilter],
        order: &[OrderBy],
        limit: usize,
        offset: usize,
    ) -> GentableResult<RowPage>;

    /// Fetch a single row by id.
    async fn get_row(&self, table_id: &str, row_id: &str) -> GentableResult<Row>;

    /// Insert new rows, returning the assigned row ids in input order.
    async fn insert_rows(
        &self,
        table_id: &str,
        rows: Vec<HashMap<String, Value>>,
    ) -> GentableResult<Vec<String>>;

    /// Apply a partial update to one or more rows, keyed by row id.
    async fn update_rows(
        &self,
        table_id: &str,
        updates: HashMap<String, HashMap<String, Value>>,
    ) -> GentableResult<()>;

    /// Delete rows, either by explicit id list or by a `where` predicate set.
    /// An empty `row_ids` with a non-empty `filters` deletes by predicate.
    async fn delete_rows(
        &self,
        table_id: &str,
        row_ids: &[String],
        filters: &[RowFilter],
    ) -> GentableResult<u64>;

    /// Run a hybrid vector + keyword search against a Knowledge table's
    /// vector column, returning the top `k` reference chunks (spec §4.D).
    async fn hybrid_search(
        &self,
        table_id: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> GentableResult<Vec<ReferenceChunk>>;

    /// Create a secondary index on a column, used for Knowledge tables'
    /// vector columns and for columns commonly used in `list_rows` filters.
    async fn create_index(&self, table_id: &str, column: &str) -> GentableResult<()>;
}

//! Reference `StorageEngine` implementation (spec §6): an in-process row
//! store keyed by table id, with brute-force hybrid search over the rows'
//! vector and text columns. Deployments that need a durable backend
//! implement the same trait against Postgres/Lance/whatever they run; this
//! one exists so the engine and server have something to run against
//! without standing up external infrastructure.

use gentable_core::{ReferenceChunk, Row, Value};
use gentable_error::{GentableResult, StorageError, StorageErrorKind};
use gentable_interface::{OrderBy, RowFilter, RowPage, SortDirection, StorageEngine};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

struct Table {
    /// Insertion order, authoritative for `list_rows` when no ordering is requested.
    row_order: Vec<String>,
    rows: HashMap<String, Row>,
}

impl Table {
    fn empty() -> Self {
        Self { row_order: Vec::new(), rows: HashMap::new() }
    }
}

/// An in-memory, per-process reference `StorageEngine`. Every table is a
/// `HashMap<row_id, Row>` behind a single mutex; fine for tests, demos, and
/// single-node deployments where the row count fits in memory.
pub struct InMemoryStorage {
    tables: Mutex<HashMap<String, Table>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    /// Construct an empty store with no tables.
    pub fn new() -> Self {
        Self { tables: Mutex::new(HashMap::new()) }
    }

    fn matches(row: &Row, filters: &[RowFilter]) -> bool {
        filters.iter().all(|f| {
            let Some(actual) = row.get(&f.column) else {
                return false;
            };
            match f.op.as_str() {
                "=" => actual == &f.value,
                "!=" => actual != &f.value,
                ">" => compare_values(actual, &f.value) == Some(Ordering::Greater),
                "<" => compare_values(actual, &f.value) == Some(Ordering::Less),
                ">=" => matches!(compare_values(actual, &f.value), Some(Ordering::Greater | Ordering::Equal)),
                "<=" => matches!(compare_values(actual, &f.value), Some(Ordering::Less | Ordering::Equal)),
                "contains" => match (actual, &f.value) {
                    (Value::Str(haystack), Value::Str(needle)) => haystack.contains(needle.as_str()),
                    _ => false,
                },
                _ => false,
            }
        })
    }
}

/// Cosine similarity between two vectors of possibly differing length
/// (the shorter length wins; this is a reference implementation, not a
/// validated vector index).
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for i in 0..len {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Str(x), Value::Str(y)) => x.partial_cmp(y),
        _ => None,
    }
}

#[async_trait::async_trait]
impl StorageEngine for InMemoryStorage {
    async fn list_rows(
        &self,
        table_id: &str,
        filters: &[RowFilter],
        order: &[OrderBy],
        limit: usize,
        offset: usize,
    ) -> GentableResult<RowPage> {
        let tables = self.tables.lock().expect("row store mutex poisoned");
        let Some(table) = tables.get(table_id) else {
            return Ok(RowPage { rows: Vec::new(), total: Some(0) });
        };

        let mut matching: Vec<&Row> = table
            .row_order
            .iter()
            .filter_map(|id| table.rows.get(id))
            .filter(|row| Self::matches(row, filters))
            .collect();

        for clause in order.iter().rev() {
            matching.sort_by(|a, b| {
                let ordering = match (a.get(&clause.column), b.get(&clause.column)) {
                    (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                match clause.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        let total = matching.len() as u64;
        let page = matching.into_iter().skip(offset).take(limit).cloned().collect();
        Ok(RowPage { rows: page, total: Some(total) })
    }

    async fn get_row(&self, table_id: &str, row_id: &str) -> GentableResult<Row> {
        let tables = self.tables.lock().expect("row store mutex poisoned");
        tables
            .get(table_id)
            .and_then(|t| t.rows.get(row_id))
            .cloned()
            .ok_or_else(|| StorageError::new(StorageErrorKind::RowNotFound(row_id.to_string())).into())
    }

    async fn insert_rows(
        &self,
        table_id: &str,
        rows: Vec<HashMap<String, Value>>,
    ) -> GentableResult<Vec<String>> {
        let mut tables = self.tables.lock().expect("row store mutex poisoned");
        let table = tables.entry(table_id.to_string()).or_insert_with(Table::empty);

        let mut ids = Vec::with_capacity(rows.len());
        for values in rows {
            let id = Uuid::new_v4().to_string();
            let mut row = Row::draft(id.clone());
            for (column, value) in values {
                row.set(column, value);
            }
            table.row_order.push(id.clone());
            table.rows.insert(id.clone(), row);
            ids.push(id);
        }
        debug!(table_id, inserted = ids.len(), "inserted rows");
        Ok(ids)
    }

    async fn update_rows(
        &self,
        table_id: &str,
        updates: HashMap<String, HashMap<String, Value>>,
    ) -> GentableResult<()> {
        let mut tables = self.tables.lock().expect("row store mutex poisoned");
        let table = tables
            .get_mut(table_id)
            .ok_or_else(|| StorageError::new(StorageErrorKind::WriteFailed(format!("no such table {table_id}"))))?;

        for (row_id, values) in updates {
            let row = table
                .rows
                .get_mut(&row_id)
                .ok_or_else(|| StorageError::new(StorageErrorKind::RowNotFound(row_id.clone())))?;
            for (column, value) in values {
                row.set(column, value);
            }
        }
        Ok(())
    }

    async fn delete_rows(
        &self,
        table_id: &str,
        row_ids: &[String],
        filters: &[RowFilter],
    ) -> GentableResult<u64> {
        let mut tables = self.tables.lock().expect("row store mutex poisoned");
        let Some(table) = tables.get_mut(table_id) else {
            return Ok(0);
        };

        let to_delete: Vec<String> = if !row_ids.is_empty() {
            row_ids.to_vec()
        } else {
            table
                .row_order
                .iter()
                .filter(|id| table.rows.get(*id).is_some_and(|row| Self::matches(row, filters)))
                .cloned()
                .collect()
        };

        let mut deleted = 0u64;
        for id in &to_delete {
            if table.rows.remove(id).is_some() {
                deleted += 1;
            }
        }
        table.row_order.retain(|id| !to_delete.contains(id));
        Ok(deleted)
    }

    async fn hybrid_search(
        &self,
        table_id: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> GentableResult<Vec<ReferenceChunk>> {
        let tables = self.tables.lock().expect("row store mutex poisoned");
        let Some(table) = tables.get(table_id) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<(f32, &Row)> = table
            .rows
            .values()
            .filter_map(|row| {
                row.values().values().find_map(|v| match v {
                    Value::Vector(vector) => Some((cosine_similarity(vector, query_embedding), row)),
                    _ => None,
                })
            })
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        let chunks = scored
            .into_iter()
            .take(k)
            .map(|(score, row)| {
                let text = row
                    .values()
                    .iter()
                    .find_map(|(_, v)| if let Value::Str(s) = v { Some(s.clone()) } else { None })
                    .unwrap_or_default();
                ReferenceChunk {
                    text,
                    title: None,
                    page: None,
                    file_name: None,
                    metadata: serde_json::json!({ "source_row_id": row.id(), "hybrid_score": score }),
                }
            })
            .collect();
        Ok(chunks)
    }

    async fn create_index(&self, table_id: &str, column: &str) -> GentableResult<()> {
        debug!(table_id, column, "index maintenance is a no-op on the in-memory reference store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let storage = InMemoryStorage::new();
        let ids = storage
            .insert_rows("t1", vec![values(&[("a", Value::Str("x".to_string()))])])
            .await
            .unwrap();
        let row = storage.get_row("t1", &ids[0]).await.unwrap();
        assert_eq!(row.get("a"), Some(&Value::Str("x".to_string())));
    }

    #[tokio::test]
    async fn get_row_missing_returns_not_found() {
        let storage = InMemoryStorage::new();
        let err = storage.get_row("t1", "nope").await.unwrap_err();
        assert!(format!("{err}").contains("not found"));
    }

    #[tokio::test]
    async fn update_rows_applies_partial_changes() {
        let storage = InMemoryStorage::new();
        let ids = storage
            .insert_rows("t1", vec![values(&[("a", Value::Int(1))])])
            .await
            .unwrap();
        let mut updates = HashMap::new();
        updates.insert(ids[0].clone(), values(&[("a", Value::Int(2))]));
        storage.update_rows("t1", updates).await.unwrap();
        let row = storage.get_row("t1", &ids[0]).await.unwrap();
        assert_eq!(row.get("a"), Some(&Value::Int(2)));
    }

    #[tokio::test]
    async fn delete_rows_by_explicit_id() {
        let storage = InMemoryStorage::new();
        let ids = storage
            .insert_rows("t1", vec![values(&[("a", Value::Int(1))]), values(&[("a", Value::Int(2))])])
            .await
            .unwrap();
        let deleted = storage.delete_rows("t1", &[ids[0].clone()], &[]).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(storage.get_row("t1", &ids[0]).await.is_err());
        assert!(storage.get_row("t1", &ids[1]).await.is_ok());
    }

    #[tokio::test]
    async fn delete_rows_by_predicate() {
        let storage = InMemoryStorage::new();
        storage
            .insert_rows(
                "t1",
                vec![
                    values(&[("status", Value::Str("draft".to_string()))]),
                    values(&[("status", Value::Str("done".to_string()))]),
                ],
            )
            .await
            .unwrap();
        let filter = RowFilter { column: "status".to_string(), op: "=".to_string(), value: Value::Str("draft".to_string()) };
        let deleted = storage.delete_rows("t1", &[], &[filter]).await.unwrap();
        assert_eq!(deleted, 1);
    }

    #[tokio::test]
    async fn list_rows_orders_and_paginates() {
        let storage = InMemoryStorage::new();
        storage
            .insert_rows(
                "t1",
                vec![values(&[("n", Value::Int(3))]), values(&[("n", Value::Int(1))]), values(&[("n", Value::Int(2))])],
            )
            .await
            .unwrap();
        let order = [OrderBy { column: "n".to_string(), direction: SortDirection::Ascending }];
        let page = storage.list_rows("t1", &[], &order, 2, 0).await.unwrap();
        assert_eq!(page.total, Some(3));
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.rows[0].get("n"), Some(&Value::Int(1)));
        assert_eq!(page.rows[1].get("n"), Some(&Value::Int(2)));
    }

    #[tokio::test]
    async fn hybrid_search_ranks_by_cosine_similarity() {
        let storage = InMemoryStorage::new();
        storage
            .insert_rows(
                "kb",
                vec![
                    values(&[("text", Value::Str("near".to_string())), ("embedding", Value::Vector(vec![1.0, 0.0]))]),
                    values(&[("text", Value::Str("far".to_string())), ("embedding", Value::Vector(vec![0.0, 1.0]))]),
                ],
            )
            .await
            .unwrap();
        let chunks = storage.hybrid_search("kb", &[1.0, 0.0], 5).await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "near");
    }
}

//! Stub backends shared by the engine's cross-component scenario tests.
//!
//! Each stub is a minimal fake implementing a single seam trait, the same
//! shape as a provider mock shared across a test suite.

use async_trait::async_trait;
use gentable_core::{GenerateChunk, GenerateRequest, GenerateResponse, Input, Message, Role, UsageEvent, Value};
use gentable_error::{GentableResult, ProviderError, ProviderErrorKind};
use gentable_interface::{
    CodeSandbox, Embedder, LmEngine, OrderBy, QuotaManager, RowFilter, RowPage, SandboxOutput, Streaming,
    StorageEngine,
};
use std::collections::HashMap;
use std::sync::Mutex;

pub struct NullQuota;

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

pub struct NullSandbox;

#[async_trait]
impl CodeSandbox for NullSandbox {
    async fn run(&self, _code: &str, _row: &HashMap<String, Value>) -> GentableResult<SandboxOutput> {
        unimplemented!("not exercised by these scenarios")
    }
    fn time_budget(&self) -> std::time::Duration {
        std::time::Duration::from_secs(5)
    }
    fn memory_budget_mib(&self) -> u64 {
        256
    }
}

pub struct NullStorage;

#[async_trait]
impl StorageEngine for NullStorage {
    async fn list_rows(
        &self,
        _table_id: &str,
        _filters: &[RowFilter],
        _order: &[OrderBy],
        _limit: usize,
        _offset: usize,
    ) -> GentableResult<RowPage> {
        unimplemented!("not exercised by these scenarios")
    }
    async fn get_row(&self, _table_id: &str, _row_id: &str) -> GentableResult<gentable_core::Row> {
        unimplemented!("not exercised by these scenarios")
    }
    async fn insert_rows(&self, _table_id: &str, _rows: Vec<HashMap<String, Value>>) -> GentableResult<Vec<String>> {
        unimplemented!("not exercised by these scenarios")
    }
    async fn update_rows(&self, _table_id: &str, _updates: HashMap<String, HashMap<String, Value>>) -> GentableResult<()> {
        unimplemented!("not exercised by these scenarios")
    }
    async fn delete_rows(&self, _table_id: &str, _row_ids: &[String], _filters: &[RowFilter]) -> GentableResult<u64> {
        unimplemented!("not exercised by these scenarios")
    }
    async fn hybrid_search(&self, _table_id: &str, _query_embedding: &[f32], _k: usize) -> GentableResult<Vec<gentable_core::ReferenceChunk>> {
        unimplemented!("not exercised by these scenarios")
    }
    async fn create_index(&self, _table_id: &str, _column: &str) -> GentableResult<()> {
        unimplemented!("not exercised by these scenarios")
    }
}

pub struct StubEmbedder;

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

/// A stub LLM that always answers with the column id it was dispatched
/// for, recording dispatch order so tests can assert level-by-level
/// sequencing (S1) or concurrent fan-out (S2). Optionally fails on a
/// named column to exercise cascading skip (S4).
pub struct RecordingLlm {
    pub order: Mutex<Vec<String>>,
    pub fail_on: Option<String>,
    /// Every request's full message list, in arrival order — used by the
    /// multi-turn scenario to inspect what chat history was threaded in.
    pub transcripts: Mutex<Vec<Vec<Message>>>,
}

impl RecordingLlm {
    pub fn new(fail_on: Option<&str>) -> Self {
        Self { order: Mutex::new(Vec::new()), fail_on: fail_on.map(str::to_string), transcripts: Mutex::new(Vec::new()) }
    }

    pub fn dispatched(&self) -> Vec<String> {
        self.order.lock().unwrap().clone()
    }

    pub fn last_transcript(&self) -> Vec<Message> {
        self.transcripts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LmEngine for RecordingLlm {
    async fn generate(&self, _req: &GenerateRequest) -> GentableResult<GenerateResponse> {
        unimplemented!("streaming path only")
    }
    fn provider_name(&self) -> &'static str {
        "stub"
    }
    fn model_name(&self) -> &str {
        "stub-model"
    }
}

#[async_trait]
impl Streaming for RecordingLlm {
    async fn generate_stream(
        &self,
        req: &GenerateRequest,
    ) -> GentableResult<std::pin::Pin<Box<dyn futures_util::Stream<Item = GentableResult<GenerateChunk>> + Send>>> {
        use futures_util::stream;

        // The stub identifies which column dispatched it by its system
        // prompt, a static per-column marker independent of any upstream
        // column's rendered value.
        let label = req
            .messages
            .iter()
            .find(|m| m.role == Role::System)
            .and_then(|m| m.content.first())
            .map(|input| match input {
                Input::Text(text) => text.clone(),
                _ => String::new(),
            })
            .unwrap_or_default();
        self.order.lock().unwrap().push(label.clone());
        self.transcripts.lock().unwrap().push(req.messages.clone());

        if self.fail_on.as_deref() == Some(label.as_str()) {
            return Err(ProviderError::new(ProviderErrorKind::InvalidRequest("stub failure".to_string())).into());
        }

        let chunks = vec![
            Ok(GenerateChunk { delta_text: Some(label.clone()), prompt_tokens: None, completion_tokens: None, finish_reason: None }),
            Ok(GenerateChunk { delta_text: None, prompt_tokens: Some(1), completion_tokens: Some(1), finish_reason: Some("stop".to_string()) }),
        ];
        Ok(Box::pin(stream::iter(chunks)))
    }
}

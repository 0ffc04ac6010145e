//! Process wiring: construct every backend a request dispatch needs,
//! once per process, and hand out a [`DispatchContext`] per request.
//!
//! This is the one place concrete provider/storage/sandbox types are
//! named — everything downstream of [`ServerRuntime::dispatch_context`]
//! only sees the `gentable_interface` trait objects.

use crate::config::ServerConfig;
use gentable_cache::UsageBuffer;
use gentable_core::UsageEvent;
use gentable_engine::DispatchContext;
use gentable_error::{GentableResult, ServerError, ServerErrorKind};
use gentable_interface::{CodeSandbox, Embedder, Reranker, StorageEngine, Streaming};
use gentable_models::{EmbeddingReranker, GeminiClient, GeminiEmbedder};
use gentable_quota::{OrgRegistry, PricingConfig, RequestQuotaManager};
use gentable_sandbox::{ProcessSandbox, SandboxConfig};
use gentable_storage::InMemoryStorage;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// A durable sink for flushed usage events, wired in at bootstrap.
///
/// `gentable_database`'s `PostgresUsageEventRepository` is the production
/// implementation; tests and `DATABASE_URL`-less deployments use a sink
/// that simply drops events (usage is then visible only via the cache
/// layer's TTL window).
pub type UsageSink = Arc<dyn Fn(Vec<UsageEvent>) + Send + Sync>;

/// Every long-lived backend a request dispatch draws on, assembled once
/// at process start.
pub struct ServerRuntime {
    pricing: Arc<PricingConfig>,
    accounts: OrgRegistry,
    usage_buffer: Arc<UsageBuffer>,
    lm_engines: HashMap<String, Arc<dyn Streaming>>,
    embedders: HashMap<String, Arc<dyn Embedder>>,
    rerankers: HashMap<String, Arc<dyn Reranker>>,
    storage: Arc<dyn StorageEngine>,
    sandbox: Arc<dyn CodeSandbox>,
    flusher: Option<tokio::task::JoinHandle<()>>,
}

impl ServerRuntime {
    /// Wire every backend named in `config` and start the background
    /// usage flusher. `usage_sink` persists batches the flusher drains;
    /// pass a no-op sink to run with cache-only usage visibility.
    pub fn bootstrap(config: &ServerConfig, usage_sink: UsageSink) -> GentableResult<Self> {
        let api_key = config.gemini_api_key.clone().ok_or_else(|| {
            ServerError::new(ServerErrorKind::Configuration(
                "GENTABLE_GEMINI_API_KEY is not set".to_string(),
            ))
        })?;

        let lm_client = Arc::new(GeminiClient::new(api_key.clone(), config.gemini_model.clone()));
        let mut lm_engines: HashMap<String, Arc<dyn Streaming>> = HashMap::new();
        lm_engines.insert(config.gemini_model.clone(), lm_client);

        let embedder = Arc::new(GeminiEmbedder::new(
            api_key.clone(),
            config.gemini_embedding_model.clone(),
            config.embedding_dimensions,
        ));
        let mut embedders: HashMap<String, Arc<dyn Embedder>> = HashMap::new();
        embedders.insert(config.gemini_embedding_model.clone(), embedder.clone());

        let mut rerankers: HashMap<String, Arc<dyn Reranker>> = HashMap::new();
        rerankers.insert(config.gemini_embedding_model.clone(), Arc::new(EmbeddingReranker::new(embedder)));

        let storage: Arc<dyn StorageEngine> = Arc::new(InMemoryStorage::new());

        let sandbox_config = SandboxConfig {
            python_path: config.sandbox.python_path.clone(),
            time_budget: Duration::from_secs(config.sandbox.time_budget_secs),
            memory_budget_mib: config.sandbox.memory_budget_mib,
            stdout_cap_bytes: config.sandbox.stdout_cap_bytes,
        };
        let sandbox: Arc<dyn CodeSandbox> = Arc::new(ProcessSandbox::new(sandbox_config));

        let pricing = Arc::new(PricingConfig::load()?);
        let accounts = OrgRegistry::new(pricing.default_plan.clone(), 0.0);
        let usage_buffer = Arc::new(UsageBuffer::new());

        let flush_interval = Duration::from_secs(config.usage_flush_interval_secs);
        let flusher = gentable_cache::spawn_flusher(usage_buffer.clone(), flush_interval, move |batch| {
            let events: Vec<UsageEvent> = batch.into_iter().map(|buffered| buffered.event).collect();
            let sink = usage_sink.clone();
            async move {
                sink(events);
            }
        });

        info!(
            model = %config.gemini_model,
            embedding_model = %config.gemini_embedding_model,
            "gentable runtime bootstrapped"
        );

        Ok(Self {
            pricing,
            accounts,
            usage_buffer,
            lm_engines,
            embedders,
            rerankers,
            storage,
            sandbox,
            flusher: Some(flusher),
        })
    }

    /// Build the per-request collaborators a multi-row execution needs.
    /// `knowledge_embedding_models` maps each knowledge table referenced
    /// by this request to the embedding model that embeds its vector
    /// column, resolved by the caller from the referenced tables' schemas
    /// before dispatch.
    pub fn dispatch_context(
        &self,
        org_id: String,
        project_id: String,
        knowledge_embedding_models: HashMap<String, String>,
    ) -> DispatchContext {
        let quota = Arc::new(RequestQuotaManager::new(
            org_id.clone(),
            project_id.clone(),
            self.accounts.clone(),
            self.pricing.clone(),
            self.usage_buffer.clone(),
        ));

        DispatchContext {
            org_id,
            project_id,
            quota,
            lm_engines: self.lm_engines.clone(),
            embedders: self.embedders.clone(),
            rerankers: self.rerankers.clone(),
            storage: self.storage.clone(),
            sandbox: self.sandbox.clone(),
            knowledge_embedding_models,
        }
    }

    /// Row/media storage backend, for callers that need direct access
    /// outside a dispatch (e.g. table creation, media upload).
    pub fn storage(&self) -> Arc<dyn StorageEngine> {
        self.storage.clone()
    }

    /// Stop the background usage flusher. Any events buffered since the
    /// last flush are not persisted by this call — `process_all` already
    /// pushed them into the buffer, and a production deployment should
    /// drain it one final time before calling this.
    pub async fn shutdown(mut self) {
        if let Some(flusher) = self.flusher.take() {
            flusher.abort();
            let _ = flusher.await;
        }
    }
}

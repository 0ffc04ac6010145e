//! Trait definitions for the generative table execution engine's
//! provider/storage/sandbox seams.
//!
//! Every backend — a language-model client, a storage engine, a code
//! sandbox — is reached only through the traits defined here. Concrete
//! implementations live in `gentable_models`, `gentable_storage`, and
//! `gentable_sandbox`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod quota;
mod sandbox;
mod storage;
mod traits;
mod types;

pub use quota::QuotaManager;
pub use sandbox::{CodeSandbox, SandboxOutput};
pub use storage::{RowFilter, StorageEngine};
pub use traits::{Embedder, Health, JsonMode, LmEngine, Metadata, Reranker, Streaming, TokenCounting, ToolUse};
pub use types::{
    FinishReason, HealthStatus, ModelMetadata, OrderBy, RowPage, SortDirection, ToolDefinition,
    ToolResult,
};

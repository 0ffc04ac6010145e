//! Process bootstrap for the generative table execution core.
//!
//! This crate is the one place concrete provider/storage/sandbox types are
//! named: [`ServerConfig`] loads layered TOML + environment configuration,
//! and [`ServerRuntime`] wires every backend a request dispatch needs and
//! hands out a `gentable_engine::DispatchContext` per request. Everything
//! downstream of `dispatch_context` only sees the `gentable_interface`
//! trait objects. No HTTP/RPC routing lives here — that surface is an
//! explicit external collaborator (spec §1).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod observability;
mod runtime;

pub use config::{ExporterSettings, ObservabilitySettings, SandboxSettings, ServerConfig};
pub use gentable_error::{ServerError, ServerErrorKind};
pub use observability::{init as init_observability, shutdown as shutdown_observability, ObservabilityGuard};
pub use runtime::{ServerRuntime, UsageSink};

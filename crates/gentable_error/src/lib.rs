//! Error types for the generative table execution engine.
//!
//! This crate provides the foundation error types used throughout the
//! gentable workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use gentable_error::{GentableResult, HttpError};
//!
//! fn fetch_data() -> GentableResult<String> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod backend;
mod builder;
mod cache;
mod config;
#[cfg(feature = "database")]
mod database;
mod engine;
mod error;
mod http;
mod json;
mod not_implemented;
mod provider;
mod retry;
mod sandbox;
mod server;
mod storage;

pub use auth::{AuthError, AuthErrorKind};
pub use backend::BackendError;
pub use builder::{BuilderError, BuilderErrorKind};
pub use cache::{CacheError, CacheErrorKind};
pub use config::ConfigError;
#[cfg(feature = "database")]
pub use database::{DatabaseError, DatabaseErrorKind};
pub use engine::{EngineError, EngineErrorKind};
pub use error::{GentableError, GentableErrorKind, GentableResult};
pub use http::HttpError;
pub use json::JsonError;
pub use not_implemented::NotImplementedError;
pub use provider::{ProviderError, ProviderErrorKind, ProviderResult};
pub use retry::RetryableError;
pub use sandbox::{SandboxError, SandboxErrorKind};
pub use server::{ServerError, ServerErrorKind};
pub use storage::{StorageError, StorageErrorKind};

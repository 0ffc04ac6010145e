//! Storage backends for generative tables: media blobs and row persistence.
//!
//! Media (images, audio, documents referenced by a row's `Value::Image` /
//! `Value::Audio` / `Value::Document` cells) is stored content-addressably,
//! separate from row data. Row storage implements `gentable_interface`'s
//! `StorageEngine` trait; this crate ships an in-process reference
//! implementation, `InMemoryStorage`.
//!
//! # Features
//!
//! - **Content-addressable media storage**: Files stored by SHA-256 hash for automatic deduplication
//! - **Pluggable backends**: Trait-based abstraction supports filesystem, S3, etc.
//! - **Atomic operations**: Safe concurrent access with atomic writes
//!
//! # Example
//!
//! ```rust
//! use gentable_storage::{FileSystemStorage, MediaStorage, MediaMetadata, MediaType};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = FileSystemStorage::new("/tmp/media")?;
//! let metadata = MediaMetadata {
//!     media_type: MediaType::Image,
//!     mime_type: "image/png".to_string(),
//!     filename: Some("test.png".to_string()),
//!     width: Some(800),
//!     height: Some(600),
//!     duration_seconds: None,
//! };
//!
//! // Store media
//! let data = vec![0u8; 1024]; // PNG data
//! let reference = storage.store(&data, &metadata).await?;
//!
//! // Retrieve media
//! let retrieved = storage.retrieve(&reference).await?;
//! assert_eq!(data, retrieved);
//! # Ok(())
//! # }
//! ```

mod filesystem;
mod media_type;
mod metadata;
mod reference;
mod row_store;
mod storage;

pub use filesystem::FileSystemStorage;
pub use media_type::MediaType;
pub use metadata::MediaMetadata;
pub use reference::MediaReference;
pub use row_store::InMemoryStorage;
pub use storage::MediaStorage;

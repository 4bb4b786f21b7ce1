//! BucketSync Sync - Directory synchronization engine
//!
//! Provides:
//! - Tree upload through a bounded worker pool with per-file retry
//! - Recursive tree download
//! - The local filesystem adapter
//!
//! ## Modules
//!
//! - [`engine`] - [`DirectorySyncEngine`] orchestrating tree transfers
//! - [`filesystem`] - Local filesystem adapter (atomic writes, streamed MD5)
//! - [`retry`] - Exponential backoff for transient failures

pub mod engine;
pub mod filesystem;
pub mod retry;

pub use engine::{DirectorySyncEngine, TreeDownloadSummary, TreeUploadOptions, TreeUploadSummary};
pub use filesystem::LocalFileSystemAdapter;
pub use retry::RetryPolicy;

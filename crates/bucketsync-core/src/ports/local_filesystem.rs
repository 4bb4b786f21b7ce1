//! Local filesystem port (driven/secondary port)
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific;
//!   use cases wrap them in `SyncError::LocalIo` with the path involved.
//! - Fingerprinting belongs to this port so adapters can stream the file
//!   off the async runtime.

use std::path::Path;

use crate::domain::fingerprint::ContentDigest;
use crate::domain::object::LocalFile;

/// Port trait for local filesystem operations
#[async_trait::async_trait]
pub trait ILocalFileSystem: Send + Sync {
    /// Recursively lists every regular file below `root`
    ///
    /// Relative paths are `/`-separated. The order is deterministic
    /// (sorted by relative path).
    async fn walk_files(&self, root: &Path) -> anyhow::Result<Vec<LocalFile>>;

    /// Reads the entire contents of a file
    async fn read_file(&self, path: &Path) -> anyhow::Result<Vec<u8>>;

    /// Writes data to a file, replacing any previous contents
    ///
    /// Parent directories are NOT automatically created.
    async fn write_file(&self, path: &Path, data: &[u8]) -> anyhow::Result<()>;

    /// Creates a directory and its parents; succeeds if it already exists
    async fn create_dir_all(&self, path: &Path) -> anyhow::Result<()>;

    /// Computes the content digest of a file in fixed-size chunks
    async fn fingerprint(&self, path: &Path) -> anyhow::Result<ContentDigest>;

    /// Returns true if the path exists
    async fn exists(&self, path: &Path) -> anyhow::Result<bool>;
}

//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`ILocalFileSystem`] using `tokio::fs` for async file operations.
//!
//! ## Design Decisions
//!
//! - **Atomic writes**: Uses write-to-temp + rename so a failed download
//!   never leaves a truncated file under the final name.
//! - **Streamed MD5**: Hashing runs on the blocking pool and reads the file
//!   in fixed-size chunks, so large files are never held in memory.
//! - **Symlinks**: Symlinked files are listed; symlinked directories are not
//!   descended into.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bucketsync_core::{
    domain::{ContentDigest, ContentFingerprint, LocalFile},
    ports::ILocalFileSystem,
};
use tracing::{debug, instrument};

/// Suffix of the temporary file used during atomic writes
const TMP_SUFFIX: &str = ".bucketsync-tmp";

// ============================================================================
// LocalFileSystemAdapter struct
// ============================================================================

/// Adapter that bridges the [`ILocalFileSystem`] port to the real filesystem.
///
/// Zero-sized: every operation takes its context from the path arguments.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystemAdapter;

impl LocalFileSystemAdapter {
    /// Create a new `LocalFileSystemAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn tmp_path_for(target: &Path) -> PathBuf {
    let mut p = target.as_os_str().to_owned();
    p.push(TMP_SUFFIX);
    PathBuf::from(p)
}

/// Snapshot of a walked file; names that are not UTF-8 cannot become object
/// names and fail the walk
fn snapshot(root: &Path, path: PathBuf, size: u64) -> anyhow::Result<LocalFile> {
    match LocalFile::new(root, path.clone(), size) {
        Some(file) => Ok(file),
        None => anyhow::bail!("file name is not valid UTF-8: {}", path.display()),
    }
}

// ============================================================================
// ILocalFileSystem implementation
// ============================================================================

#[async_trait::async_trait]
impl ILocalFileSystem for LocalFileSystemAdapter {
    #[instrument(skip(self), fields(root = %root.display()))]
    async fn walk_files(&self, root: &Path) -> anyhow::Result<Vec<LocalFile>> {
        let mut files = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    let size = entry.metadata().await?.len();
                    files.push(snapshot(root, path, size)?);
                } else if file_type.is_symlink() {
                    // Dangling links are skipped along with directory links.
                    match tokio::fs::metadata(&path).await {
                        Ok(meta) if meta.is_file() => {
                            files.push(snapshot(root, path, meta.len())?);
                        }
                        Ok(_) => debug!(path = %path.display(), "not following directory symlink"),
                        Err(e) if e.kind() == ErrorKind::NotFound => {
                            debug!(path = %path.display(), "skipping dangling symlink");
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        debug!(count = files.len(), "walk complete");
        Ok(files)
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn read_file(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
        let data = tokio::fs::read(path).await?;
        debug!(bytes = data.len(), "file read complete");
        Ok(data)
    }

    #[instrument(skip(self, data), fields(path = %path.display(), bytes = data.len()))]
    async fn write_file(&self, path: &Path, data: &[u8]) -> anyhow::Result<()> {
        // Same directory as the target, so the rename stays on one filesystem.
        let tmp_path = tmp_path_for(path);

        debug!(?tmp_path, "writing to temporary file");
        if let Err(e) = tokio::fs::write(&tmp_path, data).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!("write complete");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn create_dir_all(&self, path: &Path) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(path).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn fingerprint(&self, path: &Path) -> anyhow::Result<ContentDigest> {
        let owned = path.to_path_buf();
        let digest = tokio::task::spawn_blocking(move || ContentFingerprint::of_path(&owned)).await??;
        debug!(md5 = %digest, "fingerprint computed");
        Ok(digest)
    }

    async fn exists(&self, path: &Path) -> anyhow::Result<bool> {
        Ok(tokio::fs::try_exists(path).await?)
    }
}

// ============================================================================
// Unit tests
// ============================================================================

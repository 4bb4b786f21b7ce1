//! Shared fixtures for use-case tests

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tempfile::TempDir;

use bucketsync_core::domain::{ContentDigest, ContentFingerprint, LocalFile, ObjectAddress};
use bucketsync_core::ports::ILocalFileSystem;
use bucketsync_core::usecases::TransferObjectUseCase;
use bucketsync_test_utils::MemoryObjectStore;

pub const BUCKET: &str = "test-bucket";

/// Blocking `std::fs` implementation of the filesystem port
pub struct StdFileSystem;

#[async_trait::async_trait]
impl ILocalFileSystem for StdFileSystem {
    async fn walk_files(&self, root: &Path) -> anyhow::Result<Vec<LocalFile>> {
        let mut files = Vec::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let meta = entry.metadata()?;
                if meta.is_dir() {
                    pending.push(entry.path());
                } else if let Some(file) = LocalFile::new(root, entry.path(), meta.len()) {
                    files.push(file);
                }
            }
        }
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }

    async fn read_file(&self, path: &Path) -> anyhow::Result<Vec<u8>> {
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> anyhow::Result<()> {
        std::fs::write(path, data).with_context(|| format!("writing {}", path.display()))
    }

    async fn create_dir_all(&self, path: &Path) -> anyhow::Result<()> {
        Ok(std::fs::create_dir_all(path)?)
    }

    async fn fingerprint(&self, path: &Path) -> anyhow::Result<ContentDigest> {
        Ok(ContentFingerprint::of_path(path)?)
    }

    async fn exists(&self, path: &Path) -> anyhow::Result<bool> {
        Ok(path.exists())
    }
}

/// A store, a transfer use case over it, and a scratch directory
pub struct Harness {
    pub store: Arc<MemoryObjectStore>,
    pub transfer: TransferObjectUseCase,
    pub dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryObjectStore::new());
        let transfer = TransferObjectUseCase::new(store.clone(), Arc::new(StdFileSystem));
        Self {
            store,
            transfer,
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Writes a file below the scratch directory and returns its path
    pub fn local_file(&self, relative: &str, content: &[u8]) -> std::path::PathBuf {
        bucketsync_test_utils::fixtures::write_tree(self.dir.path(), &[(relative, content)])
            .remove(0)
    }
}

pub fn addr(path: &str) -> ObjectAddress {
    ObjectAddress::parse(&format!("gs://{BUCKET}/{path}")).expect("valid test address")
}

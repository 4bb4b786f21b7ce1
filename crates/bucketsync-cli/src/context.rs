//! Explicit application context
//!
//! Commands never reach for global state: `main` loads the configuration,
//! resolves credentials, and hands every command an [`AppContext`] holding
//! the configured adapters.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::debug;

use bucketsync_core::config::Config;
use bucketsync_core::ports::{ILocalFileSystem, IObjectStore};
use bucketsync_core::usecases::{AccessPolicyUseCase, ObjectOpsUseCase, TransferObjectUseCase};
use bucketsync_gcs::{Credentials, GcsObjectStore};
use bucketsync_sync::{DirectorySyncEngine, LocalFileSystemAdapter, RetryPolicy};

/// Loads the configuration named by `--config`, or the default file
///
/// An explicit path must exist and parse; the default path falls back to
/// built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<(Config, PathBuf)> {
    match explicit {
        Some(path) => {
            let config = Config::load(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            Ok((config, path.to_path_buf()))
        }
        None => {
            let path = Config::default_path();
            Ok((Config::load_or_default(&path), path))
        }
    }
}

/// Configuration plus the adapters every remote command needs
pub struct AppContext {
    pub config: Config,
    store: Arc<dyn IObjectStore + Send + Sync>,
    local_filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
}

impl AppContext {
    /// Validates `config`, resolves credentials, and connects the GCS adapter
    pub fn connect(config: Config) -> Result<Self> {
        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            bail!("Invalid configuration: {}", messages.join("; "));
        }

        let credentials = Credentials::from_config(&config.storage)
            .context("Failed to resolve storage credentials")?;
        debug!(endpoint = %config.storage.endpoint, ?credentials, "Connecting to object store");
        let store = GcsObjectStore::from_credentials(&config.storage.endpoint, &credentials);

        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Context over an arbitrary store and the real local filesystem
    pub fn with_store(config: Config, store: Arc<dyn IObjectStore + Send + Sync>) -> Self {
        Self {
            config,
            store,
            local_filesystem: Arc::new(LocalFileSystemAdapter::new()),
        }
    }

    pub fn engine(&self) -> DirectorySyncEngine {
        DirectorySyncEngine::from_config(
            Arc::clone(&self.store),
            Arc::clone(&self.local_filesystem),
            &self.config,
        )
    }

    pub fn transfer(&self) -> TransferObjectUseCase {
        TransferObjectUseCase::new(Arc::clone(&self.store), Arc::clone(&self.local_filesystem))
    }

    pub fn objects(&self) -> ObjectOpsUseCase {
        ObjectOpsUseCase::new(Arc::clone(&self.store))
    }

    pub fn access(&self) -> AccessPolicyUseCase {
        AccessPolicyUseCase::new(Arc::clone(&self.store))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_config(&self.config.transfer)
    }
}

//! Stat, delete and directory-style listing of remote objects

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::domain::address::ObjectAddress;
use crate::domain::errors::SyncError;
use crate::domain::object::RemoteObjectMeta;
use crate::ports::IObjectStore;

/// One level of a pseudo-directory listing
///
/// Names are relative to the listed directory. Directory names carry no
/// trailing slash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirListing {
    pub dirs: Vec<String>,
    pub files: Vec<String>,
}

impl DirListing {
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }
}

/// Use case for the small object operations around transfers
pub struct ObjectOpsUseCase {
    store: Arc<dyn IObjectStore + Send + Sync>,
}

impl ObjectOpsUseCase {
    pub fn new(store: Arc<dyn IObjectStore + Send + Sync>) -> Self {
        Self { store }
    }

    /// Deletes one object; fails with `NotFound` if it does not exist
    pub async fn delete(&self, object: &ObjectAddress) -> Result<(), SyncError> {
        self.store
            .delete_object(object.bucket(), object.path())
            .await
            .map_err(|e| e.annotate("deleting", object.bucket(), object.path()))?;
        debug!("Deleted {}", object);
        Ok(())
    }

    /// Fetches object metadata
    pub async fn stat(&self, object: &ObjectAddress) -> Result<RemoteObjectMeta, SyncError> {
        self.store
            .get_object_meta(object.bucket(), object.path())
            .await
            .map_err(|e| e.annotate("getting attributes of", object.bucket(), object.path()))
    }

    /// Last modification time, or `None` if the object does not exist
    pub async fn last_modified(
        &self,
        object: &ObjectAddress,
    ) -> Result<Option<DateTime<Utc>>, SyncError> {
        match self.stat(object).await {
            Ok(meta) => Ok(meta.last_modified),
            Err(SyncError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Returns true if an object exists at the address, or if it names a
    /// non-empty pseudo-directory
    pub async fn exists(&self, object: &ObjectAddress) -> Result<bool, SyncError> {
        if !object.is_bucket_root() && self.object_present(object).await? {
            return Ok(true);
        }
        Ok(!self.list_dir(object).await?.is_empty())
    }

    /// Lists one level below `dir`
    ///
    /// Both lists come back in listing order. A directory that does not exist
    /// lists as empty.
    pub async fn list_dir(&self, dir: &ObjectAddress) -> Result<DirListing, SyncError> {
        let prefix = dir.child_prefix();
        let listing = self
            .store
            .list_objects(dir.bucket(), &prefix, Some("/"))
            .await
            .map_err(|e| e.annotate("listing", dir.bucket(), &prefix))?;

        let dirs = listing
            .prefixes
            .iter()
            .filter_map(|p| p.strip_prefix(prefix.as_str()))
            .map(|p| p.trim_end_matches('/'))
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        let files = listing
            .objects
            .iter()
            .filter_map(|o| o.name.strip_prefix(prefix.as_str()))
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        Ok(DirListing { dirs, files })
    }

    async fn object_present(&self, object: &ObjectAddress) -> Result<bool, SyncError> {
        match self.stat(object).await {
            Ok(_) => Ok(true),
            Err(SyncError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

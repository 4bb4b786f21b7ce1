//! Single-object transfer use case
//!
//! Uploads go through a staging object so that the destination name only
//! ever holds complete, verified content:
//!
//! 1. evaluate the upload policy, returning early on skip
//! 2. fingerprint the local file
//! 3. write `<dest>-uploading-<md5>` with the predefined ACL
//! 4. read back the staged digest and compare it with the fingerprint
//! 5. server-side copy to the destination, then delete the staging object
//! 6. apply fine-grained grants
//!
//! Downloads write straight to the local path.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::acl::{AccessGrant, PredefinedAcl};
use crate::domain::address::ObjectAddress;
use crate::domain::errors::SyncError;
use crate::domain::fingerprint::ContentDigest;
use crate::domain::object::RemoteObjectMeta;
use crate::domain::policy::{Decision, SkipReason, TransferDecision, UploadPolicy};
use crate::ports::{ILocalFileSystem, IObjectStore};
use crate::usecases::access_policy::AccessPolicyUseCase;

/// Name of the staging object for `destination` holding content `digest`
///
/// Deterministic, so retries of the same content converge on one name.
pub fn staging_name(destination: &str, digest: &ContentDigest) -> String {
    format!("{destination}-uploading-{digest}")
}

/// Options for a single upload
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// When to overwrite an existing destination object
    pub policy: UploadPolicy,
    /// Canned ACL applied when the object is created
    pub predefined_acl: Option<PredefinedAcl>,
    /// Grants applied after the object reaches its final name
    pub grants: Vec<AccessGrant>,
}

/// Result of a successful upload call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The destination now holds content with this digest
    Uploaded { digest: ContentDigest },
    /// Nothing was written
    Skipped(SkipReason),
}

/// Options for a single download
#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadOptions {
    /// Create missing parent directories of the destination path
    pub create_dirs: bool,
    /// Fetch a specific object generation instead of the live one
    pub generation: Option<i64>,
}

/// Use case for moving one file to or from the object store
pub struct TransferObjectUseCase {
    store: Arc<dyn IObjectStore + Send + Sync>,
    local_filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
    access: AccessPolicyUseCase,
}

impl TransferObjectUseCase {
    pub fn new(
        store: Arc<dyn IObjectStore + Send + Sync>,
        local_filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
    ) -> Self {
        Self {
            access: AccessPolicyUseCase::new(Arc::clone(&store)),
            store,
            local_filesystem,
        }
    }

    /// Uploads a local file to `destination`
    ///
    /// On success the destination holds exactly the bytes that were
    /// fingerprinted. If the copy out of staging fails, the staging object is
    /// left in the bucket and [`SyncError::Transfer`] names it.
    #[tracing::instrument(skip(self, destination, options), fields(destination = %destination))]
    pub async fn upload(
        &self,
        source: &Path,
        destination: &ObjectAddress,
        options: &UploadOptions,
    ) -> Result<UploadOutcome, SyncError> {
        if destination.is_bucket_root() {
            return Err(SyncError::InvalidAddress(format!(
                "{destination} names a bucket, not an object"
            )));
        }
        let bucket = destination.bucket();
        let dest_name = destination.path();

        // Step 1: policy check
        let mut local_digest = None;
        if options.policy != UploadPolicy::Always {
            let existing = self.existing_meta(bucket, dest_name).await?;
            if TransferDecision::needs_local_digest(options.policy, existing.as_ref()) {
                local_digest = Some(self.fingerprint(source).await?);
            }
            match TransferDecision::evaluate(options.policy, existing.as_ref(), local_digest.as_ref())
            {
                Decision::Transfer => {}
                Decision::Skip(reason) => {
                    info!(%reason, "Skipping upload of {}", destination);
                    return Ok(UploadOutcome::Skipped(reason));
                }
                Decision::Fail(err) => return Err(err),
            }
        }

        // Step 2: fingerprint
        let digest = match local_digest {
            Some(digest) => digest,
            None => self.fingerprint(source).await?,
        };

        // Step 3: stage
        let data = self
            .local_filesystem
            .read_file(source)
            .await
            .map_err(|e| SyncError::local_io(source, e))?;
        let staging = staging_name(dest_name, &digest);
        debug!(staging = %staging, size = data.len(), "Writing staging object");
        self.store
            .put_object(bucket, &staging, data, options.predefined_acl)
            .await
            .map_err(|e| e.annotate("uploading", bucket, &staging))?;

        // Step 4: verify what the backend stored
        let staged = self
            .store
            .get_object_meta(bucket, &staging)
            .await
            .map_err(|e| e.annotate("verifying", bucket, &staging))?;
        if staged.digest.as_ref() != Some(&digest) {
            return Err(SyncError::Integrity {
                bucket: bucket.to_string(),
                name: staging,
                expected: digest.to_string(),
                actual: staged
                    .digest
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "<none>".to_string()),
            });
        }

        // Step 5: materialize under the final name
        self.store
            .copy_object(bucket, &staging, dest_name, false, options.predefined_acl)
            .await
            .map_err(|e| SyncError::Transfer {
                bucket: bucket.to_string(),
                staging: staging.clone(),
                destination: destination.to_string(),
                source: e.into(),
            })?;
        self.store
            .delete_object(bucket, &staging)
            .await
            .map_err(|e| e.annotate("deleting staging object", bucket, &staging))?;

        // Step 6: fine-grained grants, after the copy
        self.access.apply_grants(destination, &options.grants).await?;

        info!(%digest, "Uploaded {} to {}", source.display(), destination);
        Ok(UploadOutcome::Uploaded { digest })
    }

    /// Downloads `source` to a local file, overwriting it
    #[tracing::instrument(skip(self, source, options), fields(source = %source))]
    pub async fn download(
        &self,
        source: &ObjectAddress,
        destination: &Path,
        options: DownloadOptions,
    ) -> Result<(), SyncError> {
        if options.create_dirs {
            if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
                self.local_filesystem
                    .create_dir_all(parent)
                    .await
                    .map_err(|e| SyncError::local_io(parent, e))?;
            }
        }

        let data = self
            .store
            .get_object(source.bucket(), source.path(), options.generation)
            .await
            .map_err(|e| e.annotate("downloading", source.bucket(), source.path()))?;

        self.local_filesystem
            .write_file(destination, &data)
            .await
            .map_err(|e| SyncError::local_io(destination, e))?;

        debug!(bytes = data.len(), "Downloaded {} to {}", source, destination.display());
        Ok(())
    }

    /// Access to the grant use case sharing this transfer's store
    pub fn access(&self) -> &AccessPolicyUseCase {
        &self.access
    }

    async fn existing_meta(
        &self,
        bucket: &str,
        name: &str,
    ) -> Result<Option<RemoteObjectMeta>, SyncError> {
        match self.store.get_object_meta(bucket, name).await {
            Ok(meta) => Ok(Some(meta)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.annotate("checking", bucket, name)),
        }
    }

    async fn fingerprint(&self, path: &Path) -> Result<ContentDigest, SyncError> {
        self.local_filesystem
            .fingerprint(path)
            .await
            .map_err(|e| SyncError::local_io(path, e))
    }
}

//! Object storage port (driven/secondary port)
//!
//! This module defines the collaborator contract for the remote object store.
//! The production implementation speaks the Google Cloud Storage JSON API,
//! and tests use an in-memory store.
//!
//! ## Design Notes
//!
//! - Methods return [`StoreError`], which only distinguishes "object not
//!   found" from an opaque backend failure. Use cases turn it into a
//!   [`SyncError`] with [`StoreError::annotate`] so that every failure names
//!   the operation, bucket and object it concerns.
//! - Object names are full names within the bucket, never addresses.

use thiserror::Error;

use crate::domain::acl::{AclEntry, PredefinedAcl};
use crate::domain::errors::SyncError;
use crate::domain::object::RemoteObjectMeta;

/// Failure reported by an object store adapter
#[derive(Debug, Error)]
pub enum StoreError {
    /// The object or bucket does not exist
    #[error("object not found")]
    NotFound,

    /// Transport, authorization or server failure
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    /// Attaches the operation, bucket and name to a backend failure
    ///
    /// `operation` reads as a gerund: "uploading", "listing", ...
    pub fn annotate(self, operation: &'static str, bucket: &str, name: &str) -> SyncError {
        match self {
            StoreError::NotFound => SyncError::NotFound {
                bucket: bucket.to_string(),
                name: name.to_string(),
            },
            StoreError::Backend(source) => SyncError::Backend {
                operation,
                bucket: bucket.to_string(),
                name: name.to_string(),
                source,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

/// Result type of every [`IObjectStore`] method
pub type StoreResult<T> = Result<T, StoreError>;

/// One page-merged result of a listing call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    /// Common prefixes (pseudo-directories) when a delimiter was given,
    /// each ending with the delimiter
    pub prefixes: Vec<String>,
    /// Objects directly matched by the listing, with full names
    pub objects: Vec<RemoteObjectMeta>,
}

/// Port trait for the remote object store
///
/// ## Implementation Notes
///
/// - `put_object` must return the metadata the backend recorded, including
///   the digest it computed, so callers can verify the upload.
/// - `list_objects` must follow pagination and return the complete listing.
/// - `set_grants` replaces the whole ACL list of the object.
#[async_trait::async_trait]
pub trait IObjectStore: Send + Sync {
    /// Creates or replaces an object, applying `predefined_acl` at creation
    async fn put_object(
        &self,
        bucket: &str,
        name: &str,
        data: Vec<u8>,
        predefined_acl: Option<PredefinedAcl>,
    ) -> StoreResult<RemoteObjectMeta>;

    /// Fetches object metadata without its content
    async fn get_object_meta(&self, bucket: &str, name: &str) -> StoreResult<RemoteObjectMeta>;

    /// Fetches object content, optionally at a specific generation
    async fn get_object(
        &self,
        bucket: &str,
        name: &str,
        generation: Option<i64>,
    ) -> StoreResult<Vec<u8>>;

    /// Server-side copy within one bucket
    ///
    /// With `preserve_grants` the destination keeps the source's ACL;
    /// otherwise `predefined_acl` (or the bucket default) applies.
    async fn copy_object(
        &self,
        bucket: &str,
        source: &str,
        destination: &str,
        preserve_grants: bool,
        predefined_acl: Option<PredefinedAcl>,
    ) -> StoreResult<RemoteObjectMeta>;

    /// Deletes an object
    async fn delete_object(&self, bucket: &str, name: &str) -> StoreResult<()>;

    /// Lists objects whose names start with `prefix`
    ///
    /// With a delimiter, names containing it after the prefix are rolled up
    /// into [`ObjectListing::prefixes`].
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> StoreResult<ObjectListing>;

    /// Reads the full ACL list of an object
    async fn get_grants(&self, bucket: &str, name: &str) -> StoreResult<Vec<AclEntry>>;

    /// Replaces the full ACL list of an object
    async fn set_grants(&self, bucket: &str, name: &str, entries: &[AclEntry]) -> StoreResult<()>;
}

//! Domain error types
//!
//! [`SyncError`] is the single error taxonomy of the workspace. Backend
//! failures always reach it through [`StoreError::annotate`], which attaches
//! the operation, bucket and object name so a failure can be diagnosed
//! without knowing which storage adapter produced it.
//!
//! [`StoreError::annotate`]: crate::ports::object_store::StoreError::annotate

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::acl::IdType;

/// Errors that can occur while addressing, transferring or sharing objects
#[derive(Debug, Error)]
pub enum SyncError {
    /// The string is not a legal `gs://bucket/path` address
    #[error("Invalid object address: {0}")]
    InvalidAddress(String),

    /// An option or configuration value could not be understood
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The remote object (or bucket) does not exist
    #[error("Not found: gs://{bucket}/{name}")]
    NotFound {
        /// Bucket that was queried
        bucket: String,
        /// Object name within the bucket
        name: String,
    },

    /// The digest stored by the backend differs from the local fingerprint
    #[error("Integrity check failed for gs://{bucket}/{name}: expected MD5 {expected}, found {actual}")]
    Integrity {
        /// Bucket holding the object
        bucket: String,
        /// Object whose digest was checked
        name: String,
        /// Digest computed from the local file
        expected: String,
        /// Digest reported by the backend
        actual: String,
    },

    /// Copying the staging object to its final name failed
    ///
    /// The staging object is left in the bucket for inspection.
    #[error("Failed to copy gs://{bucket}/{staging} to {destination} (staging object kept): {source:#}")]
    Transfer {
        /// Bucket holding both objects
        bucket: String,
        /// Name of the staging object that was left behind
        staging: String,
        /// Final destination address
        destination: String,
        /// Underlying backend failure
        #[source]
        source: anyhow::Error,
    },

    /// More than one ACL entry matches one identity
    #[error("Ambiguous grant on gs://{bucket}/{name}: {count} entries match {id_type} '{id_value}'")]
    AmbiguousGrant {
        /// Bucket holding the object
        bucket: String,
        /// Object whose ACL was read
        name: String,
        /// Identity kind that was looked up
        id_type: IdType,
        /// Identity value that was looked up
        id_value: String,
        /// Number of matching entries found
        count: usize,
    },

    /// An opaque transport or authorization failure from the storage backend
    #[error("Backend error while {operation} gs://{bucket}/{name}: {source:#}")]
    Backend {
        /// What the engine was doing, e.g. "uploading" or "listing"
        operation: &'static str,
        /// Bucket involved
        bucket: String,
        /// Object name or prefix involved
        name: String,
        /// Underlying backend failure
        #[source]
        source: anyhow::Error,
    },

    /// Reading, writing or walking the local filesystem failed
    #[error("Local I/O error on {}: {source:#}", .path.display())]
    LocalIo {
        /// Local path involved
        path: PathBuf,
        /// Underlying filesystem failure
        #[source]
        source: anyhow::Error,
    },

    /// A worker ended without reporting a result for its task
    #[error("Internal error: {0}")]
    Internal(String),

    /// One or more files of a tree transfer failed permanently
    #[error("{0}")]
    Batch(BatchFailure),
}

impl SyncError {
    /// Returns true if repeating the operation may succeed
    ///
    /// Integrity, configuration and address errors describe a logic or data
    /// problem, and an ambiguous ACL will stay ambiguous, so none of them is
    /// worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            SyncError::Integrity { .. }
                | SyncError::Configuration(_)
                | SyncError::InvalidAddress(_)
                | SyncError::AmbiguousGrant { .. }
        )
    }

    /// Wraps a local filesystem failure with the path it concerns
    pub fn local_io(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        SyncError::LocalIo {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Aggregate report of every file that failed during a tree transfer
#[derive(Debug)]
pub struct BatchFailure {
    /// Direction of the transfer ("upload" or "download")
    pub operation: &'static str,
    /// Every failed relative path with its terminal error
    pub failures: Vec<(String, SyncError)>,
}

impl BatchFailure {
    /// Creates a report, sorting entries by relative path
    pub fn new(operation: &'static str, mut failures: Vec<(String, SyncError)>) -> Self {
        failures.sort_by(|a, b| a.0.cmp(&b.0));
        Self {
            operation,
            failures,
        }
    }

    /// Relative paths of every failed file
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|(path, _)| path.as_str())
    }

    /// Terminal error recorded for `path`, if it failed
    pub fn error_for(&self, path: &str) -> Option<&SyncError> {
        self.failures
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, err)| err)
    }

    /// Number of failed files
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if nothing failed
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Failed to {} the following:", self.operation)?;
        writeln!(f)?;
        for (path, err) in &self.failures {
            writeln!(f, "{path}: {err}")?;
        }
        Ok(())
    }
}

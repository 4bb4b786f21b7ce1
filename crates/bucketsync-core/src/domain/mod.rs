//! Domain types and business rules
//!
//! This module contains the core domain types for BucketSync:
//! - Object addresses (`gs://bucket/path`)
//! - Access-control grants, permissions and predefined ACLs
//! - Content fingerprints used for modification detection
//! - Upload policies and the skip/transfer decision
//! - Object and local-file snapshots
//! - The error taxonomy shared by every crate in the workspace

pub mod acl;
pub mod address;
pub mod errors;
pub mod fingerprint;
pub mod object;
pub mod policy;

// Re-export commonly used types
pub use acl::{AccessGrant, AclEntry, IdType, Permission, PredefinedAcl};
pub use address::{ObjectAddress, GS_PREFIX};
pub use errors::{BatchFailure, SyncError};
pub use fingerprint::{ContentDigest, ContentFingerprint};
pub use object::{LocalFile, RemoteObjectMeta};
pub use policy::{Decision, SkipReason, TransferDecision, UploadPolicy};

//! Use cases (interactors) for BucketSync
//!
//! Use cases are thin coordinators that apply domain rules to one object at
//! a time, delegating all I/O to ports.
//!
//! ## Use Cases
//!
//! - [`AccessPolicyUseCase`] - Read and set fine-grained grants on an object
//! - [`TransferObjectUseCase`] - Staged, verified upload and direct download
//! - [`ObjectOpsUseCase`] - Delete, stat and directory-style listing

pub mod access_policy;
pub mod object_ops;
pub mod transfer_object;

pub use access_policy::AccessPolicyUseCase;
pub use object_ops::{DirListing, ObjectOpsUseCase};
pub use transfer_object::{
    staging_name, DownloadOptions, TransferObjectUseCase, UploadOptions, UploadOutcome,
};

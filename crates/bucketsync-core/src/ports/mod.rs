//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the traits the core depends on; their implementations live in
//! adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IObjectStore`] - Object storage backend (GCS JSON API, in-memory fake)
//! - [`ILocalFileSystem`] - Tree walking, file I/O and fingerprinting on disk

pub mod local_filesystem;
pub mod object_store;

pub use local_filesystem::ILocalFileSystem;
pub use object_store::{IObjectStore, ObjectListing, StoreError, StoreResult};

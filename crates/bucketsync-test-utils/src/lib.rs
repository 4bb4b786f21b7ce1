//! Shared test utilities for the BucketSync workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`memory_store`] - [`MemoryObjectStore`], an in-memory `IObjectStore`
//!   with fault injection and write counting
//! - [`fixtures`] - helpers for building local directory trees

pub mod fixtures;
pub mod memory_store;

pub use memory_store::MemoryObjectStore;

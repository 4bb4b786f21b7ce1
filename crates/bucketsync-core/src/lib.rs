//! BucketSync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `ObjectAddress`, `AccessGrant`, `ContentDigest`, `UploadPolicy`
//! - **Use cases** - `TransferObjectUseCase`, `AccessPolicyUseCase`, `ObjectOpsUseCase`
//! - **Port definitions** - Traits for adapters: `IObjectStore`, `ILocalFileSystem`
//! - **Configuration** - YAML-backed `Config` with validation and a builder
//!
//! # Architecture
//!
//! The domain module contains pure rules with no I/O. Ports define the trait
//! interfaces that adapter crates implement (the GCS client, the local
//! filesystem). Use cases orchestrate domain rules through port interfaces
//! for one object at a time; tree-level orchestration lives in
//! `bucketsync-sync`.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;

//! In-memory object store
//!
//! Behaves like a single-region object store with strongly consistent
//! reads: every write bumps a global generation counter, and
//! `last_modified` is derived from it so that tests can tell whether an
//! object was rewritten without sleeping.
//!
//! # Fault injection
//!
//! - [`MemoryObjectStore::fail_puts`] makes the next `n` puts of names
//!   starting with a prefix fail with a backend error
//! - [`MemoryObjectStore::corrupt_puts`] makes the next `n` puts record a
//!   digest that does not match the data
//! - [`MemoryObjectStore::fail_copies`] makes the next `n` copies fail
//! - [`MemoryObjectStore::fail_lists`] makes the next `n` listings fail

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use chrono::{DateTime, Utc};

use bucketsync_core::domain::{AclEntry, ContentDigest, ContentFingerprint, PredefinedAcl, RemoteObjectMeta};
use bucketsync_core::ports::{IObjectStore, ObjectListing, StoreError, StoreResult};

/// Entity that owns every object created in the store
pub const OWNER_ENTITY: &str = "project-owners-000000";

/// Timestamp of generation zero
const EPOCH_SECS: i64 = 1_700_000_000;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    digest: Option<ContentDigest>,
    generation: i64,
    acl: Vec<AclEntry>,
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<(String, String), StoredObject>,
    generation: i64,
    put_failures: Vec<(String, u32)>,
    corrupt_puts: u32,
    copy_failures: u32,
    list_failures: u32,
    put_attempts: HashMap<String, u32>,
    puts: u32,
    writes: HashMap<String, u32>,
    copies: HashMap<String, u32>,
    list_calls: u32,
}

impl State {
    fn next_generation(&mut self) -> i64 {
        self.generation += 1;
        self.generation
    }

    fn take_put_failure(&mut self, name: &str) -> bool {
        for (prefix, remaining) in self.put_failures.iter_mut() {
            if *remaining > 0 && name.starts_with(prefix.as_str()) {
                *remaining -= 1;
                return true;
            }
        }
        false
    }
}

/// An [`IObjectStore`] held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    state: Mutex<State>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // a panicking test thread must not hide the store from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ------------------------------------------------------------------
    // Seeding and inspection
    // ------------------------------------------------------------------

    /// Stores an object directly, bypassing counters and faults
    pub fn insert(&self, bucket: &str, name: &str, data: &[u8]) {
        let mut state = self.lock();
        let generation = state.next_generation();
        state.objects.insert(
            (bucket.to_string(), name.to_string()),
            StoredObject {
                data: data.to_vec(),
                digest: Some(ContentFingerprint::of_bytes(data)),
                generation,
                acl: initial_acl(None),
            },
        );
    }

    /// Stores an object without a digest, like a composite object
    pub fn insert_without_digest(&self, bucket: &str, name: &str, data: &[u8]) {
        self.insert(bucket, name, data);
        if let Some(object) = self.lock().objects.get_mut(&key(bucket, name)) {
            object.digest = None;
        }
    }

    /// Replaces the ACL list of an object verbatim
    pub fn set_raw_acl(&self, bucket: &str, name: &str, entries: Vec<AclEntry>) {
        if let Some(object) = self.lock().objects.get_mut(&key(bucket, name)) {
            object.acl = entries;
        }
    }

    /// ACL list of an object, if it exists
    pub fn raw_acl(&self, bucket: &str, name: &str) -> Option<Vec<AclEntry>> {
        self.lock()
            .objects
            .get(&key(bucket, name))
            .map(|o| o.acl.clone())
    }

    /// Content of an object, if it exists
    pub fn data(&self, bucket: &str, name: &str) -> Option<Vec<u8>> {
        self.lock()
            .objects
            .get(&key(bucket, name))
            .map(|o| o.data.clone())
    }

    /// Every object name in a bucket, sorted
    pub fn names(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .objects
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Total number of successful puts
    pub fn put_count(&self) -> u32 {
        self.lock().puts
    }

    /// Total number of successful copies
    pub fn copy_count(&self) -> u32 {
        self.lock().copies.values().sum()
    }

    /// Number of put calls (failed ones included) for names starting with `prefix`
    pub fn put_attempts(&self, prefix: &str) -> u32 {
        self.lock()
            .put_attempts
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(_, n)| *n)
            .sum()
    }

    /// Number of successful writes (puts and copies) that targeted `name`
    pub fn writes_for(&self, name: &str) -> u32 {
        self.lock().writes.get(name).copied().unwrap_or(0)
    }

    /// Number of successful copies into `name`
    pub fn copies_to(&self, name: &str) -> u32 {
        self.lock().copies.get(name).copied().unwrap_or(0)
    }

    /// Number of listing calls
    pub fn list_calls(&self) -> u32 {
        self.lock().list_calls
    }

    // ------------------------------------------------------------------
    // Fault injection
    // ------------------------------------------------------------------

    /// Fails the next `count` puts of names starting with `prefix`
    pub fn fail_puts(&self, prefix: &str, count: u32) {
        self.lock().put_failures.push((prefix.to_string(), count));
    }

    /// Records a wrong digest for the next `count` puts
    pub fn corrupt_puts(&self, count: u32) {
        self.lock().corrupt_puts += count;
    }

    /// Fails the next `count` copies
    pub fn fail_copies(&self, count: u32) {
        self.lock().copy_failures += count;
    }

    /// Fails the next `count` listings
    pub fn fail_lists(&self, count: u32) {
        self.lock().list_failures += count;
    }
}

fn key(bucket: &str, name: &str) -> (String, String) {
    (bucket.to_string(), name.to_string())
}

fn last_modified(generation: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(EPOCH_SECS + generation, 0)
}

fn meta(name: &str, object: &StoredObject) -> RemoteObjectMeta {
    RemoteObjectMeta {
        name: name.to_string(),
        digest: object.digest.clone(),
        last_modified: last_modified(object.generation),
        generation: Some(object.generation),
        size: object.data.len() as u64,
    }
}

fn other(entity: &str, role: &str) -> AclEntry {
    AclEntry::Other {
        entity: entity.to_string(),
        role: role.to_string(),
    }
}

/// ACL a newly created object receives
fn initial_acl(predefined: Option<PredefinedAcl>) -> Vec<AclEntry> {
    let mut acl = vec![other(OWNER_ENTITY, "OWNER")];
    match predefined {
        Some(PredefinedAcl::PublicRead) => acl.push(other("allUsers", "READER")),
        Some(PredefinedAcl::PublicReadWrite) => acl.push(other("allUsers", "WRITER")),
        Some(PredefinedAcl::AuthenticatedRead) => {
            acl.push(other("allAuthenticatedUsers", "READER"))
        }
        Some(PredefinedAcl::ProjectPrivate) => acl.push(other("project-viewers-000000", "READER")),
        Some(PredefinedAcl::BucketOwnerRead) => acl.push(other("project-editors-000000", "READER")),
        Some(PredefinedAcl::BucketOwnerFullControl) => {
            acl.push(other("project-editors-000000", "OWNER"))
        }
        Some(PredefinedAcl::Private) | None => {}
    }
    acl
}

#[async_trait::async_trait]
impl IObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        name: &str,
        data: Vec<u8>,
        predefined_acl: Option<PredefinedAcl>,
    ) -> StoreResult<RemoteObjectMeta> {
        let mut state = self.lock();
        *state.put_attempts.entry(name.to_string()).or_default() += 1;
        if state.take_put_failure(name) {
            return Err(anyhow!("injected upload failure for {name}").into());
        }

        let mut digest = ContentFingerprint::of_bytes(&data);
        if state.corrupt_puts > 0 {
            state.corrupt_puts -= 1;
            let mut garbled = data.clone();
            garbled.push(0);
            digest = ContentFingerprint::of_bytes(&garbled);
        }

        let generation = state.next_generation();
        let object = StoredObject {
            data,
            digest: Some(digest),
            generation,
            acl: initial_acl(predefined_acl),
        };
        let result = meta(name, &object);
        state.objects.insert(key(bucket, name), object);
        state.puts += 1;
        *state.writes.entry(name.to_string()).or_default() += 1;
        Ok(result)
    }

    async fn get_object_meta(&self, bucket: &str, name: &str) -> StoreResult<RemoteObjectMeta> {
        let state = self.lock();
        state
            .objects
            .get(&key(bucket, name))
            .map(|o| meta(name, o))
            .ok_or(StoreError::NotFound)
    }

    async fn get_object(
        &self,
        bucket: &str,
        name: &str,
        generation: Option<i64>,
    ) -> StoreResult<Vec<u8>> {
        let state = self.lock();
        let object = state
            .objects
            .get(&key(bucket, name))
            .ok_or(StoreError::NotFound)?;
        match generation {
            Some(g) if g != object.generation => Err(StoreError::NotFound),
            _ => Ok(object.data.clone()),
        }
    }

    async fn copy_object(
        &self,
        bucket: &str,
        source: &str,
        destination: &str,
        preserve_grants: bool,
        predefined_acl: Option<PredefinedAcl>,
    ) -> StoreResult<RemoteObjectMeta> {
        let mut state = self.lock();
        if state.copy_failures > 0 {
            state.copy_failures -= 1;
            return Err(anyhow!("injected copy failure for {source}").into());
        }
        let mut copied = state
            .objects
            .get(&key(bucket, source))
            .cloned()
            .ok_or(StoreError::NotFound)?;
        if !preserve_grants {
            copied.acl = initial_acl(predefined_acl);
        }
        copied.generation = state.next_generation();
        let result = meta(destination, &copied);
        state.objects.insert(key(bucket, destination), copied);
        *state.writes.entry(destination.to_string()).or_default() += 1;
        *state.copies.entry(destination.to_string()).or_default() += 1;
        Ok(result)
    }

    async fn delete_object(&self, bucket: &str, name: &str) -> StoreResult<()> {
        self.lock()
            .objects
            .remove(&key(bucket, name))
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: Option<&str>,
    ) -> StoreResult<ObjectListing> {
        let mut state = self.lock();
        state.list_calls += 1;
        if state.list_failures > 0 {
            state.list_failures -= 1;
            return Err(anyhow!("injected listing failure for {prefix}").into());
        }

        let mut prefixes = BTreeSet::new();
        let mut objects = Vec::new();
        for ((b, name), object) in &state.objects {
            if b != bucket {
                continue;
            }
            let Some(rest) = name.strip_prefix(prefix) else {
                continue;
            };
            match delimiter.and_then(|d| rest.find(d).map(|i| i + d.len())) {
                Some(end) => {
                    prefixes.insert(format!("{prefix}{}", &rest[..end]));
                }
                None => objects.push(meta(name, object)),
            }
        }

        Ok(ObjectListing {
            prefixes: prefixes.into_iter().collect(),
            objects,
        })
    }

    async fn get_grants(&self, bucket: &str, name: &str) -> StoreResult<Vec<AclEntry>> {
        self.lock()
            .objects
            .get(&key(bucket, name))
            .map(|o| o.acl.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn set_grants(&self, bucket: &str, name: &str, entries: &[AclEntry]) -> StoreResult<()> {
        let mut state = self.lock();
        let object = state
            .objects
            .get_mut(&key(bucket, name))
            .ok_or(StoreError::NotFound)?;
        object.acl = entries.to_vec();
        Ok(())
    }
}

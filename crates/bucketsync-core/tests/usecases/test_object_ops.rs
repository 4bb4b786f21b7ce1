//! Stat, delete and listing

use std::sync::Arc;

use bucketsync_core::domain::{ObjectAddress, SyncError};
use bucketsync_core::usecases::ObjectOpsUseCase;
use bucketsync_test_utils::MemoryObjectStore;

use crate::common::{addr, BUCKET};

fn setup() -> (Arc<MemoryObjectStore>, ObjectOpsUseCase) {
    let store = Arc::new(MemoryObjectStore::new());
    for name in ["top.txt", "dir/a.txt", "dir/b.txt", "dir/sub/c.txt", "dir/"] {
        store.insert(BUCKET, name, name.as_bytes());
    }
    let ops = ObjectOpsUseCase::new(store.clone());
    (store, ops)
}

#[tokio::test]
async fn test_list_dir_returns_one_level() {
    let (_store, ops) = setup();

    let listing = ops.list_dir(&addr("dir")).await.unwrap();
    assert_eq!(listing.dirs, vec!["sub".to_string()]);
    assert_eq!(listing.files, vec!["a.txt".to_string(), "b.txt".to_string()]);

    let root = ObjectAddress::parse("gs://test-bucket").unwrap();
    let listing = ops.list_dir(&root).await.unwrap();
    assert_eq!(listing.dirs, vec!["dir".to_string()]);
    assert_eq!(listing.files, vec!["top.txt".to_string()]);
}

#[tokio::test]
async fn test_list_missing_dir_is_empty() {
    let (_store, ops) = setup();
    assert!(ops.list_dir(&addr("nothing")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_exists_for_objects_and_directories() {
    let (_store, ops) = setup();
    assert!(ops.exists(&addr("top.txt")).await.unwrap());
    assert!(ops.exists(&addr("dir/sub")).await.unwrap());
    assert!(!ops.exists(&addr("dir/none")).await.unwrap());
}

#[tokio::test]
async fn test_last_modified_and_delete() {
    let (store, ops) = setup();
    let object = addr("dir/a.txt");

    assert!(ops.last_modified(&object).await.unwrap().is_some());
    ops.delete(&object).await.unwrap();
    assert!(store.data(BUCKET, "dir/a.txt").is_none());
    assert_eq!(ops.last_modified(&object).await.unwrap(), None);

    let err = ops.delete(&object).await.unwrap_err();
    assert!(matches!(err, SyncError::NotFound { .. }));
}

#[tokio::test]
async fn test_stat_reports_size_and_digest() {
    let (_store, ops) = setup();
    let meta = ops.stat(&addr("top.txt")).await.unwrap();
    assert_eq!(meta.size, "top.txt".len() as u64);
    assert!(meta.digest.is_some());
    assert_eq!(meta.name, "top.txt");
}

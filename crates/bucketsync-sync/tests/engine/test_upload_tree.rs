//! Tree uploads through the worker pool

use bucketsync_core::domain::{
    AccessGrant, IdType, Permission, PredefinedAcl, SyncError, UploadPolicy,
};
use bucketsync_sync::TreeUploadOptions;
use bucketsync_test_utils::fixtures;

use crate::common::{addr, bucket_root, Harness, BUCKET};

fn with_policy(policy: UploadPolicy) -> TreeUploadOptions {
    TreeUploadOptions {
        policy,
        ..Default::default()
    }
}

/// Writes `count` numbered files, each holding its own name
fn numbered_tree(h: &Harness, count: usize) -> Vec<String> {
    let names = fixtures::numbered_files(count);
    let files: Vec<(&str, &[u8])> = names.iter().map(|n| (n.as_str(), n.as_bytes())).collect();
    h.write_src(&files);
    names
}

#[tokio::test]
async fn test_every_file_is_uploaded_once() {
    let h = Harness::new();
    let names = numbered_tree(&h, 12);

    let summary = h
        .engine
        .upload_tree(h.src_path(), &addr("dst"), &TreeUploadOptions::default())
        .await
        .expect("upload tree");

    assert_eq!(summary.total, 12);
    assert_eq!(summary.transferred, 12);
    assert_eq!(summary.skipped, 0);
    for name in &names {
        let remote = format!("dst/{name}");
        assert_eq!(h.store.data(BUCKET, &remote).unwrap(), name.as_bytes());
        assert_eq!(h.store.copies_to(&remote), 1, "{remote}");
    }
    // Staging objects are all gone.
    assert_eq!(h.store.names(BUCKET).len(), 12);
}

#[tokio::test]
async fn test_worker_count_is_clamped_to_file_count() {
    let h = Harness::new();
    numbered_tree(&h, 4);

    let options = TreeUploadOptions {
        concurrency: 14,
        ..Default::default()
    };
    let summary = h
        .engine
        .upload_tree(h.src_path(), &addr("dst"), &options)
        .await
        .unwrap();
    assert_eq!(summary.workers, 4);
    assert_eq!(h.store.copy_count(), 4);
}

#[tokio::test]
async fn test_worker_count_respects_concurrency() {
    let h = Harness::new();
    numbered_tree(&h, 9);

    let options = TreeUploadOptions {
        concurrency: 2,
        ..Default::default()
    };
    let summary = h
        .engine
        .upload_tree(h.src_path(), &addr("dst"), &options)
        .await
        .unwrap();
    assert_eq!(summary.workers, 2);
    assert_eq!(summary.transferred, 9);
}

#[tokio::test]
async fn test_empty_directory_starts_no_workers() {
    let h = Harness::new();

    let summary = h
        .engine
        .upload_tree(h.src_path(), &addr("dst"), &TreeUploadOptions::default())
        .await
        .unwrap();
    assert_eq!(summary.workers, 0);
    assert_eq!(summary.total, 0);
    assert_eq!(h.store.put_count(), 0);
}

#[tokio::test]
async fn test_transient_failures_are_retried_and_permanent_ones_reported() {
    let h = Harness::new();
    h.write_src(&[
        ("ok.txt", b"fine"),
        ("bad.txt", b"never makes it"),
        ("flaky.txt", b"second time lucky"),
    ]);
    h.store.fail_puts("dst/bad.txt", 5);
    h.store.fail_puts("dst/flaky.txt", 1);

    let err = h
        .engine
        .upload_tree(h.src_path(), &addr("dst"), &TreeUploadOptions::default())
        .await
        .unwrap_err();

    let batch = match &err {
        SyncError::Batch(batch) => batch,
        other => panic!("expected batch failure, got {other}"),
    };
    assert_eq!(batch.paths().collect::<Vec<_>>(), vec!["bad.txt"]);
    assert!(matches!(
        batch.error_for("bad.txt"),
        Some(SyncError::Backend { .. })
    ));
    assert!(err.to_string().starts_with("Failed to upload the following:"));

    assert_eq!(h.store.put_attempts("dst/bad.txt"), 5);
    assert_eq!(h.store.put_attempts("dst/flaky.txt"), 2);
    assert_eq!(h.store.data(BUCKET, "dst/flaky.txt").unwrap(), b"second time lucky");
    assert_eq!(h.store.data(BUCKET, "dst/ok.txt").unwrap(), b"fine");
}

#[tokio::test]
async fn test_integrity_failures_are_not_retried() {
    let h = Harness::new();
    h.write_src(&[("only.txt", b"payload")]);
    h.store.corrupt_puts(1);

    let err = h
        .engine
        .upload_tree(h.src_path(), &addr("dst"), &TreeUploadOptions::default())
        .await
        .unwrap_err();

    match err {
        SyncError::Batch(batch) => assert!(matches!(
            batch.error_for("only.txt"),
            Some(SyncError::Integrity { .. })
        )),
        other => panic!("expected batch failure, got {other}"),
    }
    assert_eq!(h.store.put_attempts("dst/only.txt"), 1);
}

#[tokio::test]
async fn test_if_modified_uses_one_listing_and_skips_unchanged() {
    let h = Harness::new();
    let names = numbered_tree(&h, 6);
    h.engine
        .upload_tree(h.src_path(), &addr("dst"), &TreeUploadOptions::default())
        .await
        .unwrap();

    h.write_src(&[(names[0].as_str(), b"changed")]);
    let lists_before = h.store.list_calls();

    let summary = h
        .engine
        .upload_tree(h.src_path(), &addr("dst"), &with_policy(UploadPolicy::IfModified))
        .await
        .unwrap();

    assert_eq!(h.store.list_calls() - lists_before, 1);
    assert_eq!(summary.transferred, 1);
    assert_eq!(summary.skipped, 5);
    assert_eq!(
        h.store.data(BUCKET, &format!("dst/{}", names[0])).unwrap(),
        b"changed"
    );
    assert_eq!(h.store.writes_for(&format!("dst/{}", names[1])), 1);
}

#[tokio::test]
async fn test_if_new_only_uploads_missing_files() {
    let h = Harness::new();
    h.write_src(&[("old.txt", b"new content"), ("new.txt", b"fresh")]);
    h.store.insert(BUCKET, "dst/old.txt", b"old content");

    let summary = h
        .engine
        .upload_tree(h.src_path(), &addr("dst"), &with_policy(UploadPolicy::IfNew))
        .await
        .unwrap();

    assert_eq!(summary.transferred, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(h.store.data(BUCKET, "dst/old.txt").unwrap(), b"old content");
    assert_eq!(h.store.data(BUCKET, "dst/new.txt").unwrap(), b"fresh");
}

#[tokio::test]
async fn test_listing_failure_aborts_before_any_upload() {
    let h = Harness::new();
    h.write_src(&[("a.txt", b"a")]);
    h.store.fail_lists(1);

    let err = h
        .engine
        .upload_tree(h.src_path(), &addr("dst"), &with_policy(UploadPolicy::IfNew))
        .await
        .unwrap_err();

    assert!(
        matches!(err, SyncError::Backend { operation: "listing", .. }),
        "{err}"
    );
    assert_eq!(h.store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_to_bucket_root() {
    let h = Harness::new();
    h.write_src(&[("top.txt", b"t"), ("nested/inner.txt", b"i")]);

    h.engine
        .upload_tree(h.src_path(), &bucket_root(), &TreeUploadOptions::default())
        .await
        .unwrap();

    assert_eq!(
        h.store.names(BUCKET),
        vec!["nested/inner.txt".to_string(), "top.txt".to_string()]
    );
}

#[tokio::test]
async fn test_grants_apply_to_every_file() {
    let h = Harness::new();
    h.write_src(&[("a.txt", b"a"), ("b/c.txt", b"c")]);
    let options = TreeUploadOptions {
        predefined_acl: Some(PredefinedAcl::PublicRead),
        grants: vec![AccessGrant::new(
            IdType::GroupByDomain,
            "example.com",
            Permission::Read,
        )],
        ..Default::default()
    };

    h.engine
        .upload_tree(h.src_path(), &addr("dst"), &options)
        .await
        .unwrap();

    for name in ["dst/a.txt", "dst/b/c.txt"] {
        let permission = h
            .engine
            .transfer()
            .access()
            .get_acl(&addr(name), IdType::GroupByDomain, "example.com")
            .await
            .unwrap();
        assert_eq!(permission, Permission::Read, "{name}");
    }
}

#[tokio::test]
async fn test_missing_source_directory_is_local_io_error() {
    let h = Harness::new();
    let missing = h.src_path().join("missing");

    let err = h
        .engine
        .upload_tree(&missing, &addr("dst"), &TreeUploadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::LocalIo { .. }));
}

#[tokio::test]
async fn test_files_succeeding_on_retry_count_as_transferred() {
    let h = Harness::new();
    h.write_src(&[("a.txt", b"a"), ("b.txt", b"b")]);
    h.store.fail_puts("dst/a.txt", 1);
    h.store.fail_puts("dst/b.txt", 3);

    let summary = h
        .engine
        .upload_tree(h.src_path(), &addr("dst"), &TreeUploadOptions::default())
        .await
        .expect("retries recover every file");

    assert_eq!(summary.transferred, 2);
    assert_eq!(h.store.put_attempts("dst/a.txt"), 2);
    assert_eq!(h.store.put_attempts("dst/b.txt"), 4);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_non_utf8_file_name_fails_the_upload() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let h = Harness::new();
    h.write_src(&[("ok.txt", b"ok")]);
    std::fs::write(h.src_path().join(OsStr::from_bytes(b"bad\xff.txt")), b"bad").unwrap();

    let err = h
        .engine
        .upload_tree(h.src_path(), &addr("dst"), &TreeUploadOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::LocalIo { .. }), "{err}");
    assert_eq!(h.store.put_count(), 0);
}

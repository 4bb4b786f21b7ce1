//! Upload and download of single objects

use bucketsync_core::domain::{
    AccessGrant, AclEntry, ContentFingerprint, IdType, Permission, PredefinedAcl, SkipReason,
    SyncError, UploadPolicy,
};
use bucketsync_core::ports::IObjectStore;
use bucketsync_core::usecases::{staging_name, DownloadOptions, UploadOptions, UploadOutcome};

use crate::common::{addr, Harness, BUCKET};

fn with_policy(policy: UploadPolicy) -> UploadOptions {
    UploadOptions {
        policy,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_upload_stages_verifies_and_cleans_up() {
    let h = Harness::new();
    let src = h.local_file("a.txt", b"alpha");

    let outcome = h
        .transfer
        .upload(&src, &addr("dir/a.txt"), &UploadOptions::default())
        .await
        .expect("upload");

    let digest = ContentFingerprint::of_bytes(b"alpha");
    assert_eq!(outcome, UploadOutcome::Uploaded { digest: digest.clone() });
    assert_eq!(h.store.data(BUCKET, "dir/a.txt").unwrap(), b"alpha");
    assert_eq!(h.store.names(BUCKET), vec!["dir/a.txt".to_string()]);
    assert_eq!(h.store.put_attempts(&staging_name("dir/a.txt", &digest)), 1);
    assert_eq!(h.store.copies_to("dir/a.txt"), 1);
}

#[tokio::test]
async fn test_staging_name_is_deterministic() {
    let digest = ContentFingerprint::of_bytes(b"x");
    assert_eq!(
        staging_name("p/q.bin", &digest),
        format!("p/q.bin-uploading-{}", digest.as_str())
    );
}

#[tokio::test]
async fn test_if_modified_is_idempotent() {
    let h = Harness::new();
    let src = h.local_file("a.txt", b"same");
    let dest = addr("a.txt");
    let options = with_policy(UploadPolicy::IfModified);

    h.transfer.upload(&src, &dest, &options).await.unwrap();
    let first = h.store.get_object_meta(BUCKET, "a.txt").await.unwrap();

    let outcome = h.transfer.upload(&src, &dest, &options).await.unwrap();
    let second = h.store.get_object_meta(BUCKET, "a.txt").await.unwrap();

    assert_eq!(outcome, UploadOutcome::Skipped(SkipReason::Unmodified));
    assert_eq!(first.last_modified, second.last_modified);
    assert_eq!(h.store.writes_for("a.txt"), 1);
}

#[tokio::test]
async fn test_changed_content_under_if_modified_and_if_new() {
    let h = Harness::new();
    let dest = addr("a.txt");
    let src = h.local_file("a.txt", b"version one");
    h.transfer
        .upload(&src, &dest, &UploadOptions::default())
        .await
        .unwrap();

    let src = h.local_file("a.txt", b"version two");

    let outcome = h
        .transfer
        .upload(&src, &dest, &with_policy(UploadPolicy::IfNew))
        .await
        .unwrap();
    assert_eq!(outcome, UploadOutcome::Skipped(SkipReason::Exists));
    assert_eq!(h.store.data(BUCKET, "a.txt").unwrap(), b"version one");

    let outcome = h
        .transfer
        .upload(&src, &dest, &with_policy(UploadPolicy::IfModified))
        .await
        .unwrap();
    assert!(matches!(outcome, UploadOutcome::Uploaded { .. }));
    assert_eq!(h.store.data(BUCKET, "a.txt").unwrap(), b"version two");
}

#[tokio::test]
async fn test_remote_without_digest_counts_as_modified() {
    let h = Harness::new();
    h.store.insert_without_digest(BUCKET, "a.txt", b"same");
    let src = h.local_file("a.txt", b"same");

    let outcome = h
        .transfer
        .upload(&src, &addr("a.txt"), &with_policy(UploadPolicy::IfModified))
        .await
        .unwrap();
    assert!(matches!(outcome, UploadOutcome::Uploaded { .. }));
}

#[tokio::test]
async fn test_digest_mismatch_is_an_integrity_error() {
    let h = Harness::new();
    let src = h.local_file("a.txt", b"payload");
    h.store.corrupt_puts(1);

    let err = h
        .transfer
        .upload(&src, &addr("a.txt"), &UploadOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Integrity { .. }), "{err}");
    assert!(!err.is_retryable());
    assert!(h.store.data(BUCKET, "a.txt").is_none());
}

#[tokio::test]
async fn test_failed_copy_keeps_staging_object() {
    let h = Harness::new();
    let src = h.local_file("a.txt", b"payload");
    h.store.fail_copies(1);

    let err = h
        .transfer
        .upload(&src, &addr("a.txt"), &UploadOptions::default())
        .await
        .unwrap_err();

    let staging = staging_name("a.txt", &ContentFingerprint::of_bytes(b"payload"));
    match err {
        SyncError::Transfer {
            staging: kept,
            destination,
            ..
        } => {
            assert_eq!(kept, staging);
            assert_eq!(destination, "gs://test-bucket/a.txt");
        }
        other => panic!("expected transfer error, got {other}"),
    }
    assert!(h.store.data(BUCKET, &staging).is_some());
    assert!(h.store.data(BUCKET, "a.txt").is_none());
}

#[tokio::test]
async fn test_backend_failure_is_annotated() {
    let h = Harness::new();
    let src = h.local_file("a.txt", b"payload");
    h.store.fail_puts("a.txt", 1);

    let err = h
        .transfer
        .upload(&src, &addr("a.txt"), &UploadOptions::default())
        .await
        .unwrap_err();

    match &err {
        SyncError::Backend {
            operation, bucket, ..
        } => {
            assert_eq!(*operation, "uploading");
            assert_eq!(bucket, BUCKET);
        }
        other => panic!("expected backend error, got {other}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_grants_and_predefined_acl_are_applied() {
    let h = Harness::new();
    let src = h.local_file("a.txt", b"shared");
    let options = UploadOptions {
        policy: UploadPolicy::Always,
        predefined_acl: Some(PredefinedAcl::PublicRead),
        grants: vec![AccessGrant::new(
            IdType::UserByEmail,
            "alice@example.com",
            Permission::Read,
        )],
    };

    h.transfer.upload(&src, &addr("a.txt"), &options).await.unwrap();

    let acl = h.store.raw_acl(BUCKET, "a.txt").unwrap();
    assert!(acl.contains(&AclEntry::Other {
        entity: "allUsers".to_string(),
        role: "READER".to_string(),
    }));
    let permission = h
        .transfer
        .access()
        .get_acl(&addr("a.txt"), IdType::UserByEmail, "alice@example.com")
        .await
        .unwrap();
    assert_eq!(permission, Permission::Read);
}

#[tokio::test]
async fn test_upload_to_bucket_root_is_rejected() {
    let h = Harness::new();
    let src = h.local_file("a.txt", b"x");
    let root = bucketsync_core::domain::ObjectAddress::parse("gs://test-bucket").unwrap();

    let err = h
        .transfer
        .upload(&src, &root, &UploadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::InvalidAddress(_)));
    assert_eq!(h.store.put_count(), 0);
}

#[tokio::test]
async fn test_missing_local_file_is_local_io_error() {
    let h = Harness::new();
    let missing = h.dir.path().join("nope.txt");

    let err = h
        .transfer
        .upload(&missing, &addr("nope.txt"), &UploadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::LocalIo { .. }));
}

#[tokio::test]
async fn test_download_creates_directories_when_asked() {
    let h = Harness::new();
    h.store.insert(BUCKET, "remote/file.bin", b"contents");
    let dest = h.dir.path().join("deep").join("nested").join("file.bin");

    h.transfer
        .download(
            &addr("remote/file.bin"),
            &dest,
            DownloadOptions {
                create_dirs: true,
                generation: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"contents");
}

#[tokio::test]
async fn test_download_without_create_dirs_fails_on_missing_parent() {
    let h = Harness::new();
    h.store.insert(BUCKET, "f", b"contents");
    let dest = h.dir.path().join("absent").join("f");

    let err = h
        .transfer
        .download(&addr("f"), &dest, DownloadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::LocalIo { .. }));
}

#[tokio::test]
async fn test_download_missing_object_is_not_found() {
    let h = Harness::new();
    let dest = h.dir.path().join("out");

    let err = h
        .transfer
        .download(&addr("ghost"), &dest, DownloadOptions::default())
        .await
        .unwrap_err();
    match err {
        SyncError::NotFound { bucket, name } => {
            assert_eq!(bucket, BUCKET);
            assert_eq!(name, "ghost");
        }
        other => panic!("expected not found, got {other}"),
    }
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_download_specific_generation() {
    let h = Harness::new();
    h.store.insert(BUCKET, "v", b"old");
    let generation = h
        .store
        .get_object_meta(BUCKET, "v")
        .await
        .unwrap()
        .generation;
    let dest = h.dir.path().join("v");

    h.transfer
        .download(
            &addr("v"),
            &dest,
            DownloadOptions {
                create_dirs: false,
                generation,
            },
        )
        .await
        .unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"old");
}

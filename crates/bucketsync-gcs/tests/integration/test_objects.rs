//! Object upload, metadata, download, copy, delete and listing

use bucketsync_core::domain::{ContentFingerprint, PredefinedAcl};
use bucketsync_core::ports::{IObjectStore, StoreError};
use bucketsync_gcs::{GcsClient, GcsObjectStore};
use serde_json::json;
use wiremock::{
    matchers::{body_bytes, body_json, header, method, path, query_param, query_param_is_missing},
    Mock, Request, ResponseTemplate,
};

use crate::common::{object_json, object_path, setup_store, BUCKET, TOKEN};

// ============================================================================
// Upload
// ============================================================================

#[tokio::test]
async fn test_put_object_sends_media_upload() {
    let (server, store) = setup_store().await;
    let data = b"hello world".to_vec();

    Mock::given(method("POST"))
        .and(path(format!("/upload/storage/v1/b/{BUCKET}/o")))
        .and(query_param("uploadType", "media"))
        .and(query_param("name", "dir/a.txt"))
        .and(query_param("predefinedAcl", "publicRead"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(body_bytes(data.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(object_json("dir/a.txt", &data, 7)))
        .expect(1)
        .mount(&server)
        .await;

    let meta = store
        .put_object(BUCKET, "dir/a.txt", data, Some(PredefinedAcl::PublicRead))
        .await
        .expect("upload");

    assert_eq!(meta.name, "dir/a.txt");
    assert_eq!(meta.generation, Some(7));
    assert_eq!(meta.digest, Some(ContentFingerprint::of_bytes(b"hello world")));
}

// ============================================================================
// Metadata and download
// ============================================================================

#[tokio::test]
async fn test_get_object_meta_parses_resource() {
    let (server, store) = setup_store().await;

    Mock::given(method("GET"))
        .and(path(object_path("dir%2Fa.txt")))
        .respond_with(ResponseTemplate::new(200).set_body_json(object_json("dir/a.txt", b"abc", 42)))
        .mount(&server)
        .await;

    let meta = store.get_object_meta(BUCKET, "dir/a.txt").await.unwrap();
    assert_eq!(meta.size, 3);
    assert_eq!(meta.generation, Some(42));
    assert_eq!(
        meta.digest.unwrap().as_str(),
        ContentFingerprint::of_bytes(b"abc").as_str()
    );
    assert_eq!(
        meta.last_modified.unwrap().to_rfc3339(),
        "2026-01-15T10:00:00+00:00"
    );
}

#[tokio::test]
async fn test_missing_object_maps_to_not_found() {
    let (server, store) = setup_store().await;

    Mock::given(method("GET"))
        .and(path(object_path("ghost")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "No such object: test-bucket/ghost"}
        })))
        .mount(&server)
        .await;

    let err = store.get_object_meta(BUCKET, "ghost").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[tokio::test]
async fn test_get_object_requests_media_and_generation() {
    let (server, store) = setup_store().await;

    Mock::given(method("GET"))
        .and(path(object_path("v.bin")))
        .and(query_param("alt", "media"))
        .and(query_param("generation", "1700000001"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"old bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let data = store
        .get_object(BUCKET, "v.bin", Some(1_700_000_001))
        .await
        .unwrap();
    assert_eq!(data, b"old bytes");
}

// ============================================================================
// Copy and delete
// ============================================================================

#[tokio::test]
async fn test_copy_applies_destination_predefined_acl() {
    let (server, store) = setup_store().await;
    let copy_path = format!(
        "/storage/v1/b/{BUCKET}/o/a.txt-uploading-x/copyTo/b/{BUCKET}/o/a.txt"
    );

    Mock::given(method("POST"))
        .and(path(copy_path))
        .and(query_param("destinationPredefinedAcl", "private"))
        .respond_with(ResponseTemplate::new(200).set_body_json(object_json("a.txt", b"a", 3)))
        .expect(1)
        .mount(&server)
        .await;

    let meta = store
        .copy_object(BUCKET, "a.txt-uploading-x", "a.txt", false, Some(PredefinedAcl::Private))
        .await
        .unwrap();
    assert_eq!(meta.name, "a.txt");
}

#[tokio::test]
async fn test_copy_preserving_grants_sends_source_acl() {
    let (server, store) = setup_store().await;
    let acl = json!([{"entity": "user-bob@example.com", "role": "READER"}]);

    let mut source = object_json("src", b"s", 1);
    source["acl"] = acl.clone();
    Mock::given(method("GET"))
        .and(path(object_path("src")))
        .and(query_param("projection", "full"))
        .respond_with(ResponseTemplate::new(200).set_body_json(source))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/storage/v1/b/{BUCKET}/o/src/copyTo/b/{BUCKET}/o/dst")))
        .and(body_json(json!({ "acl": acl })))
        .respond_with(ResponseTemplate::new(200).set_body_json(object_json("dst", b"s", 2)))
        .expect(1)
        .mount(&server)
        .await;

    store
        .copy_object(BUCKET, "src", "dst", true, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_delete_and_server_errors() {
    let (server, store) = setup_store().await;

    Mock::given(method("DELETE"))
        .and(path(object_path("gone")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(object_path("busy")))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    store.delete_object(BUCKET, "gone").await.unwrap();

    let err = store.delete_object(BUCKET, "busy").await.unwrap_err();
    assert!(!err.is_not_found());
    assert!(err.to_string().contains("503"), "{err}");
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_follows_page_tokens() {
    let (server, store) = setup_store().await;
    let list_path = format!("/storage/v1/b/{BUCKET}/o");

    Mock::given(method("GET"))
        .and(path(list_path.as_str()))
        .and(query_param("prefix", "dir/"))
        .and(query_param("delimiter", "/"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [object_json("dir/a.txt", b"a", 1)],
            "prefixes": ["dir/sub/"],
            "nextPageToken": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(list_path.as_str()))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [object_json("dir/b.txt", b"b", 2)],
            "prefixes": ["dir/other/"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let listing = store.list_objects(BUCKET, "dir/", Some("/")).await.unwrap();

    let names: Vec<&str> = listing.objects.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["dir/a.txt", "dir/b.txt"]);
    assert_eq!(listing.prefixes, vec!["dir/sub/", "dir/other/"]);
}

#[tokio::test]
async fn test_empty_bucket_lists_nothing() {
    let (server, store) = setup_store().await;

    Mock::given(method("GET"))
        .and(path(format!("/storage/v1/b/{BUCKET}/o")))
        .and(query_param_is_missing("prefix"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"kind": "storage#objects"})))
        .mount(&server)
        .await;

    let listing = store.list_objects(BUCKET, "", None).await.unwrap();
    assert!(listing.objects.is_empty());
    assert!(listing.prefixes.is_empty());
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_anonymous_client_sends_no_authorization() {
    let server = wiremock::MockServer::start().await;
    let store = GcsObjectStore::new(GcsClient::with_base_url(None, server.uri()));

    Mock::given(method("GET"))
        .and(path(object_path("public.txt")))
        .and(|req: &Request| !req.headers.contains_key("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(object_json("public.txt", b"p", 1)))
        .expect(1)
        .mount(&server)
        .await;

    store.get_object_meta(BUCKET, "public.txt").await.unwrap();
}

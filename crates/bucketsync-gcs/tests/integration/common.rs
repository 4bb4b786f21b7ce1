//! Shared helpers for JSON API integration tests

use bucketsync_core::domain::ContentFingerprint;
use bucketsync_gcs::{GcsClient, GcsObjectStore};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const BUCKET: &str = "test-bucket";
pub const TOKEN: &str = "test-access-token";

/// Starts a mock server and returns a store authenticated against it
pub async fn setup_store() -> (MockServer, GcsObjectStore) {
    let server = MockServer::start().await;
    let store = GcsObjectStore::new(GcsClient::with_base_url(Some(TOKEN.to_string()), server.uri()));
    (server, store)
}

/// Object resource as the JSON API returns it
pub fn object_json(name: &str, data: &[u8], generation: i64) -> Value {
    json!({
        "kind": "storage#object",
        "bucket": BUCKET,
        "name": name,
        "md5Hash": ContentFingerprint::of_bytes(data).to_base64(),
        "size": data.len().to_string(),
        "generation": generation.to_string(),
        "updated": "2026-01-15T10:00:00.000Z",
    })
}

/// `/storage/v1/b/<bucket>/o/<encoded name>`
pub fn object_path(encoded_name: &str) -> String {
    format!("/storage/v1/b/{BUCKET}/o/{encoded_name}")
}

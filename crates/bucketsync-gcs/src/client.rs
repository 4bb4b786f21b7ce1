//! Cloud Storage JSON API client
//!
//! Handles authentication headers, URL construction, and mapping of
//! non-success statuses to [`GcsError`].
//!
//! Object names are sent as single path segments, so `/` inside a name is
//! percent-encoded (`dir/a.txt` becomes `dir%2Fa.txt`) as the JSON API
//! requires.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bucketsync_gcs::client::GcsClient;
//!
//! # async fn example() -> Result<(), bucketsync_gcs::GcsError> {
//! let client = GcsClient::new(Some("access-token-here".to_string()));
//! let url = client.object_url("my-bucket", "dir/file.txt")?;
//! let meta: serde_json::Value = client.get_json(url).await?;
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::GcsError;

/// Public Cloud Storage endpoint
pub const GCS_BASE_URL: &str = "https://storage.googleapis.com";

/// HTTP client for Cloud Storage JSON API calls
#[derive(Debug, Clone)]
pub struct GcsClient {
    /// The underlying HTTP client
    client: Client,
    /// Scheme, host and optional path prefix of the API
    base_url: String,
    /// Bearer token; `None` sends unauthenticated requests
    access_token: Option<String>,
}

impl GcsClient {
    /// Creates a client for the public endpoint
    pub fn new(access_token: Option<String>) -> Self {
        Self::with_base_url(access_token, GCS_BASE_URL)
    }

    /// Creates a client for a custom endpoint (emulators, tests)
    pub fn with_base_url(access_token: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        }
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns true if requests carry a bearer token
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    // ========================================================================
    // URL construction
    // ========================================================================

    /// Builds `<base>/<segments...>` with each segment percent-encoded
    pub fn url(&self, segments: &[&str]) -> Result<Url, GcsError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| GcsError::InvalidResponse(format!("base URL {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `/storage/v1/b/<bucket>/o`
    pub fn objects_url(&self, bucket: &str) -> Result<Url, GcsError> {
        self.url(&["storage", "v1", "b", bucket, "o"])
    }

    /// `/storage/v1/b/<bucket>/o/<name>`
    pub fn object_url(&self, bucket: &str, name: &str) -> Result<Url, GcsError> {
        self.url(&["storage", "v1", "b", bucket, "o", name])
    }

    /// `/upload/storage/v1/b/<bucket>/o`
    pub fn upload_url(&self, bucket: &str) -> Result<Url, GcsError> {
        self.url(&["upload", "storage", "v1", "b", bucket, "o"])
    }

    /// `/storage/v1/b/<bucket>/o/<source>/copyTo/b/<bucket>/o/<destination>`
    pub fn copy_url(&self, bucket: &str, source: &str, destination: &str) -> Result<Url, GcsError> {
        self.url(&[
            "storage", "v1", "b", bucket, "o", source, "copyTo", "b", bucket, "o", destination,
        ])
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Creates a request builder, adding the Authorization header when a
    /// token is configured
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and turns non-success statuses into [`GcsError`]
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, GcsError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "request failed");
        Err(GcsError::from_status(status, body))
    }

    /// Sends a request and parses the JSON response body
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, GcsError> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GcsError::InvalidResponse(e.to_string()))
    }

    /// `GET` a JSON resource
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GcsError> {
        self.send_json(self.request(Method::GET, url)).await
    }
}

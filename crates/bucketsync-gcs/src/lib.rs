//! BucketSync GCS - Google Cloud Storage adapter
//!
//! Provides:
//! - A thin authenticated client for the Cloud Storage JSON API
//! - [`GcsObjectStore`], the [`IObjectStore`](bucketsync_core::ports::IObjectStore)
//!   implementation used by the CLI
//! - Credential discovery from a token file, the environment, or anonymous access
//!
//! ## Modules
//!
//! - [`acl`] - Mapping between grants and JSON API ACL entities
//! - [`client`] - HTTP client, URL construction and status mapping
//! - [`credentials`] - Access token discovery
//! - [`store`] - Object store port implementation

pub mod acl;
pub mod client;
pub mod credentials;
pub mod store;

pub use client::GcsClient;
pub use credentials::Credentials;
pub use store::GcsObjectStore;

use bucketsync_core::ports::StoreError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the Cloud Storage JSON API
#[derive(Debug, Error)]
pub enum GcsError {
    /// Missing or rejected credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The credentials lack permission for the request (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The bucket or object does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded (429)
    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// A server-side error occurred (5xx)
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Any other non-success status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl GcsError {
    /// Classifies a non-success status with the response body as message
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let message = error_message(&body).unwrap_or(body);
        match status {
            StatusCode::UNAUTHORIZED => GcsError::Unauthorized(message),
            StatusCode::FORBIDDEN => GcsError::Forbidden(message),
            StatusCode::NOT_FOUND => GcsError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => GcsError::TooManyRequests(message),
            s if s.is_server_error() => GcsError::ServerError {
                status: s.as_u16(),
                message,
            },
            s => GcsError::Http {
                status: s.as_u16(),
                message,
            },
        }
    }
}

/// Pulls `error.message` out of a JSON API error body
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

impl From<GcsError> for StoreError {
    fn from(err: GcsError) -> Self {
        match err {
            GcsError::NotFound(_) => StoreError::NotFound,
            other => StoreError::Backend(anyhow::Error::new(other)),
        }
    }
}

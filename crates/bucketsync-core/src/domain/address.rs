//! Object addresses of the form `gs://bucket/path`

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::SyncError;

/// The only recognized scheme prefix, matched case-insensitively
pub const GS_PREFIX: &str = "gs://";

/// A validated `gs://bucket/path` identifier naming one object (or prefix)
///
/// The path never begins or ends with `/`. Leading and trailing slash runs are
/// stripped on parse, but doubled slashes *inside* the path are kept verbatim:
///
/// ```
/// use bucketsync_core::domain::ObjectAddress;
///
/// let addr = ObjectAddress::parse("gs://bucket///path1//path2///").unwrap();
/// assert_eq!(addr.bucket(), "bucket");
/// assert_eq!(addr.path(), "path1//path2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectAddress {
    bucket: String,
    path: String,
}

impl ObjectAddress {
    /// Parses an address, failing with [`SyncError::InvalidAddress`] if it is
    /// not well formed
    pub fn parse(url: &str) -> Result<Self, SyncError> {
        let rest = strip_scheme(url).ok_or_else(|| SyncError::InvalidAddress(url.to_string()))?;
        let (bucket, path) = rest.split_once('/').unwrap_or((rest, ""));
        Ok(Self {
            bucket: bucket.to_string(),
            path: path.trim_matches('/').to_string(),
        })
    }

    /// Returns true if `url` would parse
    pub fn is_valid(url: &str) -> bool {
        strip_scheme(url).is_some()
    }

    /// Builds an address from already-split parts
    ///
    /// The path is normalized the same way [`ObjectAddress::parse`] does.
    pub fn new(bucket: impl Into<String>, path: &str) -> Result<Self, SyncError> {
        let bucket = bucket.into();
        if !bucket.chars().next().is_some_and(|c| c.is_alphanumeric()) || bucket.contains('/') {
            return Err(SyncError::InvalidAddress(format!("{GS_PREFIX}{bucket}/{path}")));
        }
        Ok(Self {
            bucket,
            path: path.trim_matches('/').to_string(),
        })
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object path inside the bucket; empty for a bucket root
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true if the address names a bucket root
    pub fn is_bucket_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Appends one relative component (which may itself contain `/`)
    pub fn join(&self, component: &str) -> Self {
        let component = component.trim_matches('/');
        let path = match (self.path.is_empty(), component.is_empty()) {
            (true, _) => component.to_string(),
            (false, true) => self.path.clone(),
            (false, false) => format!("{}/{}", self.path, component),
        };
        Self {
            bucket: self.bucket.clone(),
            path,
        }
    }

    /// Listing prefix that selects everything below this address
    ///
    /// Empty for a bucket root, otherwise the path followed by `/`.
    pub fn child_prefix(&self) -> String {
        if self.path.is_empty() {
            String::new()
        } else {
            format!("{}/", self.path)
        }
    }
}

/// Returns the part after the scheme if the remainder is non-empty and starts
/// with an alphanumeric character
fn strip_scheme(url: &str) -> Option<&str> {
    let scheme = url.get(..GS_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(GS_PREFIX) {
        return None;
    }
    let rest = &url[GS_PREFIX.len()..];
    rest.chars()
        .next()
        .filter(|c| c.is_alphanumeric())
        .map(|_| rest)
}

impl Display for ObjectAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{GS_PREFIX}{}", self.bucket)
        } else {
            write!(f, "{GS_PREFIX}{}/{}", self.bucket, self.path)
        }
    }
}

impl FromStr for ObjectAddress {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ObjectAddress {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ObjectAddress> for String {
    fn from(addr: ObjectAddress) -> Self {
        addr.to_string()
    }
}

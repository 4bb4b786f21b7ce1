//! Snapshots of local files and remote objects

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fingerprint::ContentDigest;

/// A regular file discovered by walking a local tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFile {
    /// Absolute (or root-joined) path on disk
    pub absolute_path: PathBuf,
    /// Path relative to the walk root, always `/`-separated
    pub relative_path: String,
    /// File size at the time of the walk
    pub size_bytes: u64,
}

impl LocalFile {
    /// Creates a snapshot, deriving the POSIX relative path from `root`
    ///
    /// Returns `None` if `absolute_path` is not below `root`.
    pub fn new(root: &Path, absolute_path: PathBuf, size_bytes: u64) -> Option<Self> {
        let relative = absolute_path.strip_prefix(root).ok()?;
        let relative_path = posix_relative(relative)?;
        Some(Self {
            absolute_path,
            relative_path,
            size_bytes,
        })
    }
}

/// Joins the normal components of a relative path with `/`
fn posix_relative(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Metadata of one remote object, fetched on demand and never cached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObjectMeta {
    /// Full object name within its bucket
    pub name: String,
    /// Content digest, absent for composite objects
    pub digest: Option<ContentDigest>,
    /// Last modification time reported by the backend
    pub last_modified: Option<DateTime<Utc>>,
    /// Generation number, if the backend versions objects
    pub generation: Option<i64>,
    /// Object size in bytes
    pub size: u64,
}

impl RemoteObjectMeta {
    /// Minimal snapshot with only a name and digest
    pub fn new(name: impl Into<String>, digest: Option<ContentDigest>) -> Self {
        Self {
            name: name.into(),
            digest,
            last_modified: None,
            generation: None,
            size: 0,
        }
    }
}

//! Content fingerprints for modification detection
//!
//! Object stores report an MD5 digest for every non-composite object, so the
//! fingerprint of a local file is its MD5 digest. It is compared for exact
//! equality with the digest reported by the backend.

use std::fmt::{self, Display, Formatter};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Size of the chunks a file is hashed in
pub const CHUNK_SIZE: usize = 64 * 1024;

/// An MD5 digest in lowercase hexadecimal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Parses a 32-character hex digest (any case)
    pub fn from_hex(hex_digest: &str) -> Option<Self> {
        let bytes = hex::decode(hex_digest.trim()).ok()?;
        (bytes.len() == 16).then(|| Self::from_bytes(&bytes))
    }

    /// Parses a base64-encoded digest, as reported in `md5Hash` fields
    pub fn from_base64(encoded: &str) -> Option<Self> {
        let bytes = BASE64.decode(encoded.trim()).ok()?;
        (bytes.len() == 16).then(|| Self::from_bytes(&bytes))
    }

    /// Parses an ETag, which for simple objects is the quoted hex digest
    ///
    /// Returns `None` for ETags that are not plain MD5 digests (composite or
    /// multipart objects), which callers treat as "differs".
    pub fn from_etag(etag: &str) -> Option<Self> {
        Self::from_hex(etag.trim().trim_matches('"'))
    }

    /// Wraps raw digest bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        // always valid: constructed from bytes or validated hex
        BASE64.encode(hex::decode(&self.0).unwrap_or_default())
    }

    pub fn to_etag(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl Display for ContentDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes content digests of local data
pub struct ContentFingerprint;

impl ContentFingerprint {
    /// Digests everything readable from `reader`, in fixed-size chunks
    pub fn of_reader<R: Read>(mut reader: R) -> io::Result<ContentDigest> {
        let mut hasher = Md5::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
        }
        Ok(ContentDigest::from_bytes(&hasher.finalize()))
    }

    /// Digests a file on disk
    ///
    /// Blocking; async callers should run it on a blocking thread.
    pub fn of_path(path: &Path) -> io::Result<ContentDigest> {
        Self::of_reader(File::open(path)?)
    }

    /// Digests an in-memory buffer
    pub fn of_bytes(data: &[u8]) -> ContentDigest {
        ContentDigest::from_bytes(&Md5::digest(data))
    }
}

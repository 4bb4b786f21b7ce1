//! Upload policies and the skip/transfer decision

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::SyncError;
use super::fingerprint::ContentDigest;
use super::object::RemoteObjectMeta;

/// When an upload should overwrite the destination object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadPolicy {
    /// Always transfer
    #[default]
    Always,
    /// Transfer only if no object exists at the destination name
    IfNew,
    /// Transfer if no object exists or its digest differs from the local one
    IfModified,
}

impl UploadPolicy {
    /// Decodes the numeric policy codes (1 = always, 2 = if-new, 3 = if-modified)
    pub fn from_code(code: u8) -> Result<Self, SyncError> {
        match code {
            1 => Ok(UploadPolicy::Always),
            2 => Ok(UploadPolicy::IfNew),
            3 => Ok(UploadPolicy::IfModified),
            other => Err(SyncError::Configuration(format!(
                "unknown upload policy code {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadPolicy::Always => "always",
            UploadPolicy::IfNew => "if-new",
            UploadPolicy::IfModified => "if-modified",
        }
    }
}

impl Display for UploadPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadPolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "always" | "1" => Ok(UploadPolicy::Always),
            "if-new" | "ifnew" | "2" => Ok(UploadPolicy::IfNew),
            "if-modified" | "ifmodified" | "3" => Ok(UploadPolicy::IfModified),
            _ => Err(SyncError::Configuration(format!(
                "unknown upload policy '{s}'"
            ))),
        }
    }
}

/// Why a transfer was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// An object already exists and the policy is [`UploadPolicy::IfNew`]
    Exists,
    /// The remote digest matches the local fingerprint
    Unmodified,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Exists => f.write_str("already exists"),
            SkipReason::Unmodified => f.write_str("unmodified"),
        }
    }
}

/// Outcome of evaluating an upload policy for one candidate
#[derive(Debug)]
pub enum Decision {
    Skip(SkipReason),
    Transfer,
    Fail(SyncError),
}

impl Decision {
    pub fn is_transfer(&self) -> bool {
        matches!(self, Decision::Transfer)
    }
}

/// Stateless skip/overwrite rule shared by single-object uploads and the
/// bulk-listing filter of tree uploads
pub struct TransferDecision;

impl TransferDecision {
    /// Returns true if [`TransferDecision::evaluate`] needs the local digest
    /// to decide, so callers can avoid hashing files needlessly
    pub fn needs_local_digest(policy: UploadPolicy, existing: Option<&RemoteObjectMeta>) -> bool {
        policy == UploadPolicy::IfModified && existing.is_some()
    }

    /// Decides whether a file should be transferred
    ///
    /// `existing` is the remote snapshot at the destination name, if any. A
    /// remote object without a digest always counts as modified.
    pub fn evaluate(
        policy: UploadPolicy,
        existing: Option<&RemoteObjectMeta>,
        local_digest: Option<&ContentDigest>,
    ) -> Decision {
        let Some(existing) = existing else {
            return Decision::Transfer;
        };
        match policy {
            UploadPolicy::Always => Decision::Transfer,
            UploadPolicy::IfNew => Decision::Skip(SkipReason::Exists),
            UploadPolicy::IfModified => {
                let Some(local) = local_digest else {
                    return Decision::Fail(SyncError::Configuration(format!(
                        "if-modified comparison of '{}' requires a local digest",
                        existing.name
                    )));
                };
                match &existing.digest {
                    Some(remote) if remote == local => Decision::Skip(SkipReason::Unmodified),
                    _ => Decision::Transfer,
                }
            }
        }
    }
}

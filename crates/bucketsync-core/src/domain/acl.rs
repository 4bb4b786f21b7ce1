//! Access-control types
//!
//! Objects carry two layers of permissions:
//!
//! - a **predefined ACL** ([`PredefinedAcl`]), a canned "base coat" applied
//!   when the object is created, and
//! - **fine-grained grants** ([`AccessGrant`]), one permission per identity,
//!   additive with every other grant on the object.
//!
//! Backend ACL lists may contain entries that are not one of the five
//! identity kinds we manage (for example `allUsers` after a `public-read`
//! predefined ACL). Those are kept as [`AclEntry::Other`] so that rewriting
//! the list never drops them.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::SyncError;

// ============================================================================
// IdType
// ============================================================================

/// Kinds of identifiers that fine-grained grants can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdType {
    /// A whole domain, e.g. `example.com`
    GroupByDomain,
    /// A group addressed by its email
    GroupByEmail,
    /// A group addressed by its canonical id
    GroupById,
    /// A user addressed by email
    UserByEmail,
    /// A user addressed by canonical id
    UserById,
}

impl IdType {
    /// All identity kinds, in declaration order
    pub const ALL: [IdType; 5] = [
        IdType::GroupByDomain,
        IdType::GroupByEmail,
        IdType::GroupById,
        IdType::UserByEmail,
        IdType::UserById,
    ];

    /// Canonical name, e.g. `UserByEmail`
    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::GroupByDomain => "GroupByDomain",
            IdType::GroupByEmail => "GroupByEmail",
            IdType::GroupById => "GroupById",
            IdType::UserByEmail => "UserByEmail",
            IdType::UserById => "UserById",
        }
    }
}

impl Display for IdType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdType {
    type Err = SyncError;

    /// Accepts the canonical name or a kebab/snake-case spelling
    /// (`user-by-email`, `user_by_email`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        IdType::ALL
            .into_iter()
            .find(|t| t.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| SyncError::Configuration(format!("unknown identity type '{s}'")))
    }
}

// ============================================================================
// Permission
// ============================================================================

/// Fine-grained permission levels that may be set per identity on an object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// No grant for this identity
    #[default]
    Empty,
    /// Read the object's data and metadata
    Read,
    /// Write access
    Write,
    /// Full control, including changing the ACL
    Owner,
}

impl Permission {
    /// Canonical name (`EMPTY`, `READ`, `WRITE`, `FULL_CONTROL`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Empty => "EMPTY",
            Permission::Read => "READ",
            Permission::Write => "WRITE",
            Permission::Owner => "FULL_CONTROL",
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "empty" | "none" => Ok(Permission::Empty),
            "read" | "reader" => Ok(Permission::Read),
            "write" | "writer" => Ok(Permission::Write),
            "owner" | "full_control" | "full-control" => Ok(Permission::Owner),
            _ => Err(SyncError::Configuration(format!("unknown permission '{s}'"))),
        }
    }
}

// ============================================================================
// PredefinedAcl
// ============================================================================

/// Canned ACLs that provide a baseline of permissions for a new object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PredefinedAcl {
    AuthenticatedRead,
    BucketOwnerFullControl,
    BucketOwnerRead,
    Private,
    ProjectPrivate,
    PublicRead,
    PublicReadWrite,
}

impl PredefinedAcl {
    /// All predefined ACLs
    pub const ALL: [PredefinedAcl; 7] = [
        PredefinedAcl::AuthenticatedRead,
        PredefinedAcl::BucketOwnerFullControl,
        PredefinedAcl::BucketOwnerRead,
        PredefinedAcl::Private,
        PredefinedAcl::ProjectPrivate,
        PredefinedAcl::PublicRead,
        PredefinedAcl::PublicReadWrite,
    ];

    /// Canned ACL name, e.g. `public-read`
    pub fn as_str(&self) -> &'static str {
        match self {
            PredefinedAcl::AuthenticatedRead => "authenticated-read",
            PredefinedAcl::BucketOwnerFullControl => "bucket-owner-full-control",
            PredefinedAcl::BucketOwnerRead => "bucket-owner-read",
            PredefinedAcl::Private => "private",
            PredefinedAcl::ProjectPrivate => "project-private",
            PredefinedAcl::PublicRead => "public-read",
            PredefinedAcl::PublicReadWrite => "public-read-write",
        }
    }
}

impl Display for PredefinedAcl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PredefinedAcl {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_ascii_lowercase().replace('_', "-");
        PredefinedAcl::ALL
            .into_iter()
            .find(|acl| acl.as_str() == wanted)
            .ok_or_else(|| SyncError::Configuration(format!("unknown predefined ACL '{s}'")))
    }
}

// ============================================================================
// AccessGrant / AclEntry
// ============================================================================

/// One fine-grained permission for one identity on one object
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessGrant {
    pub id_type: IdType,
    pub id_value: String,
    pub permission: Permission,
}

impl AccessGrant {
    pub fn new(id_type: IdType, id_value: impl Into<String>, permission: Permission) -> Self {
        Self {
            id_type,
            id_value: id_value.into(),
            permission,
        }
    }

    /// Returns true if this grant belongs to the given identity pair
    pub fn matches(&self, id_type: IdType, id_value: &str) -> bool {
        self.id_type == id_type && self.id_value == id_value
    }
}

impl Display for AccessGrant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.id_type, self.id_value, self.permission)
    }
}

impl FromStr for AccessGrant {
    type Err = SyncError;

    /// Parses `TYPE:VALUE:PERMISSION`, e.g. `UserByEmail:alice@example.com:READ`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed =
            || SyncError::Configuration(format!("grant '{s}' is not of the form TYPE:VALUE:PERMISSION"));
        let (id_type, rest) = s.split_once(':').ok_or_else(malformed)?;
        let (id_value, permission) = rest.rsplit_once(':').ok_or_else(malformed)?;
        if id_value.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            id_type: id_type.parse()?,
            id_value: id_value.to_string(),
            permission: permission.parse()?,
        })
    }
}

/// One entry of an object's ACL list as stored by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclEntry {
    /// A grant for one of the managed identity kinds
    Grant(AccessGrant),
    /// Any other entry, preserved verbatim
    Other {
        /// Backend entity string, e.g. `allUsers`
        entity: String,
        /// Backend role string, e.g. `READER`
        role: String,
    },
}

impl AclEntry {
    /// Returns the grant if this entry is one of the managed identity kinds
    pub fn as_grant(&self) -> Option<&AccessGrant> {
        match self {
            AclEntry::Grant(grant) => Some(grant),
            AclEntry::Other { .. } => None,
        }
    }

    /// Returns true if this entry is a grant for the given identity pair
    pub fn matches(&self, id_type: IdType, id_value: &str) -> bool {
        self.as_grant()
            .is_some_and(|grant| grant.matches(id_type, id_value))
    }
}

impl From<AccessGrant> for AclEntry {
    fn from(grant: AccessGrant) -> Self {
        AclEntry::Grant(grant)
    }
}

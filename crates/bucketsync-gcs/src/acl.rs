//! Translation between [`AclEntry`] values and JSON API ACL resources
//!
//! The JSON API names every ACL holder with an `entity` string:
//!
//! | Identity          | Entity                |
//! |-------------------|-----------------------|
//! | `GroupByDomain`   | `domain-<domain>`     |
//! | `GroupByEmail`    | `group-<email>`       |
//! | `GroupById`       | `group-<id>`          |
//! | `UserByEmail`     | `user-<email>`        |
//! | `UserById`        | `user-<id>`           |
//!
//! Email and ID forms share a prefix and are told apart by the `@`.
//! Anything else (`allUsers`, `project-owners-...`) becomes [`AclEntry::Other`].

use bucketsync_core::domain::{AccessGrant, AclEntry, IdType, Permission, PredefinedAcl};
use serde::{Deserialize, Serialize};

/// One element of an object's `acl` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclResource {
    pub entity: String,
    pub role: String,
}

/// Value of the `predefinedAcl` query parameter
pub fn predefined_acl_param(acl: PredefinedAcl) -> &'static str {
    match acl {
        PredefinedAcl::AuthenticatedRead => "authenticatedRead",
        PredefinedAcl::BucketOwnerFullControl => "bucketOwnerFullControl",
        PredefinedAcl::BucketOwnerRead => "bucketOwnerRead",
        PredefinedAcl::Private => "private",
        PredefinedAcl::ProjectPrivate => "projectPrivate",
        PredefinedAcl::PublicRead => "publicRead",
        PredefinedAcl::PublicReadWrite => "publicReadWrite",
    }
}

fn role_for(permission: Permission) -> Option<&'static str> {
    match permission {
        Permission::Empty => None,
        Permission::Read => Some("READER"),
        Permission::Write => Some("WRITER"),
        Permission::Owner => Some("OWNER"),
    }
}

fn permission_for(role: &str) -> Option<Permission> {
    match role {
        "READER" => Some(Permission::Read),
        "WRITER" => Some(Permission::Write),
        "OWNER" => Some(Permission::Owner),
        _ => None,
    }
}

fn entity_for(grant: &AccessGrant) -> String {
    let kind = match grant.id_type {
        IdType::GroupByDomain => "domain",
        IdType::GroupByEmail | IdType::GroupById => "group",
        IdType::UserByEmail | IdType::UserById => "user",
    };
    format!("{kind}-{}", grant.id_value)
}

fn identity_of(entity: &str) -> Option<(IdType, &str)> {
    let (kind, value) = entity.split_once('-')?;
    if value.is_empty() {
        return None;
    }
    let by_email = value.contains('@');
    let id_type = match kind {
        "domain" => IdType::GroupByDomain,
        "group" if by_email => IdType::GroupByEmail,
        "group" => IdType::GroupById,
        "user" if by_email => IdType::UserByEmail,
        "user" => IdType::UserById,
        _ => return None,
    };
    Some((id_type, value))
}

/// Parses one resource into a managed grant or an opaque entry
pub fn entry_from_resource(resource: AclResource) -> AclEntry {
    let identity = identity_of(&resource.entity);
    let permission = permission_for(&resource.role);
    match (identity, permission) {
        (Some((id_type, value)), Some(permission)) => {
            AclEntry::Grant(AccessGrant::new(id_type, value, permission))
        }
        _ => AclEntry::Other {
            entity: resource.entity,
            role: resource.role,
        },
    }
}

/// Serializes an entry; `Empty` grants have no wire form and yield `None`
pub fn resource_from_entry(entry: &AclEntry) -> Option<AclResource> {
    match entry {
        AclEntry::Grant(grant) => Some(AclResource {
            entity: entity_for(grant),
            role: role_for(grant.permission)?.to_string(),
        }),
        AclEntry::Other { entity, role } => Some(AclResource {
            entity: entity.clone(),
            role: role.clone(),
        }),
    }
}

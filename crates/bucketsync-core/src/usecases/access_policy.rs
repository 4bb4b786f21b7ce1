//! Fine-grained access grants on single objects
//!
//! Grants are additive: an identity may still reach an object through a
//! broader grant (a group it belongs to, a domain grant, a predefined ACL
//! entry such as `allUsers`). Setting an identity's permission to
//! [`Permission::Empty`] removes only that identity's own entry and does not
//! guarantee it loses access.

use std::sync::Arc;

use tracing::debug;

use crate::domain::acl::{AccessGrant, AclEntry, IdType, Permission};
use crate::domain::address::ObjectAddress;
use crate::domain::errors::SyncError;
use crate::ports::IObjectStore;

/// Use case for reading and writing per-identity grants
pub struct AccessPolicyUseCase {
    store: Arc<dyn IObjectStore + Send + Sync>,
}

impl AccessPolicyUseCase {
    pub fn new(store: Arc<dyn IObjectStore + Send + Sync>) -> Self {
        Self { store }
    }

    /// Returns the permission `id_value` holds on `object` through its own entry
    ///
    /// [`Permission::Empty`] if no entry matches.
    ///
    /// # Errors
    ///
    /// [`SyncError::AmbiguousGrant`] if several entries match the identity,
    /// `NotFound` if the object does not exist.
    pub async fn get_acl(
        &self,
        object: &ObjectAddress,
        id_type: IdType,
        id_value: &str,
    ) -> Result<Permission, SyncError> {
        let entries = self.read_entries(object).await?;
        let matching: Vec<&AccessGrant> = entries
            .iter()
            .filter_map(AclEntry::as_grant)
            .filter(|grant| grant.matches(id_type, id_value))
            .collect();

        match matching.as_slice() {
            [] => Ok(Permission::Empty),
            [grant] => Ok(grant.permission),
            many => Err(SyncError::AmbiguousGrant {
                bucket: object.bucket().to_string(),
                name: object.path().to_string(),
                id_type,
                id_value: id_value.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Sets the permission of one identity, replacing any entry it already has
    ///
    /// Entries for other identities (and non-identity entries) are kept.
    /// [`Permission::Empty`] removes the identity's entry.
    pub async fn set_acl(
        &self,
        object: &ObjectAddress,
        id_type: IdType,
        id_value: &str,
        permission: Permission,
    ) -> Result<(), SyncError> {
        let mut entries = self.read_entries(object).await?;
        let before = entries.len();
        entries.retain(|entry| !entry.matches(id_type, id_value));
        let removed = before - entries.len();

        if permission != Permission::Empty {
            entries.push(AccessGrant::new(id_type, id_value, permission).into());
        }

        debug!(
            object = %object,
            %id_type,
            id_value,
            %permission,
            removed,
            "Writing ACL"
        );

        self.store
            .set_grants(object.bucket(), object.path(), &entries)
            .await
            .map_err(|e| e.annotate("writing ACL of", object.bucket(), object.path()))
    }

    /// Applies a list of grants in order
    pub async fn apply_grants(
        &self,
        object: &ObjectAddress,
        grants: &[AccessGrant],
    ) -> Result<(), SyncError> {
        for grant in grants {
            self.set_acl(object, grant.id_type, &grant.id_value, grant.permission)
                .await?;
        }
        Ok(())
    }

    /// Returns every ACL entry of an object
    pub async fn list_entries(&self, object: &ObjectAddress) -> Result<Vec<AclEntry>, SyncError> {
        self.read_entries(object).await
    }

    async fn read_entries(&self, object: &ObjectAddress) -> Result<Vec<AclEntry>, SyncError> {
        self.store
            .get_grants(object.bucket(), object.path())
            .await
            .map_err(|e| e.annotate("reading ACL of", object.bucket(), object.path()))
    }
}

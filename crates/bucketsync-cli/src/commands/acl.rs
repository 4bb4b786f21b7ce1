//! Acl command - Read and write fine-grained object grants
//!
//! Grants are additive with every other permission on the object: setting
//! a grant to `EMPTY` removes that one entry and nothing else, so access may
//! still come from a group, a domain, or the predefined ACL.

use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use bucketsync_core::domain::{AclEntry, IdType, ObjectAddress, Permission};

use crate::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum AclCommand {
    /// Show the permission granted to one identity
    Get {
        /// Object, `gs://bucket/path`
        target: ObjectAddress,
        /// GroupByDomain, GroupByEmail, GroupById, UserByEmail or UserById
        id_type: IdType,
        /// Domain, email address or ID
        id_value: String,
    },
    /// Grant a permission to one identity (EMPTY removes the grant)
    Set {
        /// Object, `gs://bucket/path`
        target: ObjectAddress,
        /// GroupByDomain, GroupByEmail, GroupById, UserByEmail or UserById
        id_type: IdType,
        /// Domain, email address or ID
        id_value: String,
        /// EMPTY, READ, WRITE or OWNER
        permission: Permission,
    },
    /// List every ACL entry of an object
    List {
        /// Object, `gs://bucket/path`
        target: ObjectAddress,
    },
}

impl AclCommand {
    pub async fn execute(&self, ctx: &AppContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let access = ctx.access();

        match self {
            AclCommand::Get {
                target,
                id_type,
                id_value,
            } => {
                let permission = access.get_acl(target, *id_type, id_value).await?;
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "object": target.to_string(),
                        "id_type": id_type.as_str(),
                        "id_value": id_value,
                        "permission": permission.as_str(),
                    }));
                } else {
                    println!("{}", permission);
                }
            }
            AclCommand::Set {
                target,
                id_type,
                id_value,
                permission,
            } => {
                access
                    .set_acl(target, *id_type, id_value, *permission)
                    .await?;
                info!(object = %target, %id_type, %permission, "ACL updated");
                if format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "object": target.to_string(),
                        "id_type": id_type.as_str(),
                        "id_value": id_value,
                        "permission": permission.as_str(),
                    }));
                } else {
                    formatter.success(&format!(
                        "{}:{} now has {} on {}",
                        id_type, id_value, permission, target
                    ));
                }
            }
            AclCommand::List { target } => {
                let entries = access.list_entries(target).await?;
                if format.is_json() {
                    let json: Vec<serde_json::Value> = entries.iter().map(entry_json).collect();
                    formatter.print_json(&serde_json::Value::Array(json));
                } else {
                    for entry in &entries {
                        println!("{}", entry_line(entry));
                    }
                }
            }
        }
        Ok(())
    }
}

fn entry_line(entry: &AclEntry) -> String {
    match entry {
        AclEntry::Grant(grant) => grant.to_string(),
        AclEntry::Other { entity, role } => format!("{entity}:{role}"),
    }
}

fn entry_json(entry: &AclEntry) -> serde_json::Value {
    match entry {
        AclEntry::Grant(grant) => serde_json::json!({
            "id_type": grant.id_type.as_str(),
            "id_value": grant.id_value,
            "permission": grant.permission.as_str(),
        }),
        AclEntry::Other { entity, role } => serde_json::json!({
            "entity": entity,
            "role": role,
        }),
    }
}

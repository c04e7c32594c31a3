//! JSON snapshot of the permission tables.
//!
//! A snapshot seeds a `MemoryPermissionSource` for tooling and tests:
//!
//! ```json
//! {
//!   "groups": [2, 3],
//!   "roles": [7],
//!   "permissions": [
//!     { "group_id": 2, "obj_type": 10002, "obj_id": 5, "bits": "11000000111111111111111111111111" }
//!   ],
//!   "role_assignments": [
//!     { "group_id": 2, "role_id": 7, "obj_type": 10002, "obj_id": 5 }
//!   ],
//!   "role_permissions": [
//!     { "role_id": 7, "obj_type": 10031, "obj_id": 1, "bits": "00000000001000000000000000000000" }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::memory::MemoryPermissionSource;
use crate::traits::{GroupId, ObjectId, PermissionSource, RoleId, TypeId};

/// A permission row in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPermission {
    pub group_id: GroupId,
    pub obj_type: TypeId,
    pub obj_id: ObjectId,
    pub bits: String,
}

/// A role assignment in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRoleAssignment {
    pub group_id: GroupId,
    pub role_id: RoleId,
    pub obj_type: TypeId,
    pub obj_id: ObjectId,
}

/// A role permission row in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRolePermission {
    pub role_id: RoleId,
    pub obj_type: TypeId,
    pub obj_id: ObjectId,
    pub bits: String,
}

/// Serializable content of the permission tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSnapshot {
    /// Groups without any rows still need to be listed here.
    #[serde(default)]
    pub groups: Vec<GroupId>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
    #[serde(default)]
    pub permissions: Vec<SnapshotPermission>,
    #[serde(default)]
    pub role_assignments: Vec<SnapshotRoleAssignment>,
    #[serde(default)]
    pub role_permissions: Vec<SnapshotRolePermission>,
}

impl PermissionSnapshot {
    /// Parses a snapshot from JSON text.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a snapshot from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Serializes the snapshot as pretty JSON.
    pub fn to_json(&self) -> StorageResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds a memory source holding exactly the rows of this snapshot.
    pub fn into_source(self) -> StorageResult<MemoryPermissionSource> {
        let source = MemoryPermissionSource::new();
        for group_id in self.groups {
            source.add_group(group_id);
        }
        for role_id in self.roles {
            source.add_role(role_id);
        }
        for row in self.role_permissions {
            source.set_role_permission(row.role_id, row.obj_type, row.obj_id, &row.bits)?;
        }
        for row in self.permissions {
            source.set_permission(row.group_id, row.obj_type, row.obj_id, &row.bits)?;
        }
        for row in self.role_assignments {
            source.assign_role(row.group_id, row.role_id, row.obj_type, row.obj_id)?;
        }
        Ok(source)
    }

    /// Captures the current content of a memory source.
    pub fn capture(source: &MemoryPermissionSource) -> StorageResult<Self> {
        let mut role_permissions = Vec::new();
        let roles = source.role_ids()?;
        for role_id in &roles {
            for row in source.role_permissions(*role_id)? {
                role_permissions.push(SnapshotRolePermission {
                    role_id: *role_id,
                    obj_type: row.obj_type,
                    obj_id: row.obj_id,
                    bits: row.bits,
                });
            }
        }

        Ok(Self {
            groups: source.group_ids()?,
            roles,
            permissions: source
                .all_permissions()
                .into_iter()
                .map(|(group_id, row)| SnapshotPermission {
                    group_id,
                    obj_type: row.obj_type,
                    obj_id: row.obj_id,
                    bits: row.bits,
                })
                .collect(),
            role_assignments: source
                .all_role_assignments()
                .into_iter()
                .map(|(group_id, row)| SnapshotRoleAssignment {
                    group_id,
                    role_id: row.role_id,
                    obj_type: row.obj_type,
                    obj_id: row.obj_id,
                })
                .collect(),
            role_permissions,
        })
    }
}

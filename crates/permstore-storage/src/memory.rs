//! In-memory permission source for tests and tooling.
//!
//! Rows are kept per group in ordered maps so that reads come back in a
//! stable `(type, object)` order, which keeps consistency reports and
//! tests deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, instrument};

use crate::error::{StorageError, StorageResult};
use crate::traits::{
    has_any_bit, GroupId, ObjectId, ObjectPermissionRow, ObjectRoleRow, PermissionRow,
    PermissionSource, RoleAssignmentRow, RoleId, RolePermissionRow, TypeId,
};

/// Rows owned by one usergroup.
#[derive(Debug, Default, Clone)]
struct GroupRows {
    permissions: BTreeMap<(TypeId, ObjectId), String>,
    /// `(role, type, object)` assignments.
    roles: BTreeSet<(RoleId, TypeId, ObjectId)>,
}

/// In-memory implementation of `PermissionSource`.
///
/// # Performance Characteristics
///
/// - **Group reads**: O(R) where R is the number of rows of that group
/// - **Object reads**: O(G) where G is the number of groups
/// - **Writes**: O(log R) (BTreeMap insert under a DashMap shard lock)
///
/// Bit strings are stored verbatim. The source can be switched offline to
/// simulate an unreachable database.
#[derive(Debug, Default)]
pub struct MemoryPermissionSource {
    groups: DashMap<GroupId, GroupRows>,
    /// Role permission rows keyed by `(type, object)` per role.
    roles: DashMap<RoleId, BTreeMap<(TypeId, ObjectId), String>>,
    offline: AtomicBool,
}

impl MemoryPermissionSource {
    /// Creates a new, empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new source wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Switches the simulated connection on or off.
    ///
    /// While offline every read fails with `StorageError::ConnectionError`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::ConnectionError {
                message: "permission source is offline".to_string(),
            });
        }
        Ok(())
    }

    /// Adds a usergroup without any rows. Adding an existing group is a no-op.
    pub fn add_group(&self, group_id: GroupId) {
        self.groups.entry(group_id).or_default();
    }

    /// Removes a usergroup together with all of its rows.
    pub fn remove_group(&self, group_id: GroupId) -> StorageResult<()> {
        self.groups
            .remove(&group_id)
            .map(|_| ())
            .ok_or(StorageError::GroupNotFound { group_id })
    }

    /// Adds a role without permission rows. Adding an existing role is a no-op.
    pub fn add_role(&self, role_id: RoleId) {
        self.roles.entry(role_id).or_default();
    }

    /// Removes a role, its permission rows and every assignment of it.
    pub fn remove_role(&self, role_id: RoleId) -> StorageResult<()> {
        if self.roles.remove(&role_id).is_none() {
            return Err(StorageError::RoleNotFound { role_id });
        }
        for mut group in self.groups.iter_mut() {
            group.roles.retain(|(r, _, _)| *r != role_id);
        }
        Ok(())
    }

    /// Writes the permission row of `(group, type, object)`, creating the group if needed.
    #[instrument(skip(self, bits))]
    pub fn set_permission(
        &self,
        group_id: GroupId,
        obj_type: TypeId,
        obj_id: ObjectId,
        bits: &str,
    ) -> StorageResult<()> {
        if bits.is_empty() {
            return Err(StorageError::InvalidInput {
                message: "permission bits cannot be empty".to_string(),
            });
        }
        self.groups
            .entry(group_id)
            .or_default()
            .permissions
            .insert((obj_type, obj_id), bits.to_string());
        debug!("permission row written");
        Ok(())
    }

    /// Deletes the permission row of `(group, type, object)`.
    ///
    /// Returns whether a row existed.
    pub fn clear_permission(&self, group_id: GroupId, obj_type: TypeId, obj_id: ObjectId) -> bool {
        self.groups
            .get_mut(&group_id)
            .map(|mut g| g.permissions.remove(&(obj_type, obj_id)).is_some())
            .unwrap_or(false)
    }

    /// Assigns a role to a group on an object.
    pub fn assign_role(
        &self,
        group_id: GroupId,
        role_id: RoleId,
        obj_type: TypeId,
        obj_id: ObjectId,
    ) -> StorageResult<()> {
        if !self.roles.contains_key(&role_id) {
            return Err(StorageError::RoleNotFound { role_id });
        }
        self.groups
            .entry(group_id)
            .or_default()
            .roles
            .insert((role_id, obj_type, obj_id));
        Ok(())
    }

    /// Removes a role assignment. Returns whether it existed.
    pub fn unassign_role(
        &self,
        group_id: GroupId,
        role_id: RoleId,
        obj_type: TypeId,
        obj_id: ObjectId,
    ) -> bool {
        self.groups
            .get_mut(&group_id)
            .map(|mut g| g.roles.remove(&(role_id, obj_type, obj_id)))
            .unwrap_or(false)
    }

    /// Writes one permission row of a role, creating the role if needed.
    pub fn set_role_permission(
        &self,
        role_id: RoleId,
        obj_type: TypeId,
        obj_id: ObjectId,
        bits: &str,
    ) -> StorageResult<()> {
        if bits.is_empty() {
            return Err(StorageError::InvalidInput {
                message: "role permission bits cannot be empty".to_string(),
            });
        }
        self.roles
            .entry(role_id)
            .or_default()
            .insert((obj_type, obj_id), bits.to_string());
        Ok(())
    }

    /// Deletes one permission row of a role. Returns whether it existed.
    pub fn clear_role_permission(&self, role_id: RoleId, obj_type: TypeId, obj_id: ObjectId) -> bool {
        self.roles
            .get_mut(&role_id)
            .map(|mut r| r.remove(&(obj_type, obj_id)).is_some())
            .unwrap_or(false)
    }

    /// Iterates over every stored permission row as `(group, row)`.
    pub fn all_permissions(&self) -> Vec<(GroupId, PermissionRow)> {
        let mut rows: Vec<(GroupId, PermissionRow)> = self
            .groups
            .iter()
            .flat_map(|entry| {
                let group_id = *entry.key();
                entry
                    .permissions
                    .iter()
                    .map(|((obj_type, obj_id), bits)| {
                        (
                            group_id,
                            PermissionRow {
                                obj_type: *obj_type,
                                obj_id: *obj_id,
                                bits: bits.clone(),
                            },
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        rows.sort_by_key(|(g, row)| (*g, row.obj_type, row.obj_id));
        rows
    }

    /// Iterates over every role assignment as `(group, row)`.
    pub fn all_role_assignments(&self) -> Vec<(GroupId, RoleAssignmentRow)> {
        let mut rows: Vec<(GroupId, RoleAssignmentRow)> = self
            .groups
            .iter()
            .flat_map(|entry| {
                let group_id = *entry.key();
                entry
                    .roles
                    .iter()
                    .map(|(role_id, obj_type, obj_id)| {
                        (
                            group_id,
                            RoleAssignmentRow {
                                role_id: *role_id,
                                obj_type: *obj_type,
                                obj_id: *obj_id,
                            },
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        rows.sort_by_key(|(g, row)| (*g, row.role_id, row.obj_type, row.obj_id));
        rows
    }
}

impl PermissionSource for MemoryPermissionSource {
    fn group_ids(&self) -> StorageResult<Vec<GroupId>> {
        self.ensure_online()?;
        let mut ids: Vec<GroupId> = self.groups.iter().map(|g| *g.key()).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn role_ids(&self) -> StorageResult<Vec<RoleId>> {
        self.ensure_online()?;
        let mut ids: Vec<RoleId> = self.roles.iter().map(|r| *r.key()).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    fn group_permissions(&self, group_id: GroupId) -> StorageResult<Vec<PermissionRow>> {
        self.ensure_online()?;
        Ok(self
            .groups
            .get(&group_id)
            .map(|g| {
                g.permissions
                    .iter()
                    .map(|((obj_type, obj_id), bits)| PermissionRow {
                        obj_type: *obj_type,
                        obj_id: *obj_id,
                        bits: bits.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn group_role_assignments(&self, group_id: GroupId) -> StorageResult<Vec<RoleAssignmentRow>> {
        self.ensure_online()?;
        Ok(self
            .groups
            .get(&group_id)
            .map(|g| {
                g.roles
                    .iter()
                    .map(|(role_id, obj_type, obj_id)| RoleAssignmentRow {
                        role_id: *role_id,
                        obj_type: *obj_type,
                        obj_id: *obj_id,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn object_permissions(
        &self,
        obj_type: TypeId,
        obj_id: ObjectId,
    ) -> StorageResult<Vec<ObjectPermissionRow>> {
        self.ensure_online()?;
        let mut rows: Vec<ObjectPermissionRow> = self
            .groups
            .iter()
            .filter_map(|g| {
                g.permissions
                    .get(&(obj_type, obj_id))
                    .map(|bits| ObjectPermissionRow {
                        group_id: *g.key(),
                        bits: bits.clone(),
                    })
            })
            .collect();
        rows.sort_by_key(|r| r.group_id);
        Ok(rows)
    }

    fn object_role_assignments(
        &self,
        obj_type: TypeId,
        obj_id: ObjectId,
    ) -> StorageResult<Vec<ObjectRoleRow>> {
        self.ensure_online()?;
        let mut rows: Vec<ObjectRoleRow> = self
            .groups
            .iter()
            .flat_map(|g| {
                let group_id = *g.key();
                g.roles
                    .iter()
                    .filter(|(_, t, o)| *t == obj_type && *o == obj_id)
                    .map(|(role_id, _, _)| ObjectRoleRow {
                        group_id,
                        role_id: *role_id,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        rows.sort_by_key(|r| (r.group_id, r.role_id));
        Ok(rows)
    }

    fn role_permissions(&self, role_id: RoleId) -> StorageResult<Vec<RolePermissionRow>> {
        self.ensure_online()?;
        Ok(self
            .roles
            .get(&role_id)
            .map(|rows| {
                rows.iter()
                    .map(|((obj_type, obj_id), bits)| RolePermissionRow {
                        bits: bits.clone(),
                        obj_type: *obj_type,
                        obj_id: *obj_id,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn count_distinct_permissions(&self) -> StorageResult<u64> {
        self.ensure_online()?;
        Ok(self
            .groups
            .iter()
            .map(|g| g.permissions.values().filter(|b| has_any_bit(b)).count() as u64)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "11111111111111111111111111111111";
    const VIEW: &str = "10000000000000000000000000000000";
    const NONE: &str = "00000000000000000000000000000000";

    #[test]
    fn test_memory_source_can_be_created() {
        let source = MemoryPermissionSource::new();
        assert!(source.group_ids().unwrap().is_empty());
        assert!(source.role_ids().unwrap().is_empty());
        assert_eq!(source.count_distinct_permissions().unwrap(), 0);
    }

    #[test]
    fn test_memory_source_shared() {
        let source = MemoryPermissionSource::new_shared();
        source.set_permission(2, 10002, 5, VIEW).unwrap();

        let source2 = Arc::clone(&source);
        assert_eq!(source2.group_ids().unwrap(), vec![2]);
    }

    #[test]
    fn test_group_rows_are_returned_in_type_object_order() {
        let source = MemoryPermissionSource::new();
        source.set_permission(3, 10002, 9, VIEW).unwrap();
        source.set_permission(3, 10001, 4, FULL).unwrap();
        source.set_permission(3, 10002, 1, FULL).unwrap();

        let rows = source.group_permissions(3).unwrap();
        let keys: Vec<(i32, i32)> = rows.iter().map(|r| (r.obj_type, r.obj_id)).collect();
        assert_eq!(keys, vec![(10001, 4), (10002, 1), (10002, 9)]);
    }

    #[test]
    fn test_set_permission_overwrites_existing_row() {
        let source = MemoryPermissionSource::new();
        source.set_permission(3, 10002, 9, VIEW).unwrap();
        source.set_permission(3, 10002, 9, FULL).unwrap();

        let rows = source.object_permissions(10002, 9).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].bits, FULL);
    }

    #[test]
    fn test_empty_bits_are_rejected() {
        let source = MemoryPermissionSource::new();
        let err = source.set_permission(3, 10002, 9, "").unwrap_err();
        assert!(matches!(err, StorageError::InvalidInput { .. }));
    }

    #[test]
    fn test_object_permissions_span_groups() {
        let source = MemoryPermissionSource::new();
        source.set_permission(5, 10002, 9, VIEW).unwrap();
        source.set_permission(2, 10002, 9, FULL).unwrap();
        source.set_permission(2, 10002, 10, FULL).unwrap();

        let rows = source.object_permissions(10002, 9).unwrap();
        let groups: Vec<i32> = rows.iter().map(|r| r.group_id).collect();
        assert_eq!(groups, vec![2, 5]);
    }

    #[test]
    fn test_clear_permission_reports_existence() {
        let source = MemoryPermissionSource::new();
        source.set_permission(2, 10002, 9, FULL).unwrap();

        assert!(source.clear_permission(2, 10002, 9));
        assert!(!source.clear_permission(2, 10002, 9));
        assert!(!source.clear_permission(99, 10002, 9));
    }

    #[test]
    fn test_count_ignores_all_zero_rows() {
        let source = MemoryPermissionSource::new();
        source.set_permission(2, 10002, 9, FULL).unwrap();
        source.set_permission(2, 10002, 10, NONE).unwrap();
        source.set_permission(3, 10002, 9, VIEW).unwrap();

        assert_eq!(source.count_distinct_permissions().unwrap(), 2);
    }

    #[test]
    fn test_assign_role_requires_existing_role() {
        let source = MemoryPermissionSource::new();
        let err = source.assign_role(2, 7, 10002, 9).unwrap_err();
        assert!(matches!(err, StorageError::RoleNotFound { role_id: 7 }));

        source.add_role(7);
        source.assign_role(2, 7, 10002, 9).unwrap();
        let rows = source.object_role_assignments(10002, 9).unwrap();
        assert_eq!(
            rows,
            vec![ObjectRoleRow {
                group_id: 2,
                role_id: 7
            }]
        );
    }

    #[test]
    fn test_remove_role_drops_assignments() {
        let source = MemoryPermissionSource::new();
        source.set_role_permission(7, 10007, 0, FULL).unwrap();
        source.assign_role(2, 7, 10002, 9).unwrap();
        source.assign_role(3, 7, 10002, 9).unwrap();

        source.remove_role(7).unwrap();

        assert!(source.object_role_assignments(10002, 9).unwrap().is_empty());
        assert!(source.role_permissions(7).unwrap().is_empty());
        assert!(matches!(
            source.remove_role(7),
            Err(StorageError::RoleNotFound { .. })
        ));
    }

    #[test]
    fn test_remove_group_drops_rows() {
        let source = MemoryPermissionSource::new();
        source.set_permission(2, 10002, 9, FULL).unwrap();
        source.remove_group(2).unwrap();

        assert!(source.group_ids().unwrap().is_empty());
        assert!(source.object_permissions(10002, 9).unwrap().is_empty());
        assert!(matches!(
            source.remove_group(2),
            Err(StorageError::GroupNotFound { group_id: 2 })
        ));
    }

    #[test]
    fn test_offline_source_fails_every_read() {
        let source = MemoryPermissionSource::new();
        source.set_permission(2, 10002, 9, FULL).unwrap();
        source.set_offline(true);

        assert!(matches!(
            source.group_ids(),
            Err(StorageError::ConnectionError { .. })
        ));
        assert!(source.group_permissions(2).is_err());
        assert!(source.count_distinct_permissions().is_err());

        source.set_offline(false);
        assert_eq!(source.group_ids().unwrap(), vec![2]);
    }
}

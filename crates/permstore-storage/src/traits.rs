//! PermissionSource trait definition.

use crate::error::StorageResult;

/// Usergroup identifier.
pub type GroupId = i32;
/// System user identifier.
pub type UserId = i32;
/// Role identifier.
pub type RoleId = i32;
/// Numeric object type ("what kind of thing" a row applies to).
pub type TypeId = i32;
/// Object identifier within a type.
pub type ObjectId = i32;
/// Node or channel identifier.
pub type NodeId = i32;
/// Content language identifier.
pub type LanguageId = i32;

/// A permission row of one group: `(type, object) -> bits`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRow {
    pub obj_type: TypeId,
    pub obj_id: ObjectId,
    /// 32 characters of `0`/`1`, character `i` is bit `i`.
    pub bits: String,
}

/// A role assigned to one group on an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignmentRow {
    pub role_id: RoleId,
    pub obj_type: TypeId,
    pub obj_id: ObjectId,
}

/// A permission row of one object: `group -> bits`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPermissionRow {
    pub group_id: GroupId,
    pub bits: String,
}

/// A role assignment of one object: `group -> role`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRoleRow {
    pub group_id: GroupId,
    pub role_id: RoleId,
}

/// One row of a role's permission set.
///
/// `obj_type` is the page type, the file type or the content language type.
/// For the content language type `obj_id` carries the language id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissionRow {
    pub bits: String,
    pub obj_type: TypeId,
    pub obj_id: ObjectId,
}

/// Read interface over the permission tables.
///
/// Implementations must be thread-safe (Send + Sync). Bit strings are
/// returned verbatim; decoding and validation happen in the cache.
pub trait PermissionSource: Send + Sync + 'static {
    /// Lists all usergroup ids.
    fn group_ids(&self) -> StorageResult<Vec<GroupId>>;

    /// Lists all role ids.
    fn role_ids(&self) -> StorageResult<Vec<RoleId>>;

    /// Reads every permission row of a group.
    fn group_permissions(&self, group_id: GroupId) -> StorageResult<Vec<PermissionRow>>;

    /// Reads every role assignment of a group.
    fn group_role_assignments(&self, group_id: GroupId) -> StorageResult<Vec<RoleAssignmentRow>>;

    /// Reads the permission rows stored for one object across all groups.
    fn object_permissions(
        &self,
        obj_type: TypeId,
        obj_id: ObjectId,
    ) -> StorageResult<Vec<ObjectPermissionRow>>;

    /// Reads the role assignments stored for one object across all groups.
    fn object_role_assignments(
        &self,
        obj_type: TypeId,
        obj_id: ObjectId,
    ) -> StorageResult<Vec<ObjectRoleRow>>;

    /// Reads the permission rows joined to a role.
    fn role_permissions(&self, role_id: RoleId) -> StorageResult<Vec<RolePermissionRow>>;

    /// Counts distinct `(group, type, object)` triples with at least one bit set.
    fn count_distinct_permissions(&self) -> StorageResult<u64>;
}

/// Returns whether a stored bit string grants anything at all.
pub fn has_any_bit(bits: &str) -> bool {
    bits.contains('1')
}

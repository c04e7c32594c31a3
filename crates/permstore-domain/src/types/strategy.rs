//! Behaviour plugged into the type registry.
//!
//! The registry table is plain data. Enumeration of instances and custom
//! bit decisions are strategies registered per type id at startup.

use crate::error::DomainResult;
use crate::model::{Bit, NodeId, ObjectId, TypeId};

/// Answers permission bit checks for the current caller.
///
/// Implemented by the session resolver.
pub trait PermissionCheck {
    /// Checks `bit` on `(obj_type, obj_id)`, or on the type itself when
    /// `obj_id` is `None`.
    fn check_type_bit(&self, obj_type: TypeId, obj_id: Option<ObjectId>, bit: Bit) -> bool;

    /// Returns whether the caller bypasses permission checks.
    fn is_superuser(&self) -> bool;
}

/// Lists the instances of a type below a parent.
pub trait InstanceEnumerator: Send + Sync {
    fn instance_ids(
        &self,
        parent_id: Option<ObjectId>,
        channel_id: Option<NodeId>,
    ) -> DomainResult<Vec<ObjectId>>;
}

impl<F> InstanceEnumerator for F
where
    F: Fn(Option<ObjectId>, Option<NodeId>) -> DomainResult<Vec<ObjectId>> + Send + Sync,
{
    fn instance_ids(
        &self,
        parent_id: Option<ObjectId>,
        channel_id: Option<NodeId>,
    ) -> DomainResult<Vec<ObjectId>> {
        self(parent_id, channel_id)
    }
}

/// Overrides the default bit check of a type.
///
/// Returning `None` falls back to the default check.
pub trait BitChecker: Send + Sync {
    fn check(&self, perms: &dyn PermissionCheck, bit: Bit, obj_id: Option<ObjectId>)
        -> Option<bool>;
}

impl<F> BitChecker for F
where
    F: Fn(&dyn PermissionCheck, Bit, Option<ObjectId>) -> Option<bool> + Send + Sync,
{
    fn check(
        &self,
        perms: &dyn PermissionCheck,
        bit: Bit,
        obj_id: Option<ObjectId>,
    ) -> Option<bool> {
        self(perms, bit, obj_id)
    }
}

//! Listeners notified after cache mutations.

use std::error::Error;

use crate::model::{GroupId, ObjectId, RoleId, TypeId};

/// Error type returned by listeners.
pub type ListenerError = Box<dyn Error + Send + Sync>;

/// A local cache mutation that has already been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionChange {
    GroupRefreshed(GroupId),
    ObjectRefreshed { obj_type: TypeId, obj_id: ObjectId },
    RoleRefreshed(RoleId),
    GroupRemoved(GroupId),
    ObjectRemoved { obj_type: TypeId, obj_id: ObjectId },
    RoleRemoved(RoleId),
}

impl PermissionChange {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PermissionChange::GroupRefreshed(_) | PermissionChange::GroupRemoved(_) => "group",
            PermissionChange::ObjectRefreshed { .. } | PermissionChange::ObjectRemoved { .. } => {
                "object"
            }
            PermissionChange::RoleRefreshed(_) | PermissionChange::RoleRemoved(_) => "role",
        }
    }
}

/// Subsystem that keeps itself in sync with the permission cache.
///
/// Listeners are called in registration order after every refresh or
/// removal. A listener error is logged and does not stop the remaining
/// listeners.
pub trait PermissionStoreListener: Send + Sync {
    fn on_change(&self, change: PermissionChange) -> Result<(), ListenerError>;
}

impl<F> PermissionStoreListener for F
where
    F: Fn(PermissionChange) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_change(&self, change: PermissionChange) -> Result<(), ListenerError> {
        self(change)
    }
}

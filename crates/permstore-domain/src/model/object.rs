//! Objects that permission decisions are made about.

use super::object_type;
use super::{GroupId, LanguageId, NodeId, ObjectId, RoleId, TypeId, UserId};

/// An object a caller wants to act on.
///
/// Each variant carries what its policy needs. `channel_id` is the channel an
/// object lives in when it is a channel-local variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermObject {
    Folder {
        id: ObjectId,
        channel_id: Option<NodeId>,
    },
    Node {
        id: NodeId,
    },
    Page {
        id: ObjectId,
        folder_id: ObjectId,
        language_id: LanguageId,
        channel_id: Option<NodeId>,
    },
    File {
        id: ObjectId,
        folder_id: ObjectId,
        channel_id: Option<NodeId>,
    },
    Image {
        id: ObjectId,
        folder_id: ObjectId,
        channel_id: Option<NodeId>,
    },
    Template {
        id: ObjectId,
    },
    Construct {
        id: ObjectId,
    },
    /// An object property (object tag) identified by name on its owner.
    ObjectTag {
        name: String,
        owner: TagOwner,
    },
    SystemUser {
        id: UserId,
    },
    UserGroup {
        id: GroupId,
    },
    Role {
        id: RoleId,
    },
    SchedulerTask {
        id: ObjectId,
    },
    SchedulerSchedule {
        id: ObjectId,
    },
}

impl PermObject {
    /// Numeric type of the object.
    pub fn obj_type(&self) -> TypeId {
        match self {
            PermObject::Folder { .. } => object_type::FOLDER,
            PermObject::Node { .. } => object_type::NODE,
            PermObject::Page { .. } => object_type::PAGE,
            PermObject::File { .. } => object_type::FILE,
            PermObject::Image { .. } => object_type::IMAGE,
            PermObject::Template { .. } => object_type::TEMPLATE,
            PermObject::Construct { .. } => object_type::CONSTRUCT,
            PermObject::ObjectTag { .. } => object_type::OBJTAG_DEF,
            PermObject::SystemUser { .. } => object_type::SYSTEM_USER,
            PermObject::UserGroup { .. } => object_type::USERGROUP,
            PermObject::Role { .. } => object_type::ROLE,
            PermObject::SchedulerTask { .. } => object_type::SCHEDULER_TASK,
            PermObject::SchedulerSchedule { .. } => object_type::SCHEDULER_SCHEDULE,
        }
    }

    /// Channel the object lives in, for channel-local variants.
    pub fn channel_id(&self) -> Option<NodeId> {
        match self {
            PermObject::Folder { channel_id, .. }
            | PermObject::Page { channel_id, .. }
            | PermObject::File { channel_id, .. }
            | PermObject::Image { channel_id, .. } => *channel_id,
            _ => None,
        }
    }
}

/// Kind of object an object tag belongs to.
///
/// Tag definitions are keyed by owner kind and name, so the owning instance
/// does not take part in the check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagOwner {
    Folder,
    Page,
    File,
    Image,
    Template,
}

impl TagOwner {
    /// Numeric type of the owner; object tag definitions are keyed by it.
    pub fn obj_type(&self) -> TypeId {
        match self {
            TagOwner::Folder => object_type::FOLDER,
            TagOwner::Page => object_type::PAGE,
            TagOwner::File => object_type::FILE,
            TagOwner::Image => object_type::IMAGE,
            TagOwner::Template => object_type::TEMPLATE,
        }
    }
}

/// Kinds of objects that can be created inside a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    Folder,
    Page,
    File,
    Image,
    Template,
}

impl ObjectClass {
    /// Numeric type of instances of this class.
    pub fn obj_type(self) -> TypeId {
        match self {
            ObjectClass::Folder => object_type::FOLDER,
            ObjectClass::Page => object_type::PAGE,
            ObjectClass::File => object_type::FILE,
            ObjectClass::Image => object_type::IMAGE,
            ObjectClass::Template => object_type::TEMPLATE,
        }
    }
}

//! Collaborator traits needed by the resolver.

use permstore_storage::StorageResult;

use crate::model::{GroupId, NodeId, ObjectId, TypeId, UserId};

/// A folder as seen by permission checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderInfo {
    pub id: ObjectId,
    /// Id of the master folder; equals `id` for non channel-local folders.
    pub master_id: ObjectId,
    /// Node or channel the folder belongs to.
    pub node_id: NodeId,
    /// Whether this is the root folder of its node.
    pub is_root: bool,
}

/// A node or channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub root_folder_id: ObjectId,
}

/// A caller's membership in a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembership {
    pub group_id: GroupId,
    /// Nodes the membership is restricted to; empty means unrestricted.
    pub node_ids: Vec<NodeId>,
}

impl GroupMembership {
    pub fn unrestricted(group_id: GroupId) -> Self {
        Self {
            group_id,
            node_ids: Vec::new(),
        }
    }

    /// Returns whether the membership applies on `node_id` (0 = any node).
    pub fn applies_to(&self, node_id: NodeId) -> bool {
        node_id == 0 || self.node_ids.is_empty() || self.node_ids.contains(&node_id)
    }
}

/// Read access to the content object model.
///
/// Lookups return `Ok(None)` for objects that do not exist; errors are
/// reserved for failures of the underlying store.
pub trait ObjectDirectory: Send + Sync {
    /// Resolves a folder, as seen from `channel_id` when given.
    fn folder(&self, folder_id: ObjectId, channel_id: Option<NodeId>)
        -> StorageResult<Option<FolderInfo>>;

    /// Resolves a node or channel.
    fn node(&self, node_id: NodeId) -> StorageResult<Option<NodeInfo>>;

    /// All channels derived from a node, transitively.
    fn derived_channels(&self, node_id: NodeId) -> StorageResult<Vec<NodeId>>;

    /// Group memberships of a user.
    fn user_groups(&self, user_id: UserId) -> StorageResult<Vec<GroupMembership>>;

    /// Parent of a group, `None` for top-level groups.
    fn group_parent(&self, group_id: GroupId) -> StorageResult<Option<GroupId>>;

    /// Folders a template is linked to, including root folders of the nodes
    /// it is assigned to.
    fn template_folders(&self, template_id: ObjectId) -> StorageResult<Vec<ObjectId>>;

    /// Nodes a construct is assigned to.
    fn construct_nodes(&self, construct_id: ObjectId) -> StorageResult<Vec<NodeId>>;

    /// Id of the object tag definition `name` for objects of `owner_type`.
    fn objtag_definition(&self, owner_type: TypeId, name: &str) -> StorageResult<Option<ObjectId>>;

    /// Instances of `obj_type` below `parent_id`.
    ///
    /// Used by the type registry to enumerate permission tree entries.
    /// Default implementation returns an empty list.
    fn children(
        &self,
        _obj_type: TypeId,
        _parent_id: Option<ObjectId>,
        _channel_id: Option<NodeId>,
    ) -> StorageResult<Vec<ObjectId>> {
        Ok(Vec::new())
    }
}

//! Mock implementations for resolver testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use permstore_storage::{MemoryPermissionSource, PermissionSource, StorageError, StorageResult};

use crate::cache::{CacheConfig, PermissionCache};
use crate::model::{Bit, GroupId, NodeId, ObjectId, TypeId, UserId, BIT_COUNT};
use crate::resolver::{
    FolderInfo, GroupMembership, NodeInfo, ObjectDirectory, PermissionResolver, ResolverConfig,
};

/// In-memory object directory.
#[derive(Default)]
pub struct MockDirectory {
    folders: RwLock<HashMap<ObjectId, FolderInfo>>,
    channel_folders: RwLock<HashMap<(ObjectId, NodeId), FolderInfo>>,
    nodes: RwLock<HashMap<NodeId, NodeInfo>>,
    channels: RwLock<HashMap<NodeId, Vec<NodeId>>>,
    memberships: RwLock<HashMap<UserId, Vec<GroupMembership>>>,
    parents: RwLock<HashMap<GroupId, GroupId>>,
    template_folders: RwLock<HashMap<ObjectId, Vec<ObjectId>>>,
    construct_nodes: RwLock<HashMap<ObjectId, Vec<NodeId>>>,
    definitions: RwLock<HashMap<(TypeId, String), ObjectId>>,
    offline: AtomicBool,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node together with its root folder.
    pub fn add_node(&self, node_id: NodeId, root_folder_id: ObjectId) {
        self.nodes.write().unwrap().insert(
            node_id,
            NodeInfo {
                id: node_id,
                root_folder_id,
            },
        );
        self.folders.write().unwrap().insert(
            root_folder_id,
            FolderInfo {
                id: root_folder_id,
                master_id: root_folder_id,
                node_id,
                is_root: true,
            },
        );
    }

    pub fn add_folder(&self, folder_id: ObjectId, node_id: NodeId) {
        self.folders.write().unwrap().insert(
            folder_id,
            FolderInfo {
                id: folder_id,
                master_id: folder_id,
                node_id,
                is_root: false,
            },
        );
    }

    /// Adds the channel-local variant of a master folder.
    pub fn add_channel_folder(&self, master_id: ObjectId, channel_id: NodeId, local_id: ObjectId) {
        self.channel_folders.write().unwrap().insert(
            (master_id, channel_id),
            FolderInfo {
                id: local_id,
                master_id,
                node_id: channel_id,
                is_root: false,
            },
        );
    }

    pub fn add_channel(&self, node_id: NodeId, channel_id: NodeId) {
        self.channels
            .write()
            .unwrap()
            .entry(node_id)
            .or_default()
            .push(channel_id);
    }

    pub fn add_membership(&self, user_id: UserId, group_id: GroupId, node_ids: &[NodeId]) {
        self.memberships
            .write()
            .unwrap()
            .entry(user_id)
            .or_default()
            .push(GroupMembership {
                group_id,
                node_ids: node_ids.to_vec(),
            });
    }

    pub fn clear_memberships(&self, user_id: UserId) {
        self.memberships.write().unwrap().remove(&user_id);
    }

    pub fn set_parent(&self, group_id: GroupId, parent_id: GroupId) {
        self.parents.write().unwrap().insert(group_id, parent_id);
    }

    pub fn link_template(&self, template_id: ObjectId, folder_id: ObjectId) {
        self.template_folders
            .write()
            .unwrap()
            .entry(template_id)
            .or_default()
            .push(folder_id);
    }

    pub fn assign_construct(&self, construct_id: ObjectId, node_id: NodeId) {
        self.construct_nodes
            .write()
            .unwrap()
            .entry(construct_id)
            .or_default()
            .push(node_id);
    }

    pub fn add_definition(&self, owner_type: TypeId, name: &str, definition_id: ObjectId) {
        self.definitions
            .write()
            .unwrap()
            .insert((owner_type, name.to_string()), definition_id);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::ConnectionError {
                message: "directory offline".to_string(),
            });
        }
        Ok(())
    }
}

impl ObjectDirectory for MockDirectory {
    fn folder(
        &self,
        folder_id: ObjectId,
        channel_id: Option<NodeId>,
    ) -> StorageResult<Option<FolderInfo>> {
        self.ensure_online()?;
        if let Some(channel_id) = channel_id {
            if let Some(local) = self.channel_folders.read().unwrap().get(&(folder_id, channel_id)) {
                return Ok(Some(local.clone()));
            }
        }
        Ok(self.folders.read().unwrap().get(&folder_id).cloned())
    }

    fn node(&self, node_id: NodeId) -> StorageResult<Option<NodeInfo>> {
        self.ensure_online()?;
        Ok(self.nodes.read().unwrap().get(&node_id).cloned())
    }

    fn derived_channels(&self, node_id: NodeId) -> StorageResult<Vec<NodeId>> {
        self.ensure_online()?;
        Ok(self
            .channels
            .read()
            .unwrap()
            .get(&node_id)
            .cloned()
            .unwrap_or_default())
    }

    fn user_groups(&self, user_id: UserId) -> StorageResult<Vec<GroupMembership>> {
        self.ensure_online()?;
        Ok(self
            .memberships
            .read()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    fn group_parent(&self, group_id: GroupId) -> StorageResult<Option<GroupId>> {
        self.ensure_online()?;
        Ok(self.parents.read().unwrap().get(&group_id).copied())
    }

    fn template_folders(&self, template_id: ObjectId) -> StorageResult<Vec<ObjectId>> {
        self.ensure_online()?;
        Ok(self
            .template_folders
            .read()
            .unwrap()
            .get(&template_id)
            .cloned()
            .unwrap_or_default())
    }

    fn construct_nodes(&self, construct_id: ObjectId) -> StorageResult<Vec<NodeId>> {
        self.ensure_online()?;
        Ok(self
            .construct_nodes
            .read()
            .unwrap()
            .get(&construct_id)
            .cloned()
            .unwrap_or_default())
    }

    fn objtag_definition(&self, owner_type: TypeId, name: &str) -> StorageResult<Option<ObjectId>> {
        self.ensure_online()?;
        Ok(self
            .definitions
            .read()
            .unwrap()
            .get(&(owner_type, name.to_string()))
            .copied())
    }

    fn children(
        &self,
        obj_type: TypeId,
        parent_id: Option<ObjectId>,
        _channel_id: Option<NodeId>,
    ) -> StorageResult<Vec<ObjectId>> {
        self.ensure_online()?;
        if obj_type != crate::model::object_type::FOLDER {
            return Ok(Vec::new());
        }
        let folders = self.folders.read().unwrap();
        let Some(parent) = parent_id.and_then(|id| folders.get(&id)) else {
            return Ok(Vec::new());
        };
        let mut ids: Vec<ObjectId> = folders
            .values()
            .filter(|f| !f.is_root && f.node_id == parent.node_id && f.id != parent.id)
            .map(|f| f.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

/// Builds a 32 character bit string with the given bits set.
pub fn bits(set: &[Bit]) -> String {
    (0..BIT_COUNT)
        .map(|i| if set.iter().any(|b| usize::from(*b) == i) { '1' } else { '0' })
        .collect()
}

/// Storage, directory and cache wired together.
pub struct Fixture {
    pub source: Arc<MemoryPermissionSource>,
    pub directory: Arc<MockDirectory>,
    pub cache: Arc<PermissionCache>,
    pub config: ResolverConfig,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default(), ResolverConfig::default())
    }

    pub fn with_config(cache_config: CacheConfig, config: ResolverConfig) -> Self {
        let source = MemoryPermissionSource::new_shared();
        let cache = Arc::new(PermissionCache::new(
            Arc::clone(&source) as Arc<dyn PermissionSource>,
            cache_config,
        ));
        Self {
            source,
            directory: Arc::new(MockDirectory::new()),
            cache,
            config,
        }
    }

    pub fn grant(&self, group_id: GroupId, obj_type: TypeId, obj_id: ObjectId, set: &[Bit]) {
        self.source
            .set_permission(group_id, obj_type, obj_id, &bits(set))
            .unwrap();
    }

    /// Loads the cache and returns a resolver for `user_id`.
    pub fn resolver_for_user(&self, user_id: UserId) -> PermissionResolver {
        let mut resolver = self.resolver();
        resolver.init_for_user(user_id);
        resolver
    }

    /// Loads the cache and returns an uninitialized resolver.
    pub fn resolver(&self) -> PermissionResolver {
        self.cache.initialize(true).unwrap();
        PermissionResolver::new(
            Arc::clone(&self.cache),
            Arc::clone(&self.directory) as Arc<dyn ObjectDirectory>,
            self.config.clone(),
        )
    }
}

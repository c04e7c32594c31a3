//! End-to-end permission decisions over a JSON snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use permstore_domain::model::{object_type, GroupId, NodeId, ObjectId, TypeId, UserId};
use permstore_domain::resolver::{FolderInfo, GroupMembership, NodeInfo};
use permstore_domain::{
    CacheConfig, Feature, FeatureSet, ObjectClass, ObjectDirectory, PermObject, PermissionCache,
    PermissionResolver, ResolverConfig, TypeRegistry,
};
use permstore_storage::{PermissionSnapshot, PermissionSource, StorageResult};

/// Groups 2 (editors) and 3 (translators, role 7 for language 2).
const SNAPSHOT: &str = r#"{
    "groups": [2, 3],
    "roles": [7],
    "permissions": [
        { "group_id": 2, "obj_type": 10001, "obj_id": 100, "bits": "10000000000000000000000000000000" },
        { "group_id": 2, "obj_type": 10002, "obj_id": 101, "bits": "11000000111111111111111111111111" },
        { "group_id": 3, "obj_type": 10002, "obj_id": 101, "bits": "10000000000000000000000000000000" },
        { "group_id": 2, "obj_type": 10000, "obj_id": 0, "bits": "10000000000000000000000000000000" }
    ],
    "role_assignments": [
        { "group_id": 3, "role_id": 7, "obj_type": 10002, "obj_id": 101 }
    ],
    "role_permissions": [
        { "role_id": 7, "obj_type": 10031, "obj_id": 2, "bits": "00000000001010000000000000000000" }
    ]
}"#;

/// Node 1 with root folder 100 and folder 101. User 10 is an editor,
/// user 11 a translator.
struct SiteDirectory {
    folders: HashMap<ObjectId, FolderInfo>,
    members: HashMap<UserId, Vec<GroupId>>,
}

impl SiteDirectory {
    fn new() -> Self {
        let folder = |id, is_root| FolderInfo {
            id,
            master_id: id,
            node_id: 1,
            is_root,
        };
        Self {
            folders: HashMap::from([(100, folder(100, true)), (101, folder(101, false))]),
            members: HashMap::from([(10, vec![2]), (11, vec![3])]),
        }
    }
}

impl ObjectDirectory for SiteDirectory {
    fn folder(
        &self,
        folder_id: ObjectId,
        _channel_id: Option<NodeId>,
    ) -> StorageResult<Option<FolderInfo>> {
        Ok(self.folders.get(&folder_id).cloned())
    }

    fn node(&self, node_id: NodeId) -> StorageResult<Option<NodeInfo>> {
        Ok((node_id == 1).then_some(NodeInfo {
            id: 1,
            root_folder_id: 100,
        }))
    }

    fn derived_channels(&self, _node_id: NodeId) -> StorageResult<Vec<NodeId>> {
        Ok(Vec::new())
    }

    fn user_groups(&self, user_id: UserId) -> StorageResult<Vec<GroupMembership>> {
        Ok(self
            .members
            .get(&user_id)
            .into_iter()
            .flatten()
            .map(|group_id| GroupMembership::unrestricted(*group_id))
            .collect())
    }

    fn group_parent(&self, _group_id: GroupId) -> StorageResult<Option<GroupId>> {
        Ok(None)
    }

    fn template_folders(&self, _template_id: ObjectId) -> StorageResult<Vec<ObjectId>> {
        Ok(vec![101])
    }

    fn construct_nodes(&self, _construct_id: ObjectId) -> StorageResult<Vec<NodeId>> {
        Ok(Vec::new())
    }

    fn objtag_definition(
        &self,
        _owner_type: TypeId,
        _name: &str,
    ) -> StorageResult<Option<ObjectId>> {
        Ok(None)
    }

    fn children(
        &self,
        obj_type: TypeId,
        parent_id: Option<ObjectId>,
        _channel_id: Option<NodeId>,
    ) -> StorageResult<Vec<ObjectId>> {
        Ok(match (obj_type, parent_id) {
            (object_type::FOLDER, Some(100)) => vec![101],
            _ => Vec::new(),
        })
    }
}

struct Site {
    cache: Arc<PermissionCache>,
    directory: Arc<SiteDirectory>,
}

impl Site {
    fn load() -> Self {
        let source = PermissionSnapshot::from_json(SNAPSHOT)
            .unwrap()
            .into_source()
            .unwrap();
        let features = FeatureSet::new().with(Feature::RolePermissions);
        let cache = Arc::new(PermissionCache::new(
            Arc::new(source) as Arc<dyn PermissionSource>,
            CacheConfig::from_features(&features),
        ));
        cache.initialize(false).unwrap();
        Self {
            cache,
            directory: Arc::new(SiteDirectory::new()),
        }
    }

    fn resolver(&self, user_id: UserId) -> PermissionResolver {
        let mut resolver = PermissionResolver::new(
            Arc::clone(&self.cache),
            Arc::clone(&self.directory) as Arc<dyn ObjectDirectory>,
            ResolverConfig::default(),
        );
        resolver.init_for_user(user_id);
        resolver
    }
}

fn page(language_id: i32) -> PermObject {
    PermObject::Page {
        id: 500,
        folder_id: 101,
        language_id,
        channel_id: None,
    }
}

#[test]
fn test_editor_manages_folder_and_pages() {
    let site = Site::load();
    let editor = site.resolver(10);

    let folder = PermObject::Folder {
        id: 101,
        channel_id: None,
    };
    assert!(editor.can_view(&folder).unwrap());
    assert!(editor.can_edit(&folder).unwrap());
    assert!(editor.can_set_perms(&folder).unwrap());
    assert!(editor.can_view(&page(1)).unwrap());
    assert!(editor.can_publish(&page(1)).unwrap());
    assert!(editor.can_create(ObjectClass::Page, 101, 1).unwrap());
    assert!(editor.can_view(&PermObject::Template { id: 50 }).unwrap());
    assert!(editor.can_view(&PermObject::Node { id: 1 }).unwrap());
}

#[test]
fn test_translator_works_through_role() {
    let site = Site::load();
    let translator = site.resolver(11);

    assert!(translator.can_view(&page(2)).unwrap());
    assert!(translator.can_edit(&page(2)).unwrap());
    assert!(!translator.can_delete(&page(2), false).unwrap());
    assert!(!translator.can_publish(&page(2)).unwrap());
    assert!(!translator.can_view(&page(1)).unwrap());
    assert!(!translator.can_view(&PermObject::Node { id: 1 }).unwrap());
}

#[test]
fn test_unknown_user_sees_nothing() {
    let site = Site::load();
    let stranger = site.resolver(99);

    assert!(stranger.group_ids(0).unwrap().is_empty());
    assert!(!stranger.can_view(&page(1)).unwrap());
}

#[test]
fn test_type_tree_for_editor() {
    let site = Site::load();
    let editor = site.resolver(10);
    let registry = TypeRegistry::builder()
        .features(FeatureSet::new().with(Feature::RolePermissions))
        .directory(Arc::clone(&site.directory) as Arc<dyn ObjectDirectory>)
        .build();

    let content = registry.by_type(object_type::CONTENT_ADMIN).unwrap();
    assert!(content.can_view(&editor, None));

    let node = registry.get("node").unwrap();
    assert!(node.can_view(&editor, Some(1)));
    assert!(node.has_children(&editor, Some(100), None).unwrap());

    let folder = registry.get("folder").unwrap();
    assert_eq!(folder.instance_ids(Some(100), None).unwrap(), vec![101]);
    assert!(folder.can_set_perms(&editor, Some(101)));

    let translator = site.resolver(11);
    assert!(!content.can_view(&translator, None));
    assert!(!node.can_view(&translator, Some(1)));
    assert!(folder.can_view(&translator, Some(101)));
    assert!(!folder.can_set_perms(&translator, Some(101)));
}

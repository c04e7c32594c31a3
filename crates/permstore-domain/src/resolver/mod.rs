//! Session-scoped permission resolver.
//!
//! A resolver answers permission questions for one caller (a user or a bare
//! group). It resolves the caller's group ids, optionally restricted to a
//! node, reads merged permissions from the shared [`PermissionCache`] and
//! applies the per-object-kind policy.
//!
//! # Decisions
//!
//! - **Superusers** (see [`ResolverConfig::superuser_ids`]) get the full
//!   permission pair without touching the cache.
//! - **Folders and nodes** are resolved through the [`ObjectDirectory`]:
//!   root folders are checked as nodes and, with multichannelling enabled,
//!   permissions are read from the master folder.
//! - **Fail-closed**: a storage failure inside a boolean check is logged and
//!   treated as denied. Other errors propagate.

mod config;
mod groups;
mod policy;
mod traits;

#[cfg(test)]
mod tests;

pub use config::ResolverConfig;
pub use traits::{FolderInfo, GroupMembership, NodeInfo, ObjectDirectory};

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::cache::PermissionCache;
use crate::error::{DomainError, DomainResult};
use crate::model::{
    object_type, Bit, GroupId, LanguageId, NodeId, ObjectId, PermissionPair, TypeId, UserId,
};
use crate::types::PermissionCheck;

/// Who the resolver answers for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Uninitialized,
    User(UserId),
    /// A bare group without a user, e.g. for background jobs.
    Group(GroupId),
}

/// Which node's group memberships apply to folder-scoped checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChannelScope {
    /// The node the folder belongs to.
    #[default]
    Own,
    /// A fixed node or channel.
    Channel(NodeId),
    /// The folder's node and every channel derived from it.
    AnyChannel,
}

/// Permission resolver for one session.
pub struct PermissionResolver {
    cache: Arc<PermissionCache>,
    directory: Arc<dyn ObjectDirectory>,
    config: ResolverConfig,
    session: Session,
    scope: ChannelScope,
    /// Group ids by node (0 = unscoped); cleared on re-initialization.
    group_memo: DashMap<NodeId, Arc<Vec<GroupId>>>,
}

impl PermissionResolver {
    /// Creates an uninitialized resolver.
    pub fn new(
        cache: Arc<PermissionCache>,
        directory: Arc<dyn ObjectDirectory>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            cache,
            directory,
            config,
            session: Session::Uninitialized,
            scope: ChannelScope::Own,
            group_memo: DashMap::new(),
        }
    }

    /// Answers for a user from now on.
    pub fn init_for_user(&mut self, user_id: UserId) {
        self.session = Session::User(user_id);
        self.group_memo.clear();
    }

    /// Answers for a bare group from now on.
    pub fn init_for_group(&mut self, group_id: GroupId) {
        self.session = Session::Group(group_id);
        self.group_memo.clear();
    }

    pub fn set_scope(&mut self, scope: ChannelScope) {
        self.scope = scope;
    }

    pub fn with_scope(mut self, scope: ChannelScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn scope(&self) -> ChannelScope {
        self.scope
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The current user, if initialized for one.
    pub fn user_id(&self) -> Option<UserId> {
        match self.session {
            Session::User(user_id) => Some(user_id),
            _ => None,
        }
    }

    pub fn is_superuser(&self) -> bool {
        matches!(self.session, Session::User(id) if self.config.superuser_ids.contains(&id))
    }

    /// Group ids of the caller that apply on `node_id` (0 = any node).
    ///
    /// For a user these are the memberships that are unrestricted or
    /// restricted to `node_id`. A bare group session yields that group, an
    /// uninitialized session nothing.
    pub fn group_ids(&self, node_id: NodeId) -> DomainResult<Arc<Vec<GroupId>>> {
        let user_id = match self.session {
            Session::Uninitialized => return Ok(Arc::new(Vec::new())),
            Session::Group(group_id) => return Ok(Arc::new(vec![group_id])),
            Session::User(user_id) => user_id,
        };
        if let Some(ids) = self.group_memo.get(&node_id) {
            return Ok(Arc::clone(ids.value()));
        }

        let mut ids: Vec<GroupId> = self
            .directory
            .user_groups(user_id)?
            .into_iter()
            .filter(|membership| membership.applies_to(node_id))
            .map(|membership| membership.group_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        debug!(user_id, node_id, groups = ids.len(), "resolved group ids");

        let ids = Arc::new(ids);
        self.group_memo.insert(node_id, Arc::clone(&ids));
        Ok(ids)
    }

    /// Merged permissions of the caller.
    ///
    /// Without `obj_id` the type-level permissions are returned. Folders and
    /// nodes are resolved and checked in the current channel scope.
    ///
    /// # Errors
    ///
    /// `EntityResolutionFailure` for folders or nodes that do not exist,
    /// `NotInitialized` and storage failures from the cache or directory.
    pub fn permissions(
        &self,
        obj_type: TypeId,
        obj_id: Option<ObjectId>,
        check_type: TypeId,
        language_id: LanguageId,
    ) -> DomainResult<PermissionPair> {
        self.pair_in(obj_type, obj_id, check_type, language_id, self.scope)
    }

    fn pair_in(
        &self,
        obj_type: TypeId,
        obj_id: Option<ObjectId>,
        check_type: TypeId,
        language_id: LanguageId,
        scope: ChannelScope,
    ) -> DomainResult<PermissionPair> {
        if self.is_superuser() {
            return Ok(PermissionPair::full());
        }
        if self.session == Session::Uninitialized {
            return Ok(PermissionPair::empty());
        }

        let obj_type = object_type::normalize(obj_type);
        let Some(obj_id) = obj_id else {
            return self.type_pair(obj_type);
        };
        if object_type::is_folder_like(obj_type) {
            return self.folder_pair(obj_type, obj_id, None, check_type, language_id, scope);
        }
        let groups = self.group_ids(0)?;
        self.cache
            .merged_permissions(&groups, obj_type, obj_id, check_type, language_id)
    }

    /// Type-level permissions of the caller.
    fn type_pair(&self, obj_type: TypeId) -> DomainResult<PermissionPair> {
        if self.is_superuser() {
            return Ok(PermissionPair::full());
        }
        let groups = self.group_ids(0)?;
        Ok(PermissionPair::group_only(
            self.cache.merged_type_permissions(&groups, obj_type)?,
        ))
    }

    /// Permissions on a folder (or a node's root folder) in `scope`.
    fn folder_pair(
        &self,
        obj_type: TypeId,
        obj_id: ObjectId,
        channel_id: Option<NodeId>,
        check_type: TypeId,
        language_id: LanguageId,
        scope: ChannelScope,
    ) -> DomainResult<PermissionPair> {
        if self.is_superuser() {
            return Ok(PermissionPair::full());
        }

        let folder_id = if obj_type == object_type::NODE {
            self.directory
                .node(obj_id)?
                .ok_or(DomainError::EntityResolutionFailure {
                    kind: "node",
                    id: obj_id,
                })?
                .root_folder_id
        } else {
            obj_id
        };
        let folder = self
            .directory
            .folder(folder_id, channel_id)?
            .ok_or(DomainError::EntityResolutionFailure {
                kind: "folder",
                id: folder_id,
            })?;

        let perm_type = if folder.is_root {
            object_type::NODE
        } else {
            object_type::FOLDER
        };
        let perm_id = if self.config.multichannelling() {
            folder.master_id
        } else {
            folder.id
        };

        let nodes = match scope {
            ChannelScope::Own => vec![folder.node_id],
            ChannelScope::Channel(node_id) => vec![node_id],
            ChannelScope::AnyChannel => {
                let mut nodes = vec![folder.node_id];
                nodes.extend(self.directory.derived_channels(folder.node_id)?);
                nodes
            }
        };
        let mut groups = BTreeSet::new();
        for node_id in nodes {
            groups.extend(self.group_ids(node_id)?.iter().copied());
        }
        let groups: Vec<GroupId> = groups.into_iter().collect();

        self.cache
            .merged_permissions(&groups, perm_type, perm_id, check_type, language_id)
    }

    /// Turns storage failures of a boolean check into a denial.
    fn fail_closed(&self, action: &'static str, result: DomainResult<bool>) -> DomainResult<bool> {
        match result {
            Err(DomainError::Storage(error)) => {
                warn!(action, session = ?self.session, %error, "permission check failed, denying");
                Ok(false)
            }
            other => other,
        }
    }
}

impl PermissionCheck for PermissionResolver {
    fn check_type_bit(&self, obj_type: TypeId, obj_id: Option<ObjectId>, bit: Bit) -> bool {
        match self.permissions(obj_type, obj_id, obj_type, 0) {
            Ok(pair) => pair.check_group(bit),
            Err(error) => {
                warn!(obj_type, ?obj_id, %error, "type permission check failed, denying");
                false
            }
        }
    }

    fn is_superuser(&self) -> bool {
        PermissionResolver::is_superuser(self)
    }
}

impl std::fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("session", &self.session)
            .field("scope", &self.scope)
            .field("config", &self.config)
            .finish()
    }
}

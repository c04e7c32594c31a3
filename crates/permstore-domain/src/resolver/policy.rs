//! Per-object-kind permission policy.
//!
//! Every decision dispatches over the closed set of [`PermObject`] kinds.
//! Editing, deleting, publishing and setting permissions all require the
//! object to be viewable first.

use tracing::instrument;

use super::{ChannelScope, PermissionResolver};
use crate::error::DomainResult;
use crate::model::perm::{admin, folder, group, item, objprop, page, role, template};
use crate::model::{
    object_type, perm, Bit, LanguageId, NodeId, ObjectClass, ObjectId, PermObject, TagOwner,
    TypeId, UserId,
};

/// Bits checked for one action on page-like objects: group bit, role bit.
type ContentBits = (Bit, Bit);

const CONTENT_VIEW: ContentBits = (page::VIEW, role::VIEW);
const CONTENT_UPDATE: ContentBits = (page::UPDATE, role::UPDATE);
const CONTENT_DELETE: ContentBits = (page::DELETE, role::DELETE);
const CONTENT_CREATE: ContentBits = (page::CREATE, role::CREATE);
const CONTENT_PUBLISH: ContentBits = (page::PUBLISH, role::PUBLISH);

impl PermissionResolver {
    /// Checks whether the caller may view `obj`.
    #[instrument(skip(self), level = "debug", ret)]
    pub fn can_view(&self, obj: &PermObject) -> DomainResult<bool> {
        self.fail_closed("view", self.view_in(obj, self.scope))
    }

    /// Checks whether the caller may edit `obj`.
    #[instrument(skip(self), level = "debug", ret)]
    pub fn can_edit(&self, obj: &PermObject) -> DomainResult<bool> {
        self.fail_closed("edit", self.edit_in(obj, self.scope))
    }

    /// Checks whether the caller may delete `obj`.
    ///
    /// With `switch_to_object_channel` set, a channel-local object is
    /// checked in its own channel instead of the caller's current scope.
    #[instrument(skip(self), level = "debug", ret)]
    pub fn can_delete(&self, obj: &PermObject, switch_to_object_channel: bool) -> DomainResult<bool> {
        let scope = match (switch_to_object_channel, obj.channel_id()) {
            (true, Some(channel_id)) => ChannelScope::Channel(channel_id),
            _ => self.scope,
        };
        self.fail_closed("delete", self.delete_in(obj, scope))
    }

    /// Checks whether the caller may publish `obj`. Only pages can be published.
    #[instrument(skip(self), level = "debug", ret)]
    pub fn can_publish(&self, obj: &PermObject) -> DomainResult<bool> {
        self.fail_closed("publish", self.publish_in(obj, self.scope))
    }

    /// Checks whether the caller may change the permissions of `obj`.
    #[instrument(skip(self), level = "debug", ret)]
    pub fn can_set_perms(&self, obj: &PermObject) -> DomainResult<bool> {
        self.fail_closed("set_perms", self.set_perms_in(obj, self.scope))
    }

    /// Checks whether the caller may create an object of `class` in a folder.
    ///
    /// `language_id` selects the role permissions for pages.
    #[instrument(skip(self), level = "debug", ret)]
    pub fn can_create(
        &self,
        class: ObjectClass,
        folder_id: ObjectId,
        language_id: LanguageId,
    ) -> DomainResult<bool> {
        self.fail_closed("create", self.create_in(class, folder_id, language_id, self.scope))
    }

    fn view_in(&self, obj: &PermObject, scope: ChannelScope) -> DomainResult<bool> {
        if self.is_superuser() {
            return Ok(true);
        }
        match obj {
            PermObject::Folder { id, channel_id } => {
                self.folder_check(object_type::FOLDER, *id, *channel_id, perm::VIEW, scope)
            }
            PermObject::Node { id } => {
                self.folder_check(object_type::NODE, *id, None, perm::VIEW, scope)
            }
            PermObject::Page { .. } | PermObject::File { .. } | PermObject::Image { .. } => {
                self.content_check(obj, CONTENT_VIEW, scope)
            }
            PermObject::Template { id } => self.template_check(*id, template::VIEW, scope),
            PermObject::Construct { id } => self.construct_visible(*id, scope),
            PermObject::ObjectTag { name, owner } => self.objtag_check(name, *owner, perm::VIEW, scope),
            PermObject::SystemUser { id } => {
                if self.user_id() == Some(*id) {
                    return Ok(true);
                }
                self.user_check(*id, perm::VIEW)
            }
            PermObject::UserGroup { id } => {
                if self.group_ids(0)?.contains(id) {
                    return Ok(true);
                }
                self.check_group_perm(*id, self.usergroup_bit(perm::VIEW))
            }
            PermObject::Role { id } => self.admin_item_check(
                object_type::ROLE_ADMIN,
                object_type::ROLE,
                *id,
                admin::READ_ALL,
                perm::VIEW,
                scope,
            ),
            PermObject::SchedulerTask { id } => self.admin_item_check(
                object_type::SCHEDULER_ADMIN,
                object_type::SCHEDULER_TASK,
                *id,
                admin::READ_ALL,
                perm::VIEW,
                scope,
            ),
            PermObject::SchedulerSchedule { id } => self.admin_item_check(
                object_type::SCHEDULER_ADMIN,
                object_type::SCHEDULER_SCHEDULE,
                *id,
                admin::READ_ALL,
                perm::VIEW,
                scope,
            ),
        }
    }

    fn edit_in(&self, obj: &PermObject, scope: ChannelScope) -> DomainResult<bool> {
        if self.is_superuser() {
            return Ok(true);
        }
        if !self.view_in(obj, scope)? {
            return Ok(false);
        }
        match obj {
            PermObject::Folder { id, channel_id } => {
                self.folder_check(object_type::FOLDER, *id, *channel_id, folder::UPDATE, scope)
            }
            PermObject::Node { id } => {
                self.folder_check(object_type::NODE, *id, None, folder::UPDATE, scope)
            }
            PermObject::Page { .. } | PermObject::File { .. } | PermObject::Image { .. } => {
                self.content_check(obj, CONTENT_UPDATE, scope)
            }
            PermObject::Template { id } => self.template_check(*id, template::UPDATE, scope),
            PermObject::Construct { .. } => self.type_bit(object_type::CONSTRUCT_ADMIN, item::UPDATE),
            PermObject::ObjectTag { name, owner } => {
                self.objtag_check(name, *owner, objprop::UPDATE, scope)
            }
            PermObject::SystemUser { id } => {
                if self.user_id() == Some(*id) {
                    return Ok(true);
                }
                self.user_check(*id, group::USER_UPDATE)
            }
            PermObject::UserGroup { id } => {
                self.check_group_perm(*id, self.usergroup_bit(group::UPDATE))
            }
            PermObject::Role { id } => self.admin_item_check(
                object_type::ROLE_ADMIN,
                object_type::ROLE,
                *id,
                admin::UPDATE_ALL,
                item::UPDATE,
                scope,
            ),
            PermObject::SchedulerTask { id } => self.admin_item_check(
                object_type::SCHEDULER_ADMIN,
                object_type::SCHEDULER_TASK,
                *id,
                admin::UPDATE_ALL,
                item::UPDATE,
                scope,
            ),
            PermObject::SchedulerSchedule { id } => self.admin_item_check(
                object_type::SCHEDULER_ADMIN,
                object_type::SCHEDULER_SCHEDULE,
                *id,
                admin::UPDATE_ALL,
                item::UPDATE,
                scope,
            ),
        }
    }

    fn delete_in(&self, obj: &PermObject, scope: ChannelScope) -> DomainResult<bool> {
        if self.is_superuser() {
            return Ok(true);
        }
        if !self.view_in(obj, scope)? {
            return Ok(false);
        }
        match obj {
            PermObject::Folder { id, channel_id } => {
                self.folder_check(object_type::FOLDER, *id, *channel_id, folder::DELETE, scope)
            }
            PermObject::Node { id } => {
                self.folder_check(object_type::NODE, *id, None, folder::DELETE, scope)
            }
            PermObject::Page { .. } | PermObject::File { .. } | PermObject::Image { .. } => {
                self.content_check(obj, CONTENT_DELETE, scope)
            }
            PermObject::Template { id } => self.template_check(*id, template::DELETE, scope),
            PermObject::Construct { .. } => self.type_bit(object_type::CONSTRUCT_ADMIN, item::DELETE),
            PermObject::ObjectTag { name, owner } => {
                self.objtag_check(name, *owner, objprop::UPDATE, scope)
            }
            PermObject::SystemUser { id } => self.user_check(*id, group::USER_DELETE),
            PermObject::UserGroup { id } => {
                self.check_group_perm(*id, self.usergroup_bit(group::DELETE))
            }
            PermObject::Role { id } => self.admin_item_check(
                object_type::ROLE_ADMIN,
                object_type::ROLE,
                *id,
                admin::UPDATE_ALL,
                item::DELETE,
                scope,
            ),
            PermObject::SchedulerTask { id } => self.admin_item_check(
                object_type::SCHEDULER_ADMIN,
                object_type::SCHEDULER_TASK,
                *id,
                admin::UPDATE_ALL,
                item::DELETE,
                scope,
            ),
            PermObject::SchedulerSchedule { id } => self.admin_item_check(
                object_type::SCHEDULER_ADMIN,
                object_type::SCHEDULER_SCHEDULE,
                *id,
                admin::UPDATE_ALL,
                item::DELETE,
                scope,
            ),
        }
    }

    fn publish_in(&self, obj: &PermObject, scope: ChannelScope) -> DomainResult<bool> {
        if !matches!(obj, PermObject::Page { .. }) {
            return Ok(false);
        }
        if self.is_superuser() {
            return Ok(true);
        }
        Ok(self.view_in(obj, scope)? && self.content_check(obj, CONTENT_PUBLISH, scope)?)
    }

    fn set_perms_in(&self, obj: &PermObject, scope: ChannelScope) -> DomainResult<bool> {
        if self.is_superuser() {
            return Ok(true);
        }
        if !self.view_in(obj, scope)? {
            return Ok(false);
        }
        match obj {
            PermObject::Folder { id, channel_id } => {
                self.folder_check(object_type::FOLDER, *id, *channel_id, perm::CHANGE_PERM, scope)
            }
            PermObject::Node { id } => {
                self.folder_check(object_type::NODE, *id, None, perm::CHANGE_PERM, scope)
            }
            PermObject::Construct { id } => Ok(self
                .pair_in(object_type::CONSTRUCT, Some(*id), object_type::CONSTRUCT, 0, scope)?
                .check_group(perm::CHANGE_PERM)),
            PermObject::UserGroup { id } => {
                self.check_group_perm(*id, self.usergroup_bit(perm::CHANGE_PERM))
            }
            PermObject::Role { id } => self.admin_item_check(
                object_type::ROLE_ADMIN,
                object_type::ROLE,
                *id,
                admin::UPDATE_ALL,
                perm::CHANGE_PERM,
                scope,
            ),
            PermObject::SchedulerTask { id } => self.admin_item_check(
                object_type::SCHEDULER_ADMIN,
                object_type::SCHEDULER_TASK,
                *id,
                admin::UPDATE_ALL,
                perm::CHANGE_PERM,
                scope,
            ),
            PermObject::SchedulerSchedule { id } => self.admin_item_check(
                object_type::SCHEDULER_ADMIN,
                object_type::SCHEDULER_SCHEDULE,
                *id,
                admin::UPDATE_ALL,
                perm::CHANGE_PERM,
                scope,
            ),
            // permissions of these are set on their folder or definition
            PermObject::Page { .. }
            | PermObject::File { .. }
            | PermObject::Image { .. }
            | PermObject::Template { .. }
            | PermObject::ObjectTag { .. }
            | PermObject::SystemUser { .. } => Ok(false),
        }
    }

    fn create_in(
        &self,
        class: ObjectClass,
        folder_id: ObjectId,
        language_id: LanguageId,
        scope: ChannelScope,
    ) -> DomainResult<bool> {
        if self.is_superuser() {
            return Ok(true);
        }
        let check_type = class.obj_type();
        let pair = self.folder_pair(
            object_type::FOLDER,
            folder_id,
            None,
            check_type,
            language_id,
            scope,
        )?;
        if !pair.check_group(perm::VIEW) {
            return Ok(false);
        }
        Ok(match class {
            ObjectClass::Folder => pair.check_group(folder::CREATE),
            ObjectClass::Template => pair.check_group(template::CREATE),
            ObjectClass::Page | ObjectClass::File | ObjectClass::Image => {
                pair.check_bits(Some(CONTENT_CREATE.0), Some(CONTENT_CREATE.1))
            }
        })
    }

    // ============================================================
    // Shared checks
    // ============================================================

    fn type_bit(&self, obj_type: TypeId, bit: Bit) -> DomainResult<bool> {
        Ok(self.type_pair(obj_type)?.check_group(bit))
    }

    fn folder_check(
        &self,
        obj_type: TypeId,
        obj_id: ObjectId,
        channel_id: Option<NodeId>,
        bit: Bit,
        scope: ChannelScope,
    ) -> DomainResult<bool> {
        Ok(self
            .folder_pair(obj_type, obj_id, channel_id, obj_type, 0, scope)?
            .check_group(bit))
    }

    /// Pages, files and images: folder-scoped group bit or role bit.
    fn content_check(
        &self,
        obj: &PermObject,
        (group_bit, role_bit): ContentBits,
        scope: ChannelScope,
    ) -> DomainResult<bool> {
        let (folder_id, channel_id, language_id) = match obj {
            PermObject::Page {
                folder_id,
                language_id,
                channel_id,
                ..
            } => (*folder_id, *channel_id, *language_id),
            PermObject::File {
                folder_id,
                channel_id,
                ..
            }
            | PermObject::Image {
                folder_id,
                channel_id,
                ..
            } => (*folder_id, *channel_id, 0),
            _ => return Ok(false),
        };
        let pair = self.folder_pair(
            object_type::FOLDER,
            folder_id,
            channel_id,
            obj.obj_type(),
            language_id,
            scope,
        )?;
        Ok(pair.check_bits(Some(group_bit), Some(role_bit)))
    }

    /// Templates: the bit must hold on any linked folder.
    ///
    /// A template linked to no folder falls back to the devtools view
    /// permission so that it stays manageable.
    fn template_check(&self, template_id: ObjectId, bit: Bit, scope: ChannelScope) -> DomainResult<bool> {
        let folders = self.directory.template_folders(template_id)?;
        if folders.is_empty() {
            return self.type_bit(object_type::DEVTOOL_ADMIN, perm::VIEW);
        }
        for folder_id in folders {
            let pair = self.folder_pair(
                object_type::FOLDER,
                folder_id,
                None,
                object_type::TEMPLATE,
                0,
                scope,
            )?;
            if pair.check_group(bit) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Constructs are visible through any assigned node, or everywhere when
    /// assigned to none.
    fn construct_visible(&self, construct_id: ObjectId, scope: ChannelScope) -> DomainResult<bool> {
        let nodes = self.directory.construct_nodes(construct_id)?;
        if nodes.is_empty() {
            return Ok(true);
        }
        for node_id in nodes {
            if self.folder_check(object_type::NODE, node_id, None, perm::VIEW, scope)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Object tags: the bit on the tag's definition.
    ///
    /// Definitions on folders (and templates, for pages) pass their
    /// permission down to the pages and files they contain.
    fn objtag_check(
        &self,
        name: &str,
        owner: TagOwner,
        bit: Bit,
        scope: ChannelScope,
    ) -> DomainResult<bool> {
        if self.definition_check(owner.obj_type(), name, bit, scope)? {
            return Ok(true);
        }
        match owner {
            TagOwner::Page => Ok(self.definition_check(object_type::FOLDER, name, bit, scope)?
                || self.definition_check(object_type::TEMPLATE, name, bit, scope)?),
            TagOwner::File | TagOwner::Image => {
                self.definition_check(object_type::FOLDER, name, bit, scope)
            }
            TagOwner::Folder | TagOwner::Template => Ok(false),
        }
    }

    fn definition_check(
        &self,
        owner_type: TypeId,
        name: &str,
        bit: Bit,
        scope: ChannelScope,
    ) -> DomainResult<bool> {
        match self.directory.objtag_definition(owner_type, name)? {
            Some(definition_id) => Ok(self
                .pair_in(
                    object_type::OBJTAG_DEF,
                    Some(definition_id),
                    object_type::OBJTAG_DEF,
                    0,
                    scope,
                )?
                .check_group(bit)),
            None => Ok(false),
        }
    }

    /// Users: type-level user admin view, then the user's groups must all
    /// lie below groups granting `bit` to the caller.
    fn user_check(&self, user_id: UserId, bit: Bit) -> DomainResult<bool> {
        if !self.type_bit(object_type::USER_ADMIN, perm::VIEW)? {
            return Ok(false);
        }
        let targets: Vec<_> = self
            .directory
            .user_groups(user_id)?
            .into_iter()
            .map(|membership| membership.group_id)
            .collect();
        self.subgroup_check(&targets, self.usergroup_bit(bit))
    }

    /// Roles and scheduler items: the admin type's view bit, then either the
    /// admin-wide `all_bit` or `item_bit` on the item itself.
    fn admin_item_check(
        &self,
        admin_type: TypeId,
        item_type: TypeId,
        item_id: ObjectId,
        all_bit: Bit,
        item_bit: Bit,
        scope: ChannelScope,
    ) -> DomainResult<bool> {
        let admin = self.type_pair(admin_type)?;
        if !admin.check_group(perm::VIEW) {
            return Ok(false);
        }
        if admin.check_group(all_bit) {
            return Ok(true);
        }
        Ok(self
            .pair_in(item_type, Some(item_id), item_type, 0, scope)?
            .check_group(item_bit))
    }
}

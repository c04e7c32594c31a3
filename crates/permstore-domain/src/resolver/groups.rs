//! Group hierarchy checks.
//!
//! Permission on a group cascades downward: a caller may manage a group only
//! through a granting group that is a strict ancestor of it.

use std::collections::HashSet;

use tracing::warn;

use super::PermissionResolver;
use crate::error::DomainResult;
use crate::model::{object_type, perm, Bit, GroupId};

impl PermissionResolver {
    /// Strict ancestors of a group, nearest first.
    ///
    /// A cycle in the parent chain ends the walk.
    pub fn group_ancestors(&self, group_id: GroupId) -> DomainResult<Vec<GroupId>> {
        let mut ancestors = Vec::new();
        let mut seen = HashSet::from([group_id]);
        let mut current = group_id;
        while let Some(parent) = self.directory.group_parent(current)? {
            if !seen.insert(parent) {
                warn!(group_id, parent, "cycle in group hierarchy");
                break;
            }
            ancestors.push(parent);
            current = parent;
        }
        Ok(ancestors)
    }

    /// Checks a permission on another group.
    ///
    /// Superusers always pass. Otherwise the caller needs the type-level
    /// view permission on groups, and `group_id` must be a strict descendant
    /// of a group the caller belongs to for which `checker` holds.
    pub fn check_group_perm<F>(&self, group_id: GroupId, checker: F) -> DomainResult<bool>
    where
        F: Fn(GroupId) -> DomainResult<bool>,
    {
        if self.is_superuser() {
            return Ok(true);
        }
        if !self
            .type_pair(object_type::GROUP_ADMIN)?
            .check_group(perm::VIEW)
        {
            return Ok(false);
        }
        self.subgroup_check(&[group_id], checker)
    }

    /// Checks that every target group lies below a granting group.
    ///
    /// Targets are reduced to their deepest members and the caller's
    /// granting groups to their top-most members. Each remaining target
    /// needs a remaining granting group among its strict ancestors. An empty
    /// target set is never granted.
    pub(crate) fn subgroup_check<F>(&self, targets: &[GroupId], checker: F) -> DomainResult<bool>
    where
        F: Fn(GroupId) -> DomainResult<bool>,
    {
        if targets.is_empty() {
            return Ok(false);
        }

        let mut granting = Vec::new();
        for group_id in self.group_ids(0)?.iter() {
            if checker(*group_id)? {
                granting.push(*group_id);
            }
        }
        if granting.is_empty() {
            return Ok(false);
        }

        let target_ancestors = self.ancestor_sets(targets)?;
        let granting_ancestors = self.ancestor_sets(&granting)?;

        let deepest_targets = targets.iter().filter(|target| {
            !target_ancestors
                .iter()
                .any(|(_, ancestors)| ancestors.contains(*target))
        });
        let topmost_granting: HashSet<GroupId> = granting_ancestors
            .iter()
            .filter(|(_, ancestors)| !granting.iter().any(|g| ancestors.contains(g)))
            .map(|(group_id, _)| *group_id)
            .collect();

        let mut checked = false;
        for target in deepest_targets {
            checked = true;
            let ancestors = target_ancestors
                .iter()
                .find(|(group_id, _)| group_id == target)
                .map(|(_, ancestors)| ancestors);
            let covered = ancestors
                .is_some_and(|ancestors| ancestors.iter().any(|a| topmost_granting.contains(a)));
            if !covered {
                return Ok(false);
            }
        }
        Ok(checked)
    }

    fn ancestor_sets(&self, groups: &[GroupId]) -> DomainResult<Vec<(GroupId, HashSet<GroupId>)>> {
        groups
            .iter()
            .map(|group_id| {
                let ancestors = self.group_ancestors(*group_id)?;
                Ok((*group_id, ancestors.into_iter().collect()))
            })
            .collect()
    }

    /// Checker testing the caller's `bit` on a usergroup.
    pub(crate) fn usergroup_bit(&self, bit: Bit) -> impl Fn(GroupId) -> DomainResult<bool> + '_ {
        move |group_id| {
            Ok(self
                .pair_in(
                    object_type::USERGROUP,
                    Some(group_id),
                    object_type::USERGROUP,
                    0,
                    self.scope,
                )?
                .check_group(bit))
        }
    }
}

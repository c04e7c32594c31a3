//! In-memory permission cache.
//!
//! The cache mirrors the permission tables of a [`PermissionSource`]:
//!
//! - `group -> (type, object) -> Permissions`
//! - `group -> (type, object) -> {role}`
//! - `role -> RolePermissions`
//!
//! # Concurrency
//!
//! Reads go straight to `DashMap` shards and never wait on a refresh. A
//! refresh replaces whole values: a group refresh swaps the group's sub-map,
//! an object refresh replaces single entries and role sets are replaced
//! rather than edited. A reader sees either the old or the new value for a
//! key. The permission map and the role-assignment map are updated one after
//! the other, so for a short window one of them can already reflect new
//! data while the other does not.
//!
//! `initialize` is serialized by a mutex.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use permstore_domain::cache::{CacheConfig, PermissionCache};
//! use permstore_storage::MemoryPermissionSource;
//!
//! let source = MemoryPermissionSource::new_shared();
//! source.set_permission(2, 10002, 5, "11000000111111111111111111111111")?;
//!
//! let cache = PermissionCache::new(source, CacheConfig::default());
//! cache.initialize(false)?;
//!
//! let pair = cache.merged_permissions(&[2], 10002, 5, 10002, 0)?;
//! assert!(pair.check_bits(Some(0), None));
//! ```

mod consistency;
mod listener;

pub use consistency::ConsistencyReport;
pub use listener::{ListenerError, PermissionChange, PermissionStoreListener};

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use dashmap::DashMap;
use permstore_storage::PermissionSource;
use tracing::{debug, info, instrument, warn};

use crate::error::{DomainError, DomainResult};
use crate::model::{
    object_type, Bit, Feature, FeatureSet, GroupId, LanguageId, ObjectId, PermissionPair,
    Permissions, RoleId, RolePermissions, TypeId,
};

type ObjectKey = (TypeId, ObjectId);
type PermissionMap = DashMap<ObjectKey, Permissions>;
type RoleAssignmentMap = DashMap<ObjectKey, Arc<BTreeSet<RoleId>>>;

/// Configuration for the permission cache.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Whether role permissions are overlaid on page/file permissions.
    pub role_permissions_enabled: bool,
}

impl CacheConfig {
    /// Derives the cache settings from the enabled features.
    pub fn from_features(features: &FeatureSet) -> Self {
        Self {
            role_permissions_enabled: features.is_enabled(Feature::RolePermissions),
        }
    }

    /// Enables or disables role permissions.
    pub fn with_role_permissions(mut self, enabled: bool) -> Self {
        self.role_permissions_enabled = enabled;
        self
    }
}

/// Process-wide permission cache.
///
/// Construct one per application context and share it through `Arc`.
/// Every query fails with [`DomainError::NotInitialized`] until
/// [`initialize`](Self::initialize) succeeded.
pub struct PermissionCache {
    source: Arc<dyn PermissionSource>,
    config: CacheConfig,
    permissions: DashMap<GroupId, Arc<PermissionMap>>,
    role_assignments: DashMap<GroupId, Arc<RoleAssignmentMap>>,
    roles: DashMap<RoleId, Arc<RolePermissions>>,
    listeners: RwLock<Vec<Arc<dyn PermissionStoreListener>>>,
    initialized: AtomicBool,
    init_lock: Mutex<()>,
}

impl PermissionCache {
    /// Creates an empty, uninitialized cache over `source`.
    pub fn new(source: Arc<dyn PermissionSource>, config: CacheConfig) -> Self {
        Self {
            source,
            config,
            permissions: DashMap::new(),
            role_assignments: DashMap::new(),
            roles: DashMap::new(),
            listeners: RwLock::new(Vec::new()),
            initialized: AtomicBool::new(false),
            init_lock: Mutex::new(()),
        }
    }

    /// Returns the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns whether `initialize` has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Loads every group and role from storage.
    ///
    /// Does nothing when already initialized unless `force` is set. A forced
    /// rebuild replaces each group's sub-maps one by one and then drops
    /// groups and roles that no longer exist in storage.
    ///
    /// # Errors
    ///
    /// Storage failures and malformed bit strings are returned. On error the
    /// cache keeps its previous initialization state.
    pub fn initialize(&self, force: bool) -> DomainResult<()> {
        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_initialized() && !force {
            return Ok(());
        }

        let group_ids = self.source.group_ids()?;
        for &group_id in &group_ids {
            let perms = self.load_group_permissions(group_id)?;
            let roles = self.load_group_roles(group_id)?;
            self.permissions.insert(group_id, Arc::new(perms));
            self.role_assignments.insert(group_id, Arc::new(roles));
        }
        let live_groups: HashSet<GroupId> = group_ids.iter().copied().collect();
        self.permissions.retain(|group_id, _| live_groups.contains(group_id));
        self.role_assignments
            .retain(|group_id, _| live_groups.contains(group_id));

        let role_ids = self.source.role_ids()?;
        for &role_id in &role_ids {
            self.roles.insert(role_id, Arc::new(self.load_role(role_id)?));
        }
        let live_roles: HashSet<RoleId> = role_ids.iter().copied().collect();
        self.roles.retain(|role_id, _| live_roles.contains(role_id));

        self.initialized.store(true, Ordering::Release);
        let entries = self.entry_count();
        metrics::gauge!("permstore_cache_entries").set(entries as f64);
        info!(
            groups = group_ids.len(),
            roles = role_ids.len(),
            entries,
            "permission cache initialized"
        );
        Ok(())
    }

    /// Drops all cached data and returns to the uninitialized state.
    pub fn reset(&self) {
        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.initialized.store(false, Ordering::Release);
        self.permissions.clear();
        self.role_assignments.clear();
        self.roles.clear();
        metrics::gauge!("permstore_cache_entries").set(0.0);
        debug!("permission cache reset");
    }

    /// Registers a listener. Listeners are notified in registration order.
    pub fn add_listener(&self, listener: Arc<dyn PermissionStoreListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    // ============================================================
    // Refresh and removal
    // ============================================================

    /// Reloads the permission and role-assignment maps of one group.
    #[instrument(skip(self))]
    pub fn refresh_group(&self, group_id: GroupId) -> DomainResult<()> {
        self.ensure_initialized()?;
        let perms = self.load_group_permissions(group_id)?;
        let roles = self.load_group_roles(group_id)?;
        debug!(
            entries = perms.len(),
            assignments = roles.len(),
            "refreshed group"
        );
        self.permissions.insert(group_id, Arc::new(perms));
        self.role_assignments.insert(group_id, Arc::new(roles));
        self.finish(PermissionChange::GroupRefreshed(group_id));
        Ok(())
    }

    /// Reloads one object's entries across all groups.
    ///
    /// Runs two passes: first the permission map is updated for every group,
    /// then the role assignments. Readers may observe the window between the
    /// passes. Both are loaded from storage before either pass starts, so a
    /// storage failure leaves the cache untouched.
    #[instrument(skip(self))]
    pub fn refresh_object(&self, obj_type: TypeId, obj_id: ObjectId) -> DomainResult<()> {
        self.ensure_initialized()?;
        let key = (obj_type, obj_id);

        let mut stored: HashMap<GroupId, Permissions> = HashMap::new();
        for row in self.source.object_permissions(obj_type, obj_id)? {
            if let Some(perms) = Permissions::parse(&row.bits)? {
                stored.insert(row.group_id, perms);
            }
        }
        let mut assigned: HashMap<GroupId, BTreeSet<RoleId>> = HashMap::new();
        for row in self.source.object_role_assignments(obj_type, obj_id)? {
            assigned.entry(row.group_id).or_default().insert(row.role_id);
        }

        for entry in self.permissions.iter() {
            if !stored.contains_key(entry.key()) {
                entry.value().remove(&key);
            }
        }
        for (group_id, perms) in &stored {
            self.group_permission_map(*group_id).insert(key, *perms);
        }

        for entry in self.role_assignments.iter() {
            if !assigned.contains_key(entry.key()) {
                entry.value().remove(&key);
            }
        }
        for (group_id, roles) in assigned {
            self.group_role_map(group_id).insert(key, Arc::new(roles));
        }

        debug!(groups = stored.len(), "refreshed object");
        self.finish(PermissionChange::ObjectRefreshed { obj_type, obj_id });
        Ok(())
    }

    /// Rebuilds one role's permission bundle from storage.
    #[instrument(skip(self))]
    pub fn refresh_role(&self, role_id: RoleId) -> DomainResult<()> {
        self.ensure_initialized()?;
        let role = self.load_role(role_id)?;
        debug!(empty = role.is_empty(), "refreshed role");
        self.roles.insert(role_id, Arc::new(role));
        self.finish(PermissionChange::RoleRefreshed(role_id));
        Ok(())
    }

    /// Drops every entry of a group.
    pub fn remove_group(&self, group_id: GroupId) -> DomainResult<()> {
        self.ensure_initialized()?;
        self.permissions.remove(&group_id);
        self.role_assignments.remove(&group_id);
        self.finish(PermissionChange::GroupRemoved(group_id));
        Ok(())
    }

    /// Drops one object's entries from every group.
    pub fn remove_object(&self, obj_type: TypeId, obj_id: ObjectId) -> DomainResult<()> {
        self.ensure_initialized()?;
        let key = (obj_type, obj_id);
        for entry in self.permissions.iter() {
            entry.value().remove(&key);
        }
        for entry in self.role_assignments.iter() {
            entry.value().remove(&key);
        }
        self.finish(PermissionChange::ObjectRemoved { obj_type, obj_id });
        Ok(())
    }

    /// Drops a role and purges it from every role-assignment set.
    ///
    /// Sets left empty are removed.
    pub fn remove_role(&self, role_id: RoleId) -> DomainResult<()> {
        self.ensure_initialized()?;
        self.roles.remove(&role_id);
        for entry in self.role_assignments.iter() {
            entry.value().retain(|_, roles| {
                if roles.contains(&role_id) {
                    let mut remaining = BTreeSet::clone(roles);
                    remaining.remove(&role_id);
                    *roles = Arc::new(remaining);
                }
                !roles.is_empty()
            });
        }
        self.finish(PermissionChange::RoleRemoved(role_id));
        Ok(())
    }

    // ============================================================
    // Queries
    // ============================================================

    /// Cached permissions of one group on one object.
    pub fn permissions(
        &self,
        group_id: GroupId,
        obj_type: TypeId,
        obj_id: ObjectId,
    ) -> DomainResult<Option<Permissions>> {
        self.ensure_initialized()?;
        Ok(self.lookup(group_id, (obj_type, obj_id)))
    }

    /// Roles assigned to one group on one object.
    pub fn assigned_roles(
        &self,
        group_id: GroupId,
        obj_type: TypeId,
        obj_id: ObjectId,
    ) -> DomainResult<Option<Arc<BTreeSet<RoleId>>>> {
        self.ensure_initialized()?;
        Ok(self.lookup_roles(group_id, (obj_type, obj_id)))
    }

    /// Permission bundle of a role; the empty bundle for unknown roles.
    pub fn role_permissions(&self, role_id: RoleId) -> DomainResult<Arc<RolePermissions>> {
        self.ensure_initialized()?;
        Ok(self
            .roles
            .get(&role_id)
            .map(|role| Arc::clone(role.value()))
            .unwrap_or_default())
    }

    /// Ids of all cached groups, sorted.
    pub fn group_ids(&self) -> DomainResult<Vec<GroupId>> {
        self.ensure_initialized()?;
        let mut ids: Vec<GroupId> = self.permissions.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Number of cached `(group, type, object)` permission entries.
    pub fn entry_count(&self) -> usize {
        self.permissions.iter().map(|e| e.value().len()).sum()
    }

    /// Merges the type-level permissions of `group_ids` on `obj_type`.
    ///
    /// Type-level permissions are the rows stored with object id
    /// [`object_type::TYPE_LEVEL_ID`].
    pub fn merged_type_permissions(
        &self,
        group_ids: &[GroupId],
        obj_type: TypeId,
    ) -> DomainResult<Option<Permissions>> {
        self.ensure_initialized()?;
        let key = (obj_type, object_type::TYPE_LEVEL_ID);
        Ok(Permissions::merge(
            group_ids.iter().map(|group_id| self.lookup(*group_id, key)),
        ))
    }

    /// Merges the permissions of `group_ids` on one object.
    ///
    /// The role side is only computed when role permissions are enabled and
    /// `check_type` is a page, file or image. Pages use the roles' page
    /// permissions for `language_id` merged with their all-languages entry,
    /// files and images the roles' file permissions.
    pub fn merged_permissions(
        &self,
        group_ids: &[GroupId],
        obj_type: TypeId,
        obj_id: ObjectId,
        check_type: TypeId,
        language_id: LanguageId,
    ) -> DomainResult<PermissionPair> {
        self.ensure_initialized()?;
        let key = (obj_type, obj_id);
        let group = Permissions::merge(group_ids.iter().map(|g| self.lookup(*g, key)));
        let role = if self.config.role_permissions_enabled && object_type::supports_roles(check_type)
        {
            self.role_side(group_ids, key, check_type, language_id)
        } else {
            None
        };
        Ok(PermissionPair::new(group, role))
    }

    /// Groups whose own permissions satisfy the check on one object.
    ///
    /// Each group is evaluated alone with the same group/role union as
    /// [`merged_permissions`](Self::merged_permissions).
    pub fn groups_with_perm(
        &self,
        obj_type: TypeId,
        obj_id: ObjectId,
        group_bit: Option<Bit>,
        role_bit: Option<Bit>,
        check_type: TypeId,
        language_id: LanguageId,
    ) -> DomainResult<BTreeSet<GroupId>> {
        self.ensure_initialized()?;
        let mut candidates: BTreeSet<GroupId> =
            self.permissions.iter().map(|e| *e.key()).collect();
        candidates.extend(self.role_assignments.iter().map(|e| *e.key()));

        let mut granted = BTreeSet::new();
        for group_id in candidates {
            let pair =
                self.merged_permissions(&[group_id], obj_type, obj_id, check_type, language_id)?;
            if pair.check_bits(group_bit, role_bit) {
                granted.insert(group_id);
            }
        }
        Ok(granted)
    }

    // ============================================================
    // Internals
    // ============================================================

    fn ensure_initialized(&self) -> DomainResult<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(DomainError::NotInitialized)
        }
    }

    fn lookup(&self, group_id: GroupId, key: ObjectKey) -> Option<Permissions> {
        self.permissions
            .get(&group_id)
            .and_then(|map| map.get(&key).map(|perms| *perms))
    }

    fn lookup_roles(&self, group_id: GroupId, key: ObjectKey) -> Option<Arc<BTreeSet<RoleId>>> {
        self.role_assignments
            .get(&group_id)
            .and_then(|map| map.get(&key).map(|roles| Arc::clone(roles.value())))
    }

    fn role_side(
        &self,
        group_ids: &[GroupId],
        key: ObjectKey,
        check_type: TypeId,
        language_id: LanguageId,
    ) -> Option<Permissions> {
        let mut role_ids = BTreeSet::new();
        for group_id in group_ids {
            if let Some(roles) = self.lookup_roles(*group_id, key) {
                role_ids.extend(roles.iter().copied());
            }
        }
        Permissions::merge(role_ids.into_iter().map(|role_id| {
            let role = self.roles.get(&role_id)?;
            if check_type == object_type::PAGE {
                role.effective_page_perm(language_id)
            } else {
                role.file_perm()
            }
        }))
    }

    fn group_permission_map(&self, group_id: GroupId) -> Arc<PermissionMap> {
        Arc::clone(&*self.permissions.entry(group_id).or_default())
    }

    fn group_role_map(&self, group_id: GroupId) -> Arc<RoleAssignmentMap> {
        Arc::clone(&*self.role_assignments.entry(group_id).or_default())
    }

    fn load_group_permissions(&self, group_id: GroupId) -> DomainResult<PermissionMap> {
        let map = PermissionMap::new();
        for row in self.source.group_permissions(group_id)? {
            if let Some(perms) = Permissions::parse(&row.bits)? {
                map.insert((row.obj_type, row.obj_id), perms);
            }
        }
        Ok(map)
    }

    fn load_group_roles(&self, group_id: GroupId) -> DomainResult<RoleAssignmentMap> {
        let mut sets: HashMap<ObjectKey, BTreeSet<RoleId>> = HashMap::new();
        for row in self.source.group_role_assignments(group_id)? {
            sets.entry((row.obj_type, row.obj_id))
                .or_default()
                .insert(row.role_id);
        }
        Ok(sets
            .into_iter()
            .map(|(key, roles)| (key, Arc::new(roles)))
            .collect())
    }

    fn load_role(&self, role_id: RoleId) -> DomainResult<RolePermissions> {
        RolePermissions::from_rows(&self.source.role_permissions(role_id)?)
    }

    /// Records metrics and notifies listeners after a local mutation.
    fn finish(&self, change: PermissionChange) {
        let kind = change.kind();
        match change {
            PermissionChange::GroupRemoved(_)
            | PermissionChange::ObjectRemoved { .. }
            | PermissionChange::RoleRemoved(_) => {
                metrics::counter!("permstore_cache_remove_total", "kind" => kind).increment(1);
            }
            _ => {
                metrics::counter!("permstore_cache_refresh_total", "kind" => kind).increment(1);
            }
        }
        metrics::gauge!("permstore_cache_entries").set(self.entry_count() as f64);

        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            if let Err(error) = listener.on_change(change) {
                warn!(?change, %error, "permission store listener failed");
            }
        }
    }
}

impl std::fmt::Debug for PermissionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionCache")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .field("groups", &self.permissions.len())
            .field("roles", &self.roles.len())
            .finish()
    }
}

/// Registers permission cache metric descriptions.
///
/// Call once during startup, after installing a metrics recorder.
///
/// - `permstore_cache_refresh_total` - Refreshes by kind (group/object/role)
/// - `permstore_cache_remove_total` - Removals by kind (group/object/role)
/// - `permstore_cache_entries` - Cached permission entries (gauge)
pub fn register_cache_metrics() {
    metrics::describe_counter!(
        "permstore_cache_refresh_total",
        "Total number of permission cache refreshes"
    );
    metrics::describe_counter!(
        "permstore_cache_remove_total",
        "Total number of permission cache removals"
    );
    metrics::describe_gauge!(
        "permstore_cache_entries",
        "Current number of cached permission entries"
    );
}

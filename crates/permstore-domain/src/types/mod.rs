//! Type permission registry.
//!
//! For every numeric object type the registry knows which bits exist, how
//! types nest, whether a type is active and how its instances are listed.
//! The data lives in the static [`TYPE_TABLE`]; behaviour is attached per
//! type id through the builder:
//!
//! ```rust,ignore
//! let registry = TypeRegistry::builder()
//!     .features(features)
//!     .enumerator(object_type::FOLDER, DirectoryEnumerator::new(directory, object_type::FOLDER))
//!     .checker(object_type::MAINTENANCE, |perms: &dyn PermissionCheck, _bit, _id| {
//!         Some(perms.is_superuser())
//!     })
//!     .build();
//!
//! let folder = registry.get("folder").unwrap();
//! assert_eq!(registry.get("10002").unwrap(), folder);
//! ```

mod directory;
mod strategy;
mod table;

pub use directory::DirectoryEnumerator;
pub use strategy::{BitChecker, InstanceEnumerator, PermissionCheck};
pub use table::{NamedBit, TypeEntry, DEPRECATED_TYPES, TYPE_TABLE};

use std::collections::HashMap;
use std::fmt;
use std::iter;
use std::sync::Arc;

use crate::error::DomainResult;
use crate::model::{object_type, perm, Bit, FeatureSet, NodeId, ObjectId, TypeId, BIT_COUNT};

/// Registry over [`TYPE_TABLE`] with the strategies registered at startup.
pub struct TypeRegistry {
    features: FeatureSet,
    by_name: HashMap<&'static str, &'static TypeEntry>,
    by_type: HashMap<TypeId, &'static TypeEntry>,
    enumerators: HashMap<TypeId, Arc<dyn InstanceEnumerator>>,
    checkers: HashMap<TypeId, Arc<dyn BitChecker>>,
}

/// Builder for [`TypeRegistry`].
#[derive(Default)]
pub struct TypeRegistryBuilder {
    features: FeatureSet,
    enumerators: HashMap<TypeId, Arc<dyn InstanceEnumerator>>,
    checkers: HashMap<TypeId, Arc<dyn BitChecker>>,
}

impl TypeRegistryBuilder {
    /// Sets the enabled features.
    pub fn features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    /// Registers the instance enumerator of a type.
    pub fn enumerator(
        mut self,
        obj_type: TypeId,
        enumerator: impl InstanceEnumerator + 'static,
    ) -> Self {
        self.enumerators.insert(obj_type, Arc::new(enumerator));
        self
    }

    /// Registers a custom bit checker for a type.
    pub fn checker(mut self, obj_type: TypeId, checker: impl BitChecker + 'static) -> Self {
        self.checkers.insert(obj_type, Arc::new(checker));
        self
    }

    pub fn build(self) -> TypeRegistry {
        TypeRegistry {
            features: self.features,
            by_name: TYPE_TABLE.iter().map(|e| (e.name, e)).collect(),
            by_type: TYPE_TABLE.iter().map(|e| (e.obj_type, e)).collect(),
            enumerators: self.enumerators,
            checkers: self.checkers,
        }
    }
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// Registry without strategies.
    pub fn with_defaults(features: FeatureSet) -> Self {
        Self::builder().features(features).build()
    }

    /// Maps alias types onto the type their permissions are stored under.
    pub fn normalize(obj_type: TypeId) -> TypeId {
        object_type::normalize(obj_type)
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Looks a type up by name or by numeric id.
    ///
    /// Numeric ids are normalized first, so `"10003"` finds `folder`.
    pub fn get(&self, key: &str) -> Option<TypeHandle<'_>> {
        match key.trim().parse::<TypeId>() {
            Ok(obj_type) => self.by_type(obj_type),
            Err(_) => self
                .by_name
                .get(key.trim().to_ascii_lowercase().as_str())
                .map(|entry| self.handle(*entry)),
        }
    }

    /// Looks a type up by numeric id after normalization.
    pub fn by_type(&self, obj_type: TypeId) -> Option<TypeHandle<'_>> {
        self.by_type
            .get(&Self::normalize(obj_type))
            .map(|entry| self.handle(*entry))
    }

    /// Types without a parent, in table order.
    pub fn roots(&self, include_inactive: bool) -> Vec<TypeHandle<'_>> {
        TYPE_TABLE
            .iter()
            .filter(|e| e.parent.is_none())
            .map(|e| self.handle(e))
            .filter(|h| include_inactive || h.is_active())
            .collect()
    }

    fn handle(&self, entry: &'static TypeEntry) -> TypeHandle<'_> {
        TypeHandle {
            registry: self,
            entry,
        }
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("features", &self.features)
            .field("types", &self.by_type.len())
            .field("enumerators", &self.enumerators.len())
            .field("checkers", &self.checkers.len())
            .finish()
    }
}

/// A registry entry together with the registry it was looked up in.
#[derive(Clone, Copy)]
pub struct TypeHandle<'a> {
    registry: &'a TypeRegistry,
    entry: &'static TypeEntry,
}

impl PartialEq for TypeHandle<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.registry, other.registry) && self.entry == other.entry
    }
}

impl Eq for TypeHandle<'_> {}

impl fmt::Debug for TypeHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeHandle").field(&self.entry.name).finish()
    }
}

impl<'a> TypeHandle<'a> {
    pub fn entry(&self) -> &'static TypeEntry {
        self.entry
    }

    pub fn name(&self) -> &'static str {
        self.entry.name
    }

    pub fn obj_type(&self) -> TypeId {
        self.entry.obj_type
    }

    pub fn parent(&self) -> Option<TypeHandle<'a>> {
        self.entry.parent.and_then(|name| self.registry.get(name))
    }

    /// Deprecated types and types whose feature is disabled are inactive.
    pub fn is_active(&self) -> bool {
        if DEPRECATED_TYPES.contains(&self.entry.obj_type) {
            return false;
        }
        self.entry
            .feature
            .map_or(true, |feature| self.registry.features.is_enabled(feature))
    }

    /// The type answering permission queries for this one.
    ///
    /// An inactive type with a replacement delegates to it.
    pub fn effective(&self) -> TypeHandle<'a> {
        if self.is_active() {
            return *self;
        }
        self.entry
            .replacement
            .and_then(|name| self.registry.get(name))
            .unwrap_or(*self)
    }

    /// Child types; hierarchical types are their own child.
    pub fn children(&self, include_inactive: bool) -> Vec<TypeHandle<'a>> {
        let own = self.entry.hierarchical.then_some(self.entry);
        own.into_iter()
            .chain(
                TYPE_TABLE
                    .iter()
                    .filter(|e| e.parent == Some(self.entry.name)),
            )
            .map(|e| self.registry.handle(e))
            .filter(|h| include_inactive || h.is_active())
            .collect()
    }

    /// Declared bits, optionally including bits whose features are disabled.
    pub fn bits(&self, include_inactive: bool) -> Vec<&'static NamedBit> {
        self.entry
            .bits
            .iter()
            .filter(|b| include_inactive || b.is_active(&self.registry.features))
            .collect()
    }

    /// Checks whether the caller may view the type or one of its instances.
    ///
    /// A registered checker decides first. Otherwise the type's own view
    /// bit is checked, or the decision is delegated to the parent type.
    /// A type without view bit and without parent is never visible.
    pub fn can_view(&self, perms: &dyn PermissionCheck, obj_id: Option<ObjectId>) -> bool {
        self.effective()
            .check_delegated(perms, perm::VIEW, obj_id, |e| e.view_bit)
    }

    /// Like [`can_view`](Self::can_view) for the change-permission bit.
    pub fn can_set_perms(&self, perms: &dyn PermissionCheck, obj_id: Option<ObjectId>) -> bool {
        self.effective()
            .check_delegated(perms, perm::CHANGE_PERM, obj_id, |e| e.perm_bit)
    }

    fn check_delegated(
        &self,
        perms: &dyn PermissionCheck,
        bit: Bit,
        obj_id: Option<ObjectId>,
        declares: fn(&TypeEntry) -> bool,
    ) -> bool {
        if let Some(checker) = self.registry.checkers.get(&self.entry.obj_type) {
            if let Some(decision) = checker.check(perms, bit, obj_id) {
                return decision;
            }
        }
        if declares(self.entry) {
            return perms.check_type_bit(self.entry.obj_type, obj_id, bit);
        }
        match self.parent() {
            Some(parent) => parent.effective().check_delegated(perms, bit, None, declares),
            None => false,
        }
    }

    /// Instance ids below `parent_id`, in enumeration order.
    ///
    /// Empty for types that are not instantiable or have no enumerator.
    pub fn instance_ids(
        &self,
        parent_id: Option<ObjectId>,
        channel_id: Option<NodeId>,
    ) -> DomainResult<Vec<ObjectId>> {
        if !self.entry.instantiable {
            return Ok(Vec::new());
        }
        match self.registry.enumerators.get(&self.entry.obj_type) {
            Some(enumerator) => enumerator.instance_ids(parent_id, channel_id),
            None => Ok(Vec::new()),
        }
    }

    /// Returns whether a tree node for this type (or instance) can expand.
    ///
    /// True as soon as one active child type has a visible instance, or a
    /// non-instantiable child type is itself visible.
    pub fn has_children(
        &self,
        perms: &dyn PermissionCheck,
        obj_id: Option<ObjectId>,
        channel_id: Option<NodeId>,
    ) -> DomainResult<bool> {
        for child in self.children(false) {
            if child.entry.instantiable {
                for instance in child.instance_ids(obj_id, channel_id)? {
                    if child.can_view(perms, Some(instance)) {
                        return Ok(true);
                    }
                }
            } else if child.can_view(perms, None) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Masks a bit pattern to the bits this type declares.
    ///
    /// Positions of undeclared bits become `.`; a short pattern is padded
    /// with `.` to 32 characters.
    pub fn pattern(&self, perm_string: &str, include_inactive: bool) -> String {
        let declared = self
            .bits(include_inactive)
            .iter()
            .fold(0u32, |mask, b| mask | (1 << b.bit));
        perm_string
            .chars()
            .chain(iter::repeat('.'))
            .take(BIT_COUNT)
            .enumerate()
            .map(|(i, c)| if declared & (1 << i) != 0 { c } else { '.' })
            .collect()
    }
}

//! Static type table.
//!
//! One entry per numeric type: its name, parent, declared bits and flags.
//! The entries form a forest rooted at `admin` and `contentadmin`.

use crate::model::object_type::*;
use crate::model::perm;
use crate::model::{Bit, Feature, FeatureSet, TypeId};

/// A permission bit declared by a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedBit {
    pub bit: Bit,
    pub label_key: &'static str,
    pub description_key: Option<&'static str>,
    pub category_key: Option<&'static str>,
    /// The bit is active only when all of these are enabled.
    pub required_features: &'static [Feature],
}

impl NamedBit {
    const fn new(bit: Bit, label_key: &'static str) -> Self {
        Self {
            bit,
            label_key,
            description_key: None,
            category_key: None,
            required_features: &[],
        }
    }

    const fn described(self, description_key: &'static str) -> Self {
        Self {
            description_key: Some(description_key),
            ..self
        }
    }

    const fn category(self, category_key: &'static str) -> Self {
        Self {
            category_key: Some(category_key),
            ..self
        }
    }

    const fn requires(self, required_features: &'static [Feature]) -> Self {
        Self {
            required_features,
            ..self
        }
    }

    /// Returns whether every required feature is enabled.
    pub fn is_active(&self, features: &FeatureSet) -> bool {
        features.all_enabled(self.required_features)
    }
}

/// Declarative metadata of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeEntry {
    pub name: &'static str,
    pub obj_type: TypeId,
    pub parent: Option<&'static str>,
    pub bits: &'static [NamedBit],
    pub feature: Option<Feature>,
    /// Type that answers permission queries while this one is inactive.
    pub replacement: Option<&'static str>,
    /// Instances can contain instances of the same type.
    pub hierarchical: bool,
    /// Instances are listed through an [`InstanceEnumerator`](super::InstanceEnumerator).
    pub instantiable: bool,
    /// The type declares its own view bit.
    pub view_bit: bool,
    /// The type declares its own change-permission bit.
    pub perm_bit: bool,
}

impl TypeEntry {
    const fn new(
        name: &'static str,
        obj_type: TypeId,
        parent: Option<&'static str>,
        bits: &'static [NamedBit],
    ) -> Self {
        Self {
            name,
            obj_type,
            parent,
            bits,
            feature: None,
            replacement: None,
            hierarchical: false,
            instantiable: false,
            view_bit: true,
            perm_bit: true,
        }
    }

    const fn feature(self, feature: Feature) -> Self {
        Self {
            feature: Some(feature),
            ..self
        }
    }

    const fn replaced_by(self, replacement: &'static str) -> Self {
        Self {
            replacement: Some(replacement),
            ..self
        }
    }

    const fn hierarchical(self) -> Self {
        Self {
            hierarchical: true,
            ..self
        }
    }

    const fn instances(self) -> Self {
        Self {
            instantiable: true,
            ..self
        }
    }

    const fn delegated(self) -> Self {
        Self {
            view_bit: false,
            perm_bit: false,
            ..self
        }
    }
}

const VIEW: NamedBit = NamedBit::new(perm::VIEW, "perm.view").described("perm.view.description");
const CHANGE_PERM: NamedBit =
    NamedBit::new(perm::CHANGE_PERM, "perm.change_perm").described("perm.change_perm.description");

const BASIC_BITS: &[NamedBit] = &[VIEW, CHANGE_PERM];

const ITEM_BITS: &[NamedBit] = &[
    VIEW,
    CHANGE_PERM,
    NamedBit::new(perm::item::UPDATE, "perm.item.update"),
    NamedBit::new(perm::item::DELETE, "perm.item.delete"),
];

const ADMIN_ITEM_BITS: &[NamedBit] = &[
    VIEW,
    CHANGE_PERM,
    NamedBit::new(perm::admin::READ_ALL, "perm.admin.read_all")
        .described("perm.admin.read_all.description"),
    NamedBit::new(perm::admin::UPDATE_ALL, "perm.admin.update_all"),
];

const SCHEDULER_ADMIN_BITS: &[NamedBit] = &[
    VIEW,
    CHANGE_PERM,
    NamedBit::new(perm::admin::READ_ALL, "perm.admin.read_all")
        .described("perm.admin.read_all.description"),
    NamedBit::new(perm::admin::UPDATE_ALL, "perm.admin.update_all"),
    NamedBit::new(perm::admin::SUSPEND, "perm.scheduler.suspend"),
];

const CONSTRUCT_ADMIN_BITS: &[NamedBit] = &[
    VIEW,
    CHANGE_PERM,
    NamedBit::new(perm::item::UPDATE, "perm.construct.update"),
    NamedBit::new(perm::item::DELETE, "perm.construct.delete"),
];

const OBJTAG_BITS: &[NamedBit] = &[
    VIEW,
    CHANGE_PERM,
    NamedBit::new(perm::objprop::UPDATE, "perm.objprop.update"),
];

const USERGROUP_BITS: &[NamedBit] = &[
    VIEW,
    CHANGE_PERM,
    NamedBit::new(perm::group::CREATE, "perm.group.create").category("group"),
    NamedBit::new(perm::group::UPDATE, "perm.group.update").category("group"),
    NamedBit::new(perm::group::DELETE, "perm.group.delete").category("group"),
    NamedBit::new(perm::group::USER_CREATE, "perm.user.create").category("user"),
    NamedBit::new(perm::group::USER_UPDATE, "perm.user.update").category("user"),
    NamedBit::new(perm::group::USER_DELETE, "perm.user.delete").category("user"),
];

const FOLDER_BITS: &[NamedBit] = &[
    VIEW,
    CHANGE_PERM,
    NamedBit::new(perm::folder::CREATE, "perm.folder.create").category("folder"),
    NamedBit::new(perm::folder::UPDATE, "perm.folder.update").category("folder"),
    NamedBit::new(perm::folder::DELETE, "perm.folder.delete").category("folder"),
    NamedBit::new(perm::page::VIEW, "perm.page.view").category("page"),
    NamedBit::new(perm::page::CREATE, "perm.page.create").category("page"),
    NamedBit::new(perm::page::UPDATE, "perm.page.update").category("page"),
    NamedBit::new(perm::page::DELETE, "perm.page.delete").category("page"),
    NamedBit::new(perm::page::PUBLISH, "perm.page.publish").category("page"),
    NamedBit::new(perm::page::IMPORT, "perm.page.import").category("page"),
    NamedBit::new(perm::template::VIEW, "perm.template.view").category("template"),
    NamedBit::new(perm::template::CREATE, "perm.template.create").category("template"),
    NamedBit::new(perm::template::UPDATE, "perm.template.update").category("template"),
    NamedBit::new(perm::template::DELETE, "perm.template.delete").category("template"),
    NamedBit::new(perm::template::LINK, "perm.template.link").category("template"),
    NamedBit::new(perm::folder::WASTEBIN, "perm.folder.wastebin")
        .category("folder")
        .requires(&[Feature::Wastebin]),
    NamedBit::new(perm::folder::INHERITANCE, "perm.folder.inheritance")
        .category("folder")
        .requires(&[Feature::Multichannelling]),
];

/// All registered types.
pub static TYPE_TABLE: &[TypeEntry] = &[
    TypeEntry::new("admin", ADMIN, None, BASIC_BITS),
    TypeEntry::new("useradmin", USER_ADMIN, Some("admin"), BASIC_BITS),
    TypeEntry::new("groupadmin", GROUP_ADMIN, Some("admin"), BASIC_BITS),
    TypeEntry::new("usergroup", USERGROUP, Some("groupadmin"), USERGROUP_BITS)
        .hierarchical()
        .instances(),
    TypeEntry::new("objpropadmin", OBJPROP_ADMIN, Some("admin"), BASIC_BITS),
    TypeEntry::new("objtagdef", OBJTAG_DEF, Some("objpropadmin"), OBJTAG_BITS).instances(),
    TypeEntry::new("scheduleradmin", SCHEDULER_ADMIN, Some("admin"), SCHEDULER_ADMIN_BITS),
    TypeEntry::new("schedulertask", SCHEDULER_TASK, Some("scheduleradmin"), ITEM_BITS).instances(),
    TypeEntry::new(
        "schedulerschedule",
        SCHEDULER_SCHEDULE,
        Some("scheduleradmin"),
        ITEM_BITS,
    )
    .instances(),
    TypeEntry::new("roleadmin", ROLE_ADMIN, Some("admin"), ADMIN_ITEM_BITS)
        .feature(Feature::RolePermissions),
    TypeEntry::new("role", ROLE, Some("roleadmin"), ITEM_BITS)
        .feature(Feature::RolePermissions)
        .instances(),
    TypeEntry::new("languageadmin", LANGUAGE_ADMIN, Some("admin"), BASIC_BITS),
    TypeEntry::new("constructadmin", CONSTRUCT_ADMIN, Some("admin"), CONSTRUCT_ADMIN_BITS),
    TypeEntry::new("construct", CONSTRUCT, Some("constructadmin"), BASIC_BITS).instances(),
    TypeEntry::new("devtooladmin", DEVTOOL_ADMIN, Some("admin"), BASIC_BITS)
        .feature(Feature::Devtools),
    TypeEntry::new("devtoolpackage", DEVTOOL_PACKAGE, Some("devtooladmin"), BASIC_BITS)
        .feature(Feature::Devtools)
        .instances(),
    TypeEntry::new(
        "contentrepositoryadmin",
        CONTENTREPOSITORY_ADMIN,
        Some("admin"),
        BASIC_BITS,
    ),
    TypeEntry::new(
        "contentrepository",
        CONTENTREPOSITORY,
        Some("contentrepositoryadmin"),
        ITEM_BITS,
    )
    .instances(),
    TypeEntry::new("crfragmentadmin", CR_FRAGMENT_ADMIN, Some("admin"), BASIC_BITS)
        .feature(Feature::CrFragments),
    TypeEntry::new("crfragment", CR_FRAGMENT, Some("crfragmentadmin"), ITEM_BITS)
        .feature(Feature::CrFragments)
        .instances(),
    TypeEntry::new("datasourceadmin", DATASOURCE_ADMIN, Some("admin"), BASIC_BITS)
        .feature(Feature::Datasources),
    TypeEntry::new("datasource", DATASOURCE, Some("datasourceadmin"), ITEM_BITS)
        .feature(Feature::Datasources)
        .instances(),
    TypeEntry::new("publishqueue", PUBLISH_QUEUE, Some("admin"), BASIC_BITS),
    TypeEntry::new("activitylog", ACTIVITY_LOG, Some("admin"), BASIC_BITS),
    TypeEntry::new("errorlog", ERRORLOG, Some("admin"), BASIC_BITS).replaced_by("activitylog"),
    TypeEntry::new("workflowadmin", WORKFLOW_ADMIN, Some("admin"), BASIC_BITS),
    TypeEntry::new("tasktemplateadmin", TASKTEMPLATE_ADMIN, Some("admin"), BASIC_BITS),
    TypeEntry::new("maintenance", MAINTENANCE, Some("admin"), &[]).delegated(),
    TypeEntry::new("contentadmin", CONTENT_ADMIN, None, BASIC_BITS),
    TypeEntry::new("node", NODE, Some("contentadmin"), FOLDER_BITS).instances(),
    TypeEntry::new("folder", FOLDER, Some("node"), FOLDER_BITS)
        .hierarchical()
        .instances(),
];

/// Types that are never active regardless of features.
pub const DEPRECATED_TYPES: &[TypeId] = &[WORKFLOW_ADMIN, TASKTEMPLATE_ADMIN, ERRORLOG];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_names_and_types_are_unique() {
        let names: HashSet<_> = TYPE_TABLE.iter().map(|e| e.name).collect();
        let types: HashSet<_> = TYPE_TABLE.iter().map(|e| e.obj_type).collect();
        assert_eq!(names.len(), TYPE_TABLE.len());
        assert_eq!(types.len(), TYPE_TABLE.len());
    }

    #[test]
    fn test_parents_and_replacements_exist() {
        let names: HashSet<_> = TYPE_TABLE.iter().map(|e| e.name).collect();
        for entry in TYPE_TABLE {
            if let Some(parent) = entry.parent {
                assert!(names.contains(parent), "{} has unknown parent", entry.name);
            }
            if let Some(replacement) = entry.replacement {
                assert!(names.contains(replacement), "{} has unknown replacement", entry.name);
            }
        }
    }

    #[test]
    fn test_declared_view_and_perm_bits_match_flags() {
        for entry in TYPE_TABLE {
            let has = |bit| entry.bits.iter().any(|b| b.bit == bit);
            assert_eq!(entry.view_bit, has(perm::VIEW), "{}", entry.name);
            assert_eq!(entry.perm_bit, has(perm::CHANGE_PERM), "{}", entry.name);
        }
    }

    #[test]
    fn test_bits_are_in_range_and_unique_per_type() {
        for entry in TYPE_TABLE {
            let bits: HashSet<_> = entry.bits.iter().map(|b| b.bit).collect();
            assert_eq!(bits.len(), entry.bits.len(), "{}", entry.name);
            assert!(entry.bits.iter().all(|b| b.bit < 32));
        }
    }

    #[test]
    fn test_feature_gated_bits() {
        let bit = FOLDER_BITS
            .iter()
            .find(|b| b.bit == perm::folder::WASTEBIN)
            .unwrap();
        assert!(!bit.is_active(&FeatureSet::new()));
        assert!(bit.is_active(&FeatureSet::new().with(Feature::Wastebin)));
        assert!(VIEW.is_active(&FeatureSet::new()));
    }
}

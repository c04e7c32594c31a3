//! Operations behind the `permstore` subcommands.
//!
//! Each function takes an initialized cache (and the type registry where
//! types are named) and returns printable output.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{bail, Context};
use permstore_domain::model::{Bit, GroupId, LanguageId, ObjectId, TypeId};
use permstore_domain::{ConsistencyReport, PermissionCache, Permissions, TypeHandle, TypeRegistry};
use permstore_storage::{MemoryPermissionSource, PermissionSnapshot, PermissionSource};
use tracing::info;

use crate::config::{PermstoreConfig, StorageSettings};

/// Opens the configured permission source.
pub fn open_source(settings: &StorageSettings) -> anyhow::Result<Arc<MemoryPermissionSource>> {
    match settings.backend.as_str() {
        "memory" => {
            info!("using empty in-memory permission source");
            Ok(MemoryPermissionSource::new_shared())
        }
        "snapshot" => {
            let path = settings
                .snapshot_path
                .as_deref()
                .context("storage.snapshot_path is required for the snapshot backend")?;
            let source = PermissionSnapshot::load(path)
                .with_context(|| format!("failed to read snapshot {path}"))?
                .into_source()
                .with_context(|| format!("failed to load snapshot {path}"))?;
            info!(path, "loaded permission snapshot");
            Ok(Arc::new(source))
        }
        other => bail!("unsupported storage backend: {other}"),
    }
}

/// Builds and initializes the cache for `config`.
pub fn open_cache(config: &PermstoreConfig) -> anyhow::Result<Arc<PermissionCache>> {
    let source = open_source(&config.storage)?;
    let cache = PermissionCache::new(source as Arc<dyn PermissionSource>, config.cache_config());
    cache
        .initialize(false)
        .context("failed to initialize permission cache")?;
    Ok(Arc::new(cache))
}

/// Resolves a type given by name or numeric id.
pub fn resolve_type<'a>(registry: &'a TypeRegistry, key: &str) -> anyhow::Result<TypeHandle<'a>> {
    match registry.get(key) {
        Some(handle) => Ok(handle),
        None => bail!("unknown object type: {key}"),
    }
}

/// Runs the consistency check.
pub fn consistency(
    cache: &PermissionCache,
    full: bool,
    html: bool,
) -> anyhow::Result<ConsistencyReport> {
    Ok(cache.check_consistency(full, html)?)
}

/// Merged bit string of `groups` on an object, or on the type without `obj_id`.
pub fn merged(
    cache: &PermissionCache,
    registry: &TypeRegistry,
    groups: &[GroupId],
    type_key: &str,
    obj_id: Option<ObjectId>,
) -> anyhow::Result<String> {
    let obj_type = TypeRegistry::normalize(resolve_type(registry, type_key)?.obj_type());
    let perms = match obj_id {
        Some(obj_id) => {
            cache
                .merged_permissions(groups, obj_type, obj_id, obj_type, 0)?
                .group
        }
        None => cache.merged_type_permissions(groups, obj_type)?,
    };
    Ok(Permissions::render(perms))
}

/// Arguments of a who-can query.
#[derive(Debug, Clone)]
pub struct WhoCanQuery {
    pub type_key: String,
    pub obj_id: ObjectId,
    pub bit: Bit,
    pub role_bit: Option<Bit>,
    /// Type the role side is evaluated for; defaults to the object's type.
    pub check_type: Option<String>,
    pub language_id: LanguageId,
}

/// Groups holding the queried bit on one object.
pub fn who_can(
    cache: &PermissionCache,
    registry: &TypeRegistry,
    query: &WhoCanQuery,
) -> anyhow::Result<Vec<GroupId>> {
    let obj_type = TypeRegistry::normalize(resolve_type(registry, &query.type_key)?.obj_type());
    let check_type: TypeId = match &query.check_type {
        Some(key) => resolve_type(registry, key)?.obj_type(),
        None => obj_type,
    };
    let groups = cache.groups_with_perm(
        obj_type,
        query.obj_id,
        Some(query.bit),
        query.role_bit,
        check_type,
        query.language_id,
    )?;
    Ok(groups.into_iter().collect())
}

/// Renders the type tree with the bits each type declares.
pub fn type_tree(registry: &TypeRegistry, include_inactive: bool) -> String {
    let mut out = String::new();
    for root in registry.roots(include_inactive) {
        write_type(&mut out, root, 0, include_inactive);
    }
    out
}

fn write_type(out: &mut String, handle: TypeHandle<'_>, depth: usize, include_inactive: bool) {
    let indent = "  ".repeat(depth);
    let marker = if handle.is_active() { "" } else { " [inactive]" };
    let _ = writeln!(
        out,
        "{indent}{} ({}){marker}",
        handle.name(),
        handle.obj_type()
    );
    for bit in handle.bits(include_inactive) {
        let _ = writeln!(out, "{indent}    {:>2} {}", bit.bit, bit.label_key);
    }
    for child in handle.children(include_inactive) {
        // hierarchical types list themselves
        if child != handle {
            write_type(out, child, depth + 1, include_inactive);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use permstore_domain::{Feature, FeatureSet};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SNAPSHOT: &str = r#"{
        "groups": [2, 3],
        "roles": [7],
        "permissions": [
            { "group_id": 2, "obj_type": 10002, "obj_id": 5, "bits": "11000000111111111111111111111111" },
            { "group_id": 3, "obj_type": 10002, "obj_id": 5, "bits": "10000000000000000000000000000000" },
            { "group_id": 3, "obj_type": 10000, "obj_id": 0, "bits": "10000000000000000000000000000000" }
        ],
        "role_assignments": [
            { "group_id": 3, "role_id": 7, "obj_type": 10002, "obj_id": 5 }
        ],
        "role_permissions": [
            { "role_id": 7, "obj_type": 10031, "obj_id": 2, "bits": "00000000001000000000000000000000" }
        ]
    }"#;

    fn snapshot_config() -> (NamedTempFile, PermstoreConfig) {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{SNAPSHOT}").unwrap();
        let mut config = PermstoreConfig::default();
        config.storage.backend = "snapshot".to_string();
        config.storage.snapshot_path = Some(file.path().display().to_string());
        config.features = FeatureSet::new().with(Feature::RolePermissions);
        (file, config)
    }

    fn registry() -> TypeRegistry {
        TypeRegistry::with_defaults(FeatureSet::new())
    }

    #[test]
    fn test_open_cache_from_snapshot() {
        let (_file, config) = snapshot_config();
        let cache = open_cache(&config).unwrap();
        assert!(cache.is_initialized());
        assert!(cache.config().role_permissions_enabled);
        assert_eq!(cache.entry_count(), 3);
    }

    #[test]
    fn test_open_source_reports_missing_snapshot() {
        let settings = StorageSettings {
            backend: "snapshot".to_string(),
            snapshot_path: Some("/nonexistent/perms.json".to_string()),
        };
        let err = open_source(&settings).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/perms.json"));
    }

    #[test]
    fn test_consistency_of_fresh_cache() {
        let (_file, config) = snapshot_config();
        let cache = open_cache(&config).unwrap();
        let report = consistency(&cache, true, false).unwrap();
        assert!(report.consistent);
        assert_eq!(report.render(), "cache and storage hold 3 permission entries");
    }

    #[test]
    fn test_merged_by_name_and_number() {
        let (_file, config) = snapshot_config();
        let cache = open_cache(&config).unwrap();
        let registry = registry();

        let by_name = merged(&cache, &registry, &[2, 3], "folder", Some(5)).unwrap();
        let by_id = merged(&cache, &registry, &[2, 3], "10002", Some(5)).unwrap();
        assert_eq!(by_name, "11000000111111111111111111111111");
        assert_eq!(by_name, by_id);

        let type_level = merged(&cache, &registry, &[3], "contentadmin", None).unwrap();
        assert_eq!(type_level, "10000000000000000000000000000000");

        let nothing = merged(&cache, &registry, &[9], "folder", Some(5)).unwrap();
        assert_eq!(nothing, "0".repeat(32));

        assert!(merged(&cache, &registry, &[2], "nosuchtype", None).is_err());
    }

    #[test]
    fn test_who_can_with_group_and_role_bits() {
        let (_file, config) = snapshot_config();
        let cache = open_cache(&config).unwrap();
        let registry = registry();

        let mut query = WhoCanQuery {
            type_key: "folder".to_string(),
            obj_id: 5,
            bit: 9,
            role_bit: None,
            check_type: None,
            language_id: 0,
        };
        assert_eq!(who_can(&cache, &registry, &query).unwrap(), vec![2]);

        query.bit = 11;
        query.role_bit = Some(10);
        query.check_type = Some("page".to_string());
        query.language_id = 2;
        assert_eq!(who_can(&cache, &registry, &query).unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_type_tree_lists_roots_and_bits() {
        let tree = type_tree(&registry(), false);
        assert!(tree.lines().any(|line| line == "admin (1)"));
        assert!(tree.lines().any(|line| line == "contentadmin (10000)"));
        assert!(tree.contains("\n  node (10001)"));
        assert!(tree.contains("\n    folder (10002)"));
        assert!(!tree.contains("[inactive]"));
        assert!(!tree.contains("errorlog"));

        let full = type_tree(&registry(), true);
        assert!(full.contains("errorlog (10072) [inactive]"));
    }

    #[test]
    fn test_memory_backend_starts_empty() {
        let config = PermstoreConfig::default();
        let cache = open_cache(&config).unwrap();
        assert_eq!(cache.entry_count(), 0);
        assert!(!cache.config().role_permissions_enabled);
    }
}

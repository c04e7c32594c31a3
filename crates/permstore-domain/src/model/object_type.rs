//! Numeric object types.

use super::TypeId;

pub const ADMIN: TypeId = 1;
pub const USER_ADMIN: TypeId = 2;
pub const GROUP_ADMIN: TypeId = 3;
pub const USERGROUP: TypeId = 6;
pub const SYSTEM_USER: TypeId = 10;
pub const OBJPROP_ADMIN: TypeId = 13;
pub const OBJTAG_DEF: TypeId = 14;
pub const SCHEDULER_ADMIN: TypeId = 36;
pub const SCHEDULER_TASK: TypeId = 37;
pub const SCHEDULER_SCHEDULE: TypeId = 38;
pub const ROLE_ADMIN: TypeId = 108;
pub const ROLE: TypeId = 109;
pub const CONTENT_ADMIN: TypeId = 10000;
pub const NODE: TypeId = 10001;
pub const FOLDER: TypeId = 10002;
pub const INHERITED_FOLDER: TypeId = 10003;
pub const CONSTRUCT_ADMIN: TypeId = 10004;
pub const CONSTRUCT: TypeId = 10005;
pub const TEMPLATE: TypeId = 10006;
pub const PAGE: TypeId = 10007;
pub const FILE: TypeId = 10008;
pub const IMAGE: TypeId = 10011;
pub const CHANNEL: TypeId = 10033;
pub const CONTENT_LANGUAGE: TypeId = 10031;
pub const LANGUAGE_ADMIN: TypeId = 10032;
pub const DEVTOOL_ADMIN: TypeId = 10060;
pub const DEVTOOL_PACKAGE: TypeId = 10061;
pub const WORKFLOW_ADMIN: TypeId = 10070;
pub const TASKTEMPLATE_ADMIN: TypeId = 10071;
pub const ERRORLOG: TypeId = 10072;
pub const ACTIVITY_LOG: TypeId = 10090;
pub const PUBLISH_QUEUE: TypeId = 10080;
pub const CONTENTREPOSITORY_ADMIN: TypeId = 10200;
pub const CONTENTREPOSITORY: TypeId = 10201;
pub const CR_FRAGMENT_ADMIN: TypeId = 10300;
pub const CR_FRAGMENT: TypeId = 10301;
pub const DATASOURCE_ADMIN: TypeId = 10400;
pub const DATASOURCE: TypeId = 10401;
pub const MAINTENANCE: TypeId = 10500;

/// Object id under which type-level ("global") permissions are stored.
pub const TYPE_LEVEL_ID: super::ObjectId = 0;

/// Maps alias types onto the type their permissions are stored under.
///
/// Inherited folders share the folder rows and channels share the node rows.
pub fn normalize(obj_type: TypeId) -> TypeId {
    match obj_type {
        INHERITED_FOLDER => FOLDER,
        CHANNEL => NODE,
        other => other,
    }
}

/// Returns whether permissions of `obj_type` are resolved through a folder.
pub fn is_folder_like(obj_type: TypeId) -> bool {
    matches!(normalize(obj_type), FOLDER | NODE)
}

/// Returns whether role permissions can apply to `obj_type`.
pub fn supports_roles(obj_type: TypeId) -> bool {
    matches!(obj_type, PAGE | FILE | IMAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_aliases() {
        assert_eq!(normalize(INHERITED_FOLDER), FOLDER);
        assert_eq!(normalize(CHANNEL), NODE);
        assert_eq!(normalize(PAGE), PAGE);
    }

    #[test]
    fn test_folder_like_types() {
        assert!(is_folder_like(FOLDER));
        assert!(is_folder_like(INHERITED_FOLDER));
        assert!(is_folder_like(NODE));
        assert!(is_folder_like(CHANNEL));
        assert!(!is_folder_like(TEMPLATE));
    }

    #[test]
    fn test_role_types() {
        assert!(supports_roles(PAGE));
        assert!(supports_roles(FILE));
        assert!(supports_roles(IMAGE));
        assert!(!supports_roles(FOLDER));
    }
}

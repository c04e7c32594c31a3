//! Named permission bit offsets.
//!
//! Bits 0 and 1 mean the same on every type: "view" and "change permissions".
//! The remaining offsets are scoped to the object the row is stored on.

use super::permissions::Bit;

/// View the object (or the admin area represented by a type).
pub const VIEW: Bit = 0;
/// Change the permissions of the object.
pub const CHANGE_PERM: Bit = 1;

/// Bits stored on folders (and node root folders).
pub mod folder {
    use super::Bit;

    pub const CREATE: Bit = 8;
    pub const UPDATE: Bit = 9;
    pub const DELETE: Bit = 10;
    pub const WASTEBIN: Bit = 23;
    pub const INHERITANCE: Bit = 24;
}

/// Page/file/image bits, stored on the containing folder.
pub mod page {
    use super::Bit;

    pub const VIEW: Bit = 11;
    pub const CREATE: Bit = 12;
    pub const UPDATE: Bit = 13;
    pub const DELETE: Bit = 14;
    pub const PUBLISH: Bit = 19;
    pub const IMPORT: Bit = 20;
}

/// Template bits, stored on the folders a template is linked to.
pub mod template {
    use super::Bit;

    pub const VIEW: Bit = 15;
    pub const CREATE: Bit = 16;
    pub const UPDATE: Bit = 17;
    pub const DELETE: Bit = 18;
    pub const LINK: Bit = 21;
}

/// Bits stored on usergroups, governing the group and its members.
pub mod group {
    use super::Bit;

    pub const CREATE: Bit = 8;
    pub const UPDATE: Bit = 9;
    pub const DELETE: Bit = 10;
    pub const USER_CREATE: Bit = 11;
    pub const USER_UPDATE: Bit = 12;
    pub const USER_DELETE: Bit = 13;
}

/// Object property (object tag definition) bits.
pub mod objprop {
    use super::Bit;

    pub const UPDATE: Bit = 2;
}

/// Admin area bits shared by role administration and the scheduler.
pub mod admin {
    use super::Bit;

    /// Read every item of the area regardless of item permissions.
    pub const READ_ALL: Bit = 2;
    /// Modify every item of the area regardless of item permissions.
    pub const UPDATE_ALL: Bit = 3;
    /// Suspend the scheduler.
    pub const SUSPEND: Bit = 4;
}

/// Bits stored on single admin items (roles, scheduler tasks and schedules).
pub mod item {
    use super::Bit;

    pub const UPDATE: Bit = 9;
    pub const DELETE: Bit = 10;
}

/// Bits inside a role's page/file permission vectors.
pub mod role {
    use super::Bit;

    pub const VIEW: Bit = 10;
    pub const CREATE: Bit = 11;
    pub const UPDATE: Bit = 12;
    pub const DELETE: Bit = 13;
    pub const PUBLISH: Bit = 14;
    pub const TRANSLATE: Bit = 15;
}

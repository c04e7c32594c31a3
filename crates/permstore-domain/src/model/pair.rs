//! Group/role permission pairs.

use super::permissions::{Bit, Permissions};

/// Group-level and role-level permissions resolved for one query.
///
/// The pair grants a check if either side grants its bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissionPair {
    pub group: Option<Permissions>,
    pub role: Option<Permissions>,
}

impl PermissionPair {
    /// Creates a pair from both sides.
    pub fn new(group: Option<Permissions>, role: Option<Permissions>) -> Self {
        Self { group, role }
    }

    /// Creates a pair without a role side.
    pub fn group_only(group: Option<Permissions>) -> Self {
        Self { group, role: None }
    }

    /// The pair granting nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The pair granting everything on both sides.
    pub fn full() -> Self {
        Self {
            group: Some(Permissions::FULL),
            role: Some(Permissions::FULL),
        }
    }

    /// Checks the group side for `group_bit` or the role side for `role_bit`.
    ///
    /// Passing `None` for a bit excludes that side from the check, so
    /// `check_bits(None, None)` never grants.
    pub fn check_bits(&self, group_bit: Option<Bit>, role_bit: Option<Bit>) -> bool {
        group_bit.is_some_and(|bit| Permissions::check(self.group, bit))
            || role_bit.is_some_and(|bit| Permissions::check(self.role, bit))
    }

    /// Checks the group side only.
    pub fn check_group(&self, bit: Bit) -> bool {
        self.check_bits(Some(bit), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perms(text: &str) -> Option<Permissions> {
        Permissions::parse(text).unwrap()
    }

    #[test]
    fn test_no_enabled_side_never_grants() {
        assert!(!PermissionPair::full().check_bits(None, None));
        assert!(!PermissionPair::empty().check_bits(None, None));
    }

    #[test]
    fn test_group_side() {
        let pair = PermissionPair::group_only(perms("11000000111111111111111111111111"));
        assert!(pair.check_bits(Some(0), None));
        assert!(pair.check_group(1));
        assert!(!pair.check_bits(Some(2), None));
    }

    #[test]
    fn test_role_side_grants_when_group_does_not() {
        let pair = PermissionPair::new(
            perms("10000000000000000000000000000000"),
            perms("00000000001000000000000000000000"),
        );
        assert!(!pair.check_bits(Some(11), None));
        assert!(pair.check_bits(Some(11), Some(10)));
        assert!(pair.check_bits(None, Some(10)));
    }

    #[test]
    fn test_role_bit_ignored_without_role_side() {
        let pair = PermissionPair::group_only(perms("10000000000000000000000000000000"));
        assert!(!pair.check_bits(None, Some(0)));
    }
}

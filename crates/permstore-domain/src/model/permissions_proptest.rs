//! Property-based tests for permission vectors.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::model::{PermissionPair, Permissions};

    /// Strategy to generate optional permission vectors, `None` included.
    fn perms_strategy() -> impl Strategy<Value = Option<Permissions>> {
        any::<u32>().prop_map(Permissions::from_bits)
    }

    fn bit_strategy() -> impl Strategy<Value = u8> {
        0u8..32
    }

    proptest! {
        #[test]
        fn test_merge_is_commutative(a in perms_strategy(), b in perms_strategy()) {
            prop_assert_eq!(Permissions::merge([a, b]), Permissions::merge([b, a]));
        }

        #[test]
        fn test_merge_is_associative(
            a in perms_strategy(),
            b in perms_strategy(),
            c in perms_strategy()
        ) {
            let left = Permissions::merge([Permissions::merge([a, b]), c]);
            let right = Permissions::merge([a, Permissions::merge([b, c])]);
            prop_assert_eq!(left, right);
        }

        #[test]
        fn test_merge_is_idempotent(a in perms_strategy()) {
            prop_assert_eq!(Permissions::merge([a, a]), a);
            prop_assert_eq!(Permissions::merge([None, a]), a);
        }

        #[test]
        fn test_parse_render_agree(a in perms_strategy()) {
            let text = Permissions::render(a);
            prop_assert_eq!(Permissions::parse(&text).unwrap(), a);
        }

        #[test]
        fn test_set_then_check(a in perms_strategy(), bit in bit_strategy()) {
            prop_assert!(Permissions::set(a, bit).unwrap().has(bit));
        }

        #[test]
        fn test_unset_after_set_equals_unset(a in perms_strategy(), bit in bit_strategy()) {
            let set = Some(Permissions::set(a, bit).unwrap());
            prop_assert_eq!(Permissions::unset(set, bit), Permissions::unset(a, bit));
        }

        #[test]
        fn test_set_out_of_range_fails(a in perms_strategy(), bit in 32u8..=255) {
            prop_assert!(Permissions::set(a, bit).is_err());
        }

        #[test]
        fn test_change_patterns(a in perms_strategy()) {
            prop_assert_eq!(Permissions::change(a, &".".repeat(32)), a);
            prop_assert_eq!(Permissions::change(a, &"1".repeat(32)), Some(Permissions::FULL));
            prop_assert_eq!(Permissions::change(a, &"0".repeat(32)), None);
        }

        #[test]
        fn test_pair_without_bits_never_grants(a in perms_strategy(), b in perms_strategy()) {
            prop_assert!(!PermissionPair::new(a, b).check_bits(None, None));
        }
    }
}

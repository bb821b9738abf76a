//! Permission evaluation.
//!
//! Pure checks against a frozen identity snapshot. `None` means the caller
//! is not authenticated and every check is denied.

use crate::identity::UserIdentity;
use crate::permission::Permission;

/// Whether `user` holds `permission`.
///
/// Super-admins pass every catalog permission regardless of their
/// `role_permissions`.
pub fn has_permission(user: Option<&UserIdentity>, permission: Permission) -> bool {
    match user {
        None => false,
        Some(user) if user.role.is_superadmin() => true,
        Some(user) => user.role_permissions.contains(permission.key()),
    }
}

/// Whether `user` holds the permission named by a raw key.
///
/// Keys outside the catalog are denied for every user, super-admins
/// included.
pub fn has_permission_key(user: Option<&UserIdentity>, key: &str) -> bool {
    Permission::lookup(key).is_some_and(|permission| has_permission(user, permission))
}

/// Whether `user` holds at least one of `permissions`. False for an empty list.
pub fn has_any_permission(user: Option<&UserIdentity>, permissions: &[Permission]) -> bool {
    permissions.iter().any(|p| has_permission(user, *p))
}

/// Whether `user` holds every one of `permissions`. True for an empty list.
pub fn has_all_permissions(user: Option<&UserIdentity>, permissions: &[Permission]) -> bool {
    permissions.iter().all(|p| has_permission(user, *p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use proptest::prelude::*;
    use proptest::sample::subsequence;

    fn custom(keys: &[Permission]) -> UserIdentity {
        UserIdentity::new("u-1", "mod@example.com", Role::Custom("moderator".into()))
            .with_permissions(keys.iter().copied())
    }

    fn arb_role() -> impl Strategy<Value = Role> {
        prop_oneof![
            Just(Role::Customer),
            Just(Role::Agent),
            Just(Role::Admin),
            Just(Role::SubAdmin),
            "[a-z]{3,12}".prop_map(|name| Role::parse(&name)),
        ]
        .prop_filter("non-superadmin", |role| !role.is_superadmin())
    }

    #[test]
    fn test_anonymous_is_denied() {
        for permission in Permission::ALL {
            assert!(!has_permission(None, permission));
        }
        assert!(!has_permission_key(None, "USERS_VIEW"));
    }

    #[test]
    fn test_empty_lists() {
        let user = custom(&[Permission::UsersView]);
        assert!(!has_any_permission(Some(&user), &[]));
        assert!(has_all_permissions(Some(&user), &[]));

        let root = UserIdentity::new("root", "root@example.com", Role::SuperAdmin);
        assert!(!has_any_permission(Some(&root), &[]));
        assert!(has_all_permissions(Some(&root), &[]));
    }

    #[test]
    fn test_any_and_all() {
        let user = custom(&[Permission::PropertiesView, Permission::InquiriesView]);
        let user = Some(&user);

        assert!(has_any_permission(user, &[Permission::UsersView, Permission::PropertiesView]));
        assert!(!has_any_permission(user, &[Permission::UsersView, Permission::RolesManage]));
        assert!(has_all_permissions(user, &[Permission::PropertiesView, Permission::InquiriesView]));
        assert!(!has_all_permissions(user, &[Permission::PropertiesView, Permission::UsersView]));
    }

    #[test]
    fn test_unknown_key_denied_even_when_granted_raw() {
        let user = UserIdentity::new("u-2", "x@example.com", Role::Custom("x".into()))
            .with_permission_keys(["PROPERTIES_DESTROY"]);
        assert!(!has_permission_key(Some(&user), "PROPERTIES_DESTROY"));

        let root = UserIdentity::new("root", "root@example.com", Role::SuperAdmin);
        assert!(!has_permission_key(Some(&root), "PROPERTIES_DESTROY"));
        assert!(has_permission_key(Some(&root), "PROPERTIES_MANAGE"));
    }

    proptest! {
        #[test]
        fn prop_superadmin_passes_everything(
            granted in subsequence(Permission::ALL.to_vec(), 0..=Permission::ALL.len()),
            checked in prop::sample::select(Permission::ALL.to_vec()),
        ) {
            let user = UserIdentity::new("root", "root@example.com", Role::SuperAdmin)
                .with_permissions(granted);
            prop_assert!(has_permission(Some(&user), checked));
        }

        #[test]
        fn prop_others_pass_iff_granted(
            role in arb_role(),
            granted in subsequence(Permission::ALL.to_vec(), 0..=Permission::ALL.len()),
            checked in prop::sample::select(Permission::ALL.to_vec()),
        ) {
            let user = UserIdentity::new("u", "u@example.com", role)
                .with_permissions(granted.iter().copied());
            prop_assert_eq!(has_permission(Some(&user), checked), granted.contains(&checked));
        }

        #[test]
        fn prop_any_all_agree_with_single_checks(
            granted in subsequence(Permission::ALL.to_vec(), 0..=Permission::ALL.len()),
            checked in subsequence(Permission::ALL.to_vec(), 0..=Permission::ALL.len()),
        ) {
            let user = custom(&granted);
            let user = Some(&user);
            let singles: Vec<bool> = checked.iter().map(|p| has_permission(user, *p)).collect();
            prop_assert_eq!(has_any_permission(user, &checked), singles.iter().any(|b| *b));
            prop_assert_eq!(has_all_permissions(user, &checked), singles.iter().all(|b| *b));
        }
    }
}

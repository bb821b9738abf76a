//! Role registry: permission sets bound to role names.

use crate::config::{is_reserved, RoleSeed};
use homestead_access::{AccessError, AccessResult, Permission, Role};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::info;

/// A role name and the permissions it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    /// Role name.
    pub name: String,
    /// Granted permissions.
    pub permissions: BTreeSet<Permission>,
}

/// Registry of role definitions.
///
/// Customers, agents and super-admins are never registered: the first two
/// are confined to their portals by role alone and super-admins bypass
/// permission checks.
pub struct RoleRegistry {
    roles: RwLock<HashMap<String, RoleDefinition>>,
}

impl RoleRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
        }
    }

    /// Build from configuration seeds.
    pub fn from_seeds(seeds: &[RoleSeed]) -> AccessResult<Self> {
        let registry = Self::new();
        for seed in seeds {
            let permissions = seed
                .permissions
                .iter()
                .map(|key| key.parse::<Permission>())
                .collect::<AccessResult<BTreeSet<_>>>()?;
            registry.upsert(&seed.name, permissions)?;
        }
        Ok(registry)
    }

    /// Create or replace a role definition.
    pub fn upsert(
        &self,
        name: &str,
        permissions: BTreeSet<Permission>,
    ) -> AccessResult<RoleDefinition> {
        let role = Role::parse(name);
        if is_reserved(&role) {
            return Err(AccessError::ReservedRole(role.to_string()));
        }

        let definition = RoleDefinition {
            name: role.to_string(),
            permissions,
        };
        info!(
            role = %definition.name,
            permissions = definition.permissions.len(),
            "Role definition stored"
        );
        self.roles
            .write()
            .insert(definition.name.clone(), definition.clone());
        Ok(definition)
    }

    /// Remove a role definition. Returns whether it existed.
    pub fn remove(&self, name: &str) -> bool {
        let key = Role::parse(name).to_string();
        self.roles.write().remove(&key).is_some()
    }

    /// Definition of `name`, if registered.
    pub fn get(&self, name: &str) -> Option<RoleDefinition> {
        let key = Role::parse(name).to_string();
        self.roles.read().get(&key).cloned()
    }

    /// Every definition, sorted by name.
    pub fn list(&self) -> Vec<RoleDefinition> {
        let mut roles: Vec<_> = self.roles.read().values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    /// Permission keys granted to `role`.
    pub fn permissions_for(&self, role: &Role) -> BTreeSet<String> {
        if is_reserved(role) {
            return BTreeSet::new();
        }
        self.roles
            .read()
            .get(role.as_str())
            .map(|def| def.permissions.iter().map(|p| p.key().to_string()).collect())
            .unwrap_or_default()
    }
}

impl Default for RoleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_roles() {
        let registry = RoleRegistry::from_seeds(&[RoleSeed {
            name: "moderator".into(),
            permissions: vec!["PROPERTIES_VIEW".into(), "PROPERTIES_MANAGE".into()],
        }])
        .unwrap();

        let keys = registry.permissions_for(&Role::parse("moderator"));
        assert_eq!(
            keys.into_iter().collect::<Vec<_>>(),
            vec!["PROPERTIES_MANAGE".to_string(), "PROPERTIES_VIEW".to_string()]
        );
    }

    #[test]
    fn test_seed_with_unknown_permission_fails() {
        let result = RoleRegistry::from_seeds(&[RoleSeed {
            name: "moderator".into(),
            permissions: vec!["PROPERTIES_SHRED".into()],
        }]);
        assert!(matches!(result, Err(AccessError::UnknownPermission(_))));
    }

    #[test]
    fn test_reserved_roles_rejected() {
        let registry = RoleRegistry::new();
        for name in ["customer", "agent", "superadmin", "Super_Admin"] {
            assert!(matches!(
                registry.upsert(name, BTreeSet::new()),
                Err(AccessError::ReservedRole(_))
            ));
        }
        assert!(registry.permissions_for(&Role::SuperAdmin).is_empty());
    }

    #[test]
    fn test_standard_admin_roles_are_names_too() {
        let registry = RoleRegistry::new();
        registry
            .upsert("ADMIN", [Permission::UsersView].into_iter().collect())
            .unwrap();
        assert!(registry.permissions_for(&Role::Admin).contains("USERS_VIEW"));
        assert_eq!(registry.get("admin").unwrap().name, "admin");
    }

    #[test]
    fn test_remove_and_list() {
        let registry = RoleRegistry::new();
        registry.upsert("zeta", BTreeSet::new()).unwrap();
        registry
            .upsert("alpha", [Permission::ReportsView].into_iter().collect())
            .unwrap();

        let names: Vec<_> = registry.list().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);

        assert!(registry.remove("zeta"));
        assert!(!registry.remove("zeta"));
        assert!(registry.permissions_for(&Role::parse("zeta")).is_empty());
    }
}

//! Authenticated user identity.

use crate::permission::Permission;
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identity of the signed-in user, owned by the session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Opaque unique identifier.
    pub id: String,
    /// Account email.
    pub email: String,
    /// Coarse role.
    pub role: Role,
    /// Raw permission keys granted to a custom role. Empty for standard roles.
    #[serde(default, rename = "rolePermissions")]
    pub role_permissions: BTreeSet<String>,
}

impl UserIdentity {
    /// Create an identity with no custom permissions.
    pub fn new(id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            role,
            role_permissions: BTreeSet::new(),
        }
    }

    /// Grant catalog permissions.
    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.role_permissions
            .extend(permissions.into_iter().map(|p| p.key().to_string()));
        self
    }

    /// Grant raw keys, which may fall outside the catalog.
    pub fn with_permission_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.role_permissions.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Whether this identity carries a non-empty custom permission set.
    pub fn has_custom_permissions(&self) -> bool {
        !self.role_permissions.is_empty()
    }
}

//! Permission catalog.
//!
//! Permission keys are the fine-grained capability tokens used to gate
//! pages inside the admin shell. The catalog is closed: a key that does not
//! appear here never grants anything.

use crate::error::AccessError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A capability drawn from the closed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    /// `USERS_VIEW`
    UsersView,
    /// `USERS_MANAGE`
    UsersManage,
    /// `PROPERTIES_VIEW`
    PropertiesView,
    /// `PROPERTIES_MANAGE`
    PropertiesManage,
    /// `AGENTS_VIEW`
    AgentsView,
    /// `AGENTS_MANAGE`
    AgentsManage,
    /// `INQUIRIES_VIEW`
    InquiriesView,
    /// `INQUIRIES_MANAGE`
    InquiriesManage,
    /// `REPORTS_VIEW`
    ReportsView,
    /// `ROLES_MANAGE`
    RolesManage,
    /// `SETTINGS_VIEW`
    SettingsView,
    /// `SETTINGS_MANAGE`
    SettingsManage,
    /// `DATA_EXPORT`
    DataExport,
}

impl Permission {
    /// Every permission in the catalog.
    pub const ALL: [Permission; 13] = [
        Self::UsersView,
        Self::UsersManage,
        Self::PropertiesView,
        Self::PropertiesManage,
        Self::AgentsView,
        Self::AgentsManage,
        Self::InquiriesView,
        Self::InquiriesManage,
        Self::ReportsView,
        Self::RolesManage,
        Self::SettingsView,
        Self::SettingsManage,
        Self::DataExport,
    ];

    /// Wire key of this permission.
    pub fn key(self) -> &'static str {
        match self {
            Self::UsersView => "USERS_VIEW",
            Self::UsersManage => "USERS_MANAGE",
            Self::PropertiesView => "PROPERTIES_VIEW",
            Self::PropertiesManage => "PROPERTIES_MANAGE",
            Self::AgentsView => "AGENTS_VIEW",
            Self::AgentsManage => "AGENTS_MANAGE",
            Self::InquiriesView => "INQUIRIES_VIEW",
            Self::InquiriesManage => "INQUIRIES_MANAGE",
            Self::ReportsView => "REPORTS_VIEW",
            Self::RolesManage => "ROLES_MANAGE",
            Self::SettingsView => "SETTINGS_VIEW",
            Self::SettingsManage => "SETTINGS_MANAGE",
            Self::DataExport => "DATA_EXPORT",
        }
    }

    /// Human-readable meaning of the permission.
    pub fn describe(self) -> &'static str {
        match self {
            Self::UsersView => "View customer and staff accounts",
            Self::UsersManage => "Create, edit and deactivate accounts",
            Self::PropertiesView => "Browse all property listings",
            Self::PropertiesManage => "Approve, edit and remove listings",
            Self::AgentsView => "View agent profiles",
            Self::AgentsManage => "Verify and suspend agents",
            Self::InquiriesView => "Read customer inquiries",
            Self::InquiriesManage => "Assign and close inquiries",
            Self::ReportsView => "Open marketplace reports",
            Self::RolesManage => "Define custom roles and their permissions",
            Self::SettingsView => "Read platform settings",
            Self::SettingsManage => "Change platform settings",
            Self::DataExport => "Export marketplace data",
        }
    }

    /// Look up a permission by wire key.
    pub fn lookup(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.key() == key)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Permission {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s).ok_or_else(|| AccessError::UnknownPermission(s.to_string()))
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        key.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<_> = Permission::ALL.iter().map(|p| p.key()).collect();
        assert_eq!(keys.len(), Permission::ALL.len());
    }

    #[test]
    fn test_lookup_known_key() {
        assert_eq!(Permission::lookup("SETTINGS_MANAGE"), Some(Permission::SettingsManage));
        assert_eq!("USERS_VIEW".parse::<Permission>().unwrap(), Permission::UsersView);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert_eq!(Permission::lookup("PROPERTIES_DESTROY"), None);
        assert_eq!(Permission::lookup("users_view"), None);

        let err = "NOPE".parse::<Permission>().unwrap_err();
        assert!(matches!(err, AccessError::UnknownPermission(k) if k == "NOPE"));
    }

    #[test]
    fn test_serde_uses_wire_key() {
        let json = serde_json::to_string(&Permission::PropertiesView).unwrap();
        assert_eq!(json, "\"PROPERTIES_VIEW\"");

        let parsed: Permission = serde_json::from_str("\"ROLES_MANAGE\"").unwrap();
        assert_eq!(parsed, Permission::RolesManage);

        assert!(serde_json::from_str::<Permission>("\"ROLES_DELETE\"").is_err());
    }
}

//! Roles and portals.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One of the independent UI shells, each with its own login surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Portal {
    /// Buyer-facing portal.
    Customer,
    /// Agent portal.
    Vendor,
    /// Back-office portal.
    Admin,
}

impl Portal {
    /// Display name used in user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Vendor => "vendor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse identity classification driving portal-level access.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// Buyer.
    Customer,
    /// Listing agent; uses the vendor portal.
    Agent,
    /// Standard administrator.
    Admin,
    /// Holds every permission and passes every guard.
    SuperAdmin,
    /// Restricted administrator with its own area.
    SubAdmin,
    /// Role defined at runtime by an administrator.
    Custom(String),
}

impl Role {
    /// Parse a role name. Never fails: unrecognised names are custom roles.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "customer" => Self::Customer,
            "agent" => Self::Agent,
            "admin" => Self::Admin,
            "superadmin" | "super_admin" => Self::SuperAdmin,
            "subadmin" | "sub_admin" => Self::SubAdmin,
            _ => Self::Custom(name.trim().to_string()),
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Customer => "customer",
            Self::Agent => "agent",
            Self::Admin => "admin",
            Self::SuperAdmin => "superadmin",
            Self::SubAdmin => "subadmin",
            Self::Custom(name) => name,
        }
    }

    /// Whether this role bypasses every permission check.
    pub fn is_superadmin(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }

    /// Whether this is one of the built-in roles.
    pub fn is_standard(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }

    /// Portal whose login surface serves this role.
    pub fn home_portal(&self) -> Portal {
        match self {
            Self::Customer => Portal::Customer,
            Self::Agent => Portal::Vendor,
            Self::Admin | Self::SuperAdmin | Self::SubAdmin | Self::Custom(_) => Portal::Admin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::parse(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_roles() {
        assert_eq!(Role::parse("customer"), Role::Customer);
        assert_eq!(Role::parse("Agent"), Role::Agent);
        assert_eq!(Role::parse("super_admin"), Role::SuperAdmin);
        assert_eq!(Role::parse("SUBADMIN"), Role::SubAdmin);
    }

    #[test]
    fn test_parse_custom_role_keeps_name() {
        assert_eq!(Role::parse("listing-moderator"), Role::Custom("listing-moderator".into()));
        assert_eq!(Role::parse("listing-moderator").as_str(), "listing-moderator");
        assert!(!Role::parse("listing-moderator").is_standard());
    }

    #[test]
    fn test_home_portal() {
        assert_eq!(Role::Customer.home_portal(), Portal::Customer);
        assert_eq!(Role::Agent.home_portal(), Portal::Vendor);
        assert_eq!(Role::SubAdmin.home_portal(), Portal::Admin);
        assert_eq!(Role::Custom("auditor".into()).home_portal(), Portal::Admin);
    }

    #[test]
    fn test_serde_roundtrip_as_string() {
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, "\"superadmin\"");
        let role: Role = serde_json::from_str("\"auditor\"").unwrap();
        assert_eq!(role, Role::Custom("auditor".into()));
    }
}

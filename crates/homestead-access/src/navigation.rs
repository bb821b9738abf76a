//! Admin shell navigation.
//!
//! Custom roles enter the admin shell with a narrowed permission set; the
//! sections they may open are derived from the evaluator.

use crate::evaluator::has_permission;
use crate::identity::UserIdentity;
use crate::permission::Permission;
use serde::Serialize;

/// A page group inside the admin shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminSection {
    /// Landing page, open to every admitted user.
    Dashboard,
    /// User accounts.
    Users,
    /// Property listings.
    Properties,
    /// Agent profiles.
    Agents,
    /// Buyer inquiries.
    Inquiries,
    /// Reporting.
    Reports,
    /// Role and permission management.
    Roles,
    /// Platform settings.
    Settings,
}

impl AdminSection {
    /// Sections in menu order.
    pub const ALL: [AdminSection; 8] = [
        Self::Dashboard,
        Self::Users,
        Self::Properties,
        Self::Agents,
        Self::Inquiries,
        Self::Reports,
        Self::Roles,
        Self::Settings,
    ];

    /// Permission needed to open the section. `None` means any admitted user.
    pub fn required_permission(self) -> Option<Permission> {
        match self {
            Self::Dashboard => None,
            Self::Users => Some(Permission::UsersView),
            Self::Properties => Some(Permission::PropertiesView),
            Self::Agents => Some(Permission::AgentsView),
            Self::Inquiries => Some(Permission::InquiriesView),
            Self::Reports => Some(Permission::ReportsView),
            Self::Roles => Some(Permission::RolesManage),
            Self::Settings => Some(Permission::SettingsView),
        }
    }

    /// Path of the section's landing page.
    pub fn path(self) -> &'static str {
        match self {
            Self::Dashboard => "/admin/dashboard",
            Self::Users => "/admin/users",
            Self::Properties => "/admin/properties",
            Self::Agents => "/admin/agents",
            Self::Inquiries => "/admin/inquiries",
            Self::Reports => "/admin/reports",
            Self::Roles => "/admin/roles",
            Self::Settings => "/admin/settings",
        }
    }

    /// Whether `user` may open this section.
    pub fn is_visible_to(self, user: Option<&UserIdentity>) -> bool {
        match self.required_permission() {
            None => user.is_some(),
            Some(permission) => has_permission(user, permission),
        }
    }
}

/// Sections `user` may open, in menu order.
pub fn visible_sections(user: Option<&UserIdentity>) -> Vec<AdminSection> {
    AdminSection::ALL
        .iter()
        .copied()
        .filter(|section| section.is_visible_to(user))
        .collect()
}

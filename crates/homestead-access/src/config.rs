//! Session and portal configuration types.

use crate::role::Portal;
use crate::timeout::TimeoutPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session inactivity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Timeout used when the settings service cannot answer.
    #[serde(default = "default_timeout_minutes")]
    pub default_timeout_minutes: u64,
    /// Interval between inactivity checks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// How long before expiry the warning is raised.
    #[serde(default = "default_warning_lead")]
    pub warning_lead_secs: u64,
}

fn default_timeout_minutes() -> u64 {
    30
}

fn default_poll_interval() -> u64 {
    10
}

fn default_warning_lead() -> u64 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_timeout_minutes: default_timeout_minutes(),
            poll_interval_secs: default_poll_interval(),
            warning_lead_secs: default_warning_lead(),
        }
    }
}

impl SessionConfig {
    /// Build the monitor policy.
    pub fn policy(&self) -> TimeoutPolicy {
        let timeout_secs = self.default_timeout_minutes.saturating_mul(60);
        TimeoutPolicy {
            default_timeout: Duration::from_secs(timeout_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            warning_lead: Duration::from_secs(self.warning_lead_secs),
        }
    }
}

/// Login surface paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalRoutes {
    /// Customer portal login.
    #[serde(default = "default_customer_login")]
    pub customer_login: String,
    /// Vendor (agent) portal login.
    #[serde(default = "default_vendor_login")]
    pub vendor_login: String,
    /// Admin portal login.
    #[serde(default = "default_admin_login")]
    pub admin_login: String,
}

fn default_customer_login() -> String {
    "/login".to_string()
}

fn default_vendor_login() -> String {
    "/vendor/login".to_string()
}

fn default_admin_login() -> String {
    "/admin/login".to_string()
}

impl Default for PortalRoutes {
    fn default() -> Self {
        Self {
            customer_login: default_customer_login(),
            vendor_login: default_vendor_login(),
            admin_login: default_admin_login(),
        }
    }
}

impl PortalRoutes {
    /// Login path of `portal`.
    pub fn login_path(&self, portal: Portal) -> &str {
        match portal {
            Portal::Customer => &self.customer_login,
            Portal::Vendor => &self.vendor_login,
            Portal::Admin => &self.admin_login,
        }
    }
}

//! Platform security settings.

use async_trait::async_trait;
use homestead_access::{AccessError, AccessResult, SecuritySettings, SettingsService};
use parking_lot::RwLock;
use tracing::{info, warn};

/// Longest accepted idle timeout (one day).
pub const MAX_SESSION_TIMEOUT_MINUTES: u64 = 24 * 60;

/// In-memory settings store.
///
/// Monitors read the timeout once per activation, so an update takes effect
/// at the next login.
pub struct SettingsStore {
    security: RwLock<SecuritySettings>,
}

impl SettingsStore {
    /// Seed the store. Out-of-range timeouts are clamped into range.
    pub fn new(session_timeout_minutes: u64) -> Self {
        let session_timeout = session_timeout_minutes.clamp(1, MAX_SESSION_TIMEOUT_MINUTES);
        if session_timeout != session_timeout_minutes {
            warn!(
                requested = session_timeout_minutes,
                session_timeout, "Seeded session timeout out of range, clamped"
            );
        }
        Self {
            security: RwLock::new(SecuritySettings { session_timeout }),
        }
    }

    /// Current security settings.
    pub fn security(&self) -> SecuritySettings {
        *self.security.read()
    }

    /// Replace the security settings.
    pub fn update(&self, settings: SecuritySettings) -> AccessResult<SecuritySettings> {
        if !(1..=MAX_SESSION_TIMEOUT_MINUTES).contains(&settings.session_timeout) {
            return Err(AccessError::InvalidSetting(format!(
                "sessionTimeout must be between 1 and {} minutes",
                MAX_SESSION_TIMEOUT_MINUTES
            )));
        }
        info!(session_timeout = settings.session_timeout, "Security settings updated");
        *self.security.write() = settings;
        Ok(settings)
    }
}

#[async_trait]
impl SettingsService for SettingsStore {
    async fn security_settings(&self) -> AccessResult<SecuritySettings> {
        Ok(self.security())
    }
}

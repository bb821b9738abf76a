//! Shared application state.

use crate::config::ServerConfig;
use crate::middleware::auth::TokenCodec;
use crate::services::{AccountDirectory, RoleRegistry, SettingsStore};
use crate::sessions::SessionRegistry;
use homestead_access::SessionTimeoutMonitor;
use std::sync::Arc;
use tracing::info;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<ServerConfig>,
    /// Live sessions.
    pub sessions: SessionRegistry,
    /// Account directory and token issuer.
    pub accounts: Arc<AccountDirectory>,
    /// Platform security settings.
    pub settings: Arc<SettingsStore>,
    /// Permission sets per role.
    pub roles: Arc<RoleRegistry>,
}

impl AppState {
    /// Wire services from configuration.
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let roles = Arc::new(RoleRegistry::from_seeds(&config.roles)?);
        let tokens = TokenCodec::new(
            config.auth.jwt_secret.clone(),
            config.auth.access_token_expiry_secs,
        );
        let accounts = Arc::new(AccountDirectory::from_seeds(
            &config.auth.accounts,
            roles.clone(),
            tokens,
        )?);
        let settings = Arc::new(SettingsStore::new(config.session.default_timeout_minutes));
        let monitor = SessionTimeoutMonitor::new(config.session.policy(), settings.clone());
        let sessions = SessionRegistry::new(accounts.clone(), monitor);

        info!(
            accounts = accounts.len(),
            roles = roles.list().len(),
            "Application state initialized"
        );

        Ok(Self {
            config: Arc::new(config.clone()),
            sessions,
            accounts,
            settings,
            roles,
        })
    }
}

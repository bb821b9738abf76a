//! Configuration validation.

use super::types::ServerConfig;
use crate::services::MAX_SESSION_TIMEOUT_MINUTES;
use homestead_access::{Permission, Role};
use thiserror::Error;

/// A configuration problem found at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JWT secret too short.
    #[error("Invalid JWT secret: must be at least 32 characters")]
    InvalidJwtSecret,

    /// Host does not parse as an address.
    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    /// Port is zero.
    #[error("Invalid port: {0}")]
    InvalidPort(u16),

    /// Default timeout outside the accepted range.
    #[error(
        "Default session timeout must be between 1 and {max} minutes, got {0}",
        max = MAX_SESSION_TIMEOUT_MINUTES
    )]
    InvalidTimeout(u64),

    /// Zero poll interval.
    #[error("Session poll interval must be greater than zero")]
    InvalidPollInterval,

    /// Zero sweep interval.
    #[error("Session sweep interval must be greater than zero")]
    InvalidSweepInterval,

    /// Warning would fire before the session starts.
    #[error("Warning lead ({lead_secs}s) must be shorter than the default timeout ({timeout_secs}s)")]
    InvalidWarningLead { lead_secs: u64, timeout_secs: u64 },

    /// Unknown log level.
    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    /// Unknown log format.
    #[error("Invalid log format: {0}")]
    InvalidLogFormat(String),

    /// Role seed names a key outside the catalog.
    #[error("Role {role} lists unknown permission {key}")]
    UnknownPermission { role: String, key: String },

    /// Role seed for a built-in role.
    #[error("Role {0} is built in and cannot carry a permission set")]
    ReservedRole(String),

    /// Account seed without exactly one password source.
    #[error("Account {0} needs exactly one of password or password_hash")]
    AccountPassword(String),
}

/// Validate server configuration, reporting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate JWT secret
    if config.auth.jwt_secret.len() < 32 {
        errors.push(ConfigError::InvalidJwtSecret);
    }

    if config.server.socket_addr().is_err() {
        errors.push(ConfigError::InvalidBindAddress(config.server.host.clone()));
    }

    // Validate port
    if config.server.port == 0 {
        errors.push(ConfigError::InvalidPort(0));
    }

    // Validate session timing
    if config.session.poll_interval_secs == 0 {
        errors.push(ConfigError::InvalidPollInterval);
    }
    let timeout_minutes = config.session.default_timeout_minutes;
    if !(1..=MAX_SESSION_TIMEOUT_MINUTES).contains(&timeout_minutes) {
        errors.push(ConfigError::InvalidTimeout(timeout_minutes));
    }
    let timeout_secs = timeout_minutes.saturating_mul(60);
    if config.session.warning_lead_secs >= timeout_secs {
        errors.push(ConfigError::InvalidWarningLead {
            lead_secs: config.session.warning_lead_secs,
            timeout_secs,
        });
    }

    if config.session_store.sweep_interval_secs == 0 {
        errors.push(ConfigError::InvalidSweepInterval);
    }

    // Validate log settings
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.to_lowercase().as_str()) {
        errors.push(ConfigError::InvalidLogLevel(config.logging.level.clone()));
    }
    let valid_formats = ["pretty", "compact", "json"];
    if !valid_formats.contains(&config.logging.format.to_lowercase().as_str()) {
        errors.push(ConfigError::InvalidLogFormat(config.logging.format.clone()));
    }

    // Validate role seeds
    for seed in &config.roles {
        if is_reserved(&Role::parse(&seed.name)) {
            errors.push(ConfigError::ReservedRole(seed.name.clone()));
        }
        for key in &seed.permissions {
            if Permission::lookup(key).is_none() {
                errors.push(ConfigError::UnknownPermission {
                    role: seed.name.clone(),
                    key: key.clone(),
                });
            }
        }
    }

    // Validate account seeds
    for account in &config.auth.accounts {
        if account.password.is_some() == account.password_hash.is_some() {
            errors.push(ConfigError::AccountPassword(account.email.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Roles whose access is fixed: customers, agents and super-admins never
/// carry a permission set.
pub fn is_reserved(role: &Role) -> bool {
    matches!(role, Role::Customer | Role::Agent | Role::SuperAdmin)
}

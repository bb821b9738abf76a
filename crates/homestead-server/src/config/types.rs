//! Server configuration types.

use homestead_access::{PortalRoutes, SessionConfig};
use serde::{Deserialize, Serialize};
use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

/// Main server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server binding configuration.
    pub server: ServerBindConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Inactivity timeout configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Upkeep of the server-held session registry.
    #[serde(default)]
    pub session_store: SessionStoreConfig,
    /// Login surfaces per portal.
    #[serde(default)]
    pub portals: PortalRoutes,
    /// Permission sets per role name.
    #[serde(default)]
    pub roles: Vec<RoleSeed>,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Session registry upkeep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStoreConfig {
    /// Interval between sweeps of ended sessions.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    /// How long an ended session keeps its sign-out notice.
    #[serde(default = "default_ended_retention")]
    pub ended_retention_secs: u64,
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_ended_retention() -> u64 {
    300
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            ended_retention_secs: default_ended_retention(),
        }
    }
}

impl SessionStoreConfig {
    /// Sweep interval.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Notice retention.
    pub fn ended_retention(&self) -> Duration {
        Duration::from_secs(self.ended_retention_secs)
    }
}

impl ServerConfig {
    /// Load configuration from defaults, `CONFIG_PATH` and the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        super::loader::load_config()
    }

    /// Address to bind to.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.server.socket_addr()
    }
}

/// Server binding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerBindConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

impl ServerBindConfig {
    /// Parse `host:port`.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JWT secret key.
    pub jwt_secret: String,
    /// Access token expiry (seconds).
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
    /// Name of the session cookie.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    /// Accounts created at startup.
    #[serde(default)]
    pub accounts: Vec<AccountSeed>,
}

fn default_access_token_expiry() -> u64 {
    3600 // 1 hour
}

fn default_session_cookie() -> String {
    "hs_session".to_string()
}

/// Account created at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSeed {
    /// Fixed account id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Login email.
    pub email: String,
    /// Role name (standard or custom).
    pub role: String,
    /// Plain-text password, hashed at startup.
    #[serde(default)]
    pub password: Option<String>,
    /// Pre-computed argon2 PHC hash.
    #[serde(default)]
    pub password_hash: Option<String>,
}

/// Permission set bound to a role name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSeed {
    /// Role name.
    pub name: String,
    /// Permission keys from the catalog.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty, compact or json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

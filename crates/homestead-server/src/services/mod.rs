//! Backing services for the gateway.

pub mod accounts;
pub mod roles;
pub mod settings;

pub use accounts::{hash_password, Account, AccountDirectory};
pub use roles::{RoleDefinition, RoleRegistry};
pub use settings::{SettingsStore, MAX_SESSION_TIMEOUT_MINUTES};

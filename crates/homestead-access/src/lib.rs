//! Homestead portal access core.
//!
//! This crate holds the access rules shared by every Homestead portal
//! (customer, vendor and admin). It has no HTTP dependency; the gateway
//! crate wires it into request handling.
//!
//! # Architecture
//!
//! - **Permission catalog**: the closed set of fine-grained capabilities
//! - **Roles**: coarse identity classification and portal ownership
//! - **Evaluator**: pure "can this user do X" checks
//! - **Session**: per-tab authentication state with lifecycle hooks
//! - **Guards**: per-portal admission decisions (render or redirect)
//! - **Timeout**: inactivity monitor with a warning grace period

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod evaluator;
pub mod guard;
pub mod identity;
pub mod navigation;
pub mod permission;
pub mod role;
pub mod session;
pub mod timeout;

pub use config::{PortalRoutes, SessionConfig};
pub use error::{AccessError, AccessResult};
pub use evaluator::{has_all_permissions, has_any_permission, has_permission, has_permission_key};
pub use guard::{
    mismatch_message, GuardKind, GuardOutcome, GuardState, Redirect, RedirectReason, RouteGuard,
};
pub use identity::UserIdentity;
pub use navigation::{visible_sections, AdminSection};
pub use permission::Permission;
pub use role::{Portal, Role};
pub use session::{
    AuthPhase, AuthService, AuthSnapshot, Credentials, LoginGrant, SessionContext, SignOutReason,
};
pub use timeout::{
    ActivityKind, MonitorHandle, MonitorState, SecuritySettings, SessionTimeoutMonitor,
    SettingsService, TimeoutPolicy,
};

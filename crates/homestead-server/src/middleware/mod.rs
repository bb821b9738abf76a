//! Middleware for the Homestead gateway.

pub mod auth;
pub mod guard;

pub use auth::{require_permission, CurrentSession, PortalUser, SessionLayer, SessionMiddleware};
pub use guard::{GuardAuditEvent, GuardLayer, GuardMiddleware};

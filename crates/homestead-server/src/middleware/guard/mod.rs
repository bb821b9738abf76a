//! Portal guard middleware.

pub mod audit;
pub mod layer;

pub use audit::GuardAuditEvent;
pub use layer::{GuardLayer, GuardMiddleware};

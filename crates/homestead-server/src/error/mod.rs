//! Error handling for the Homestead gateway.

pub mod response;
pub mod types;

pub use types::{ApiError, ApiResult};

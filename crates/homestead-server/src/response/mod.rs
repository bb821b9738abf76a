//! Response types.

pub mod types;

pub use types::*;

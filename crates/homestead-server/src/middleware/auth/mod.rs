//! Session and token middleware.

pub mod extractor;
pub mod jwt;
pub mod layer;
pub mod types;

pub use extractor::{require_permission, CurrentSession, PortalUser};
pub use jwt::{decode_token, encode_token, TokenCodec};
pub use layer::{SessionLayer, SessionMiddleware};
pub use types::Claims;

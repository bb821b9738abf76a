//! Authentication types.

use chrono::Utc;
use homestead_access::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account ID).
    pub sub: String,
    /// Account email.
    pub email: String,
    /// Role name at issue time.
    pub role: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
    /// JWT ID (for revocation).
    pub jti: String,
}

impl Claims {
    /// Create new access token claims.
    pub fn new_access(account_id: &str, email: &str, role: &Role, expires_in: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: account_id.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            iat: now,
            exp: now.saturating_add(expires_in),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

//! JWT encoding and decoding utilities.

use super::types::Claims;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

/// Encode claims into a JWT token.
pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode and validate a JWT token.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

/// Issues and reads access tokens with one secret.
pub struct TokenCodec {
    secret: String,
    expires_in: i64,
}

impl TokenCodec {
    /// Codec signing with `secret`; tokens live `expires_in_secs`.
    pub fn new(secret: impl Into<String>, expires_in_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            expires_in: i64::try_from(expires_in_secs).unwrap_or(i64::MAX),
        }
    }

    /// Token lifetime in seconds.
    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }

    /// Sign `claims`.
    pub fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode_token(claims, &self.secret)
    }

    /// Verify `token` and return its claims.
    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode_token(token, &self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homestead_access::Role;

    #[test]
    fn test_encode_decode_roundtrip() {
        let codec = TokenCodec::new("test_secret_key_32_chars_long!!!", 3600);
        let claims = Claims::new_access("acc-1", "agent@example.com", &Role::Agent, codec.expires_in());

        let token = codec.encode(&claims).unwrap();
        let decoded = codec.decode(&token).unwrap();

        assert_eq!(decoded.sub, "acc-1");
        assert_eq!(decoded.role, "agent");
        assert_eq!(decoded.jti, claims.jti);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let claims = Claims::new_access("acc-1", "a@example.com", &Role::Customer, 3600);
        let token = encode_token(&claims, "first_secret_first_secret_first_").unwrap();
        assert!(decode_token(&token, "other_secret_other_secret_other_").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let mut claims = Claims::new_access("acc-1", "a@example.com", &Role::Customer, 3600);
        claims.iat -= 7200;
        claims.exp -= 7200;

        let token = encode_token(&claims, "test_secret_key_32_chars_long!!!").unwrap();
        let err = decode_token(&token, "test_secret_key_32_chars_long!!!").unwrap_err();
        assert!(matches!(
            err.kind(),
            jsonwebtoken::errors::ErrorKind::ExpiredSignature
        ));
    }
}

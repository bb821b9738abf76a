//! Account directory: password login and token resolution.

use crate::config::AccountSeed;
use crate::middleware::auth::{jwt::TokenCodec, types::Claims};
use crate::services::roles::RoleRegistry;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use dashmap::DashMap;
use homestead_access::{
    AccessError, AccessResult, AuthService, Credentials, LoginGrant, Role, UserIdentity,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A stored account.
#[derive(Debug, Clone)]
pub struct Account {
    /// Account id.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Role name.
    pub role: Role,
    password_hash: String,
}

/// Hash a password with argon2 and a random salt.
pub fn hash_password(password: &str) -> AccessResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccessError::Backend(format!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            warn!(error = %err, "Stored password hash is malformed");
            false
        }
    }
}

/// In-memory account directory implementing the authentication service.
pub struct AccountDirectory {
    /// Accounts keyed by lower-cased email.
    accounts: DashMap<String, Account>,
    /// Revoked token ids with their expiry.
    revoked: DashMap<String, i64>,
    roles: Arc<RoleRegistry>,
    tokens: TokenCodec,
}

impl AccountDirectory {
    /// Empty directory.
    pub fn new(roles: Arc<RoleRegistry>, tokens: TokenCodec) -> Self {
        Self {
            accounts: DashMap::new(),
            revoked: DashMap::new(),
            roles,
            tokens,
        }
    }

    /// Build from configuration seeds.
    pub fn from_seeds(
        seeds: &[AccountSeed],
        roles: Arc<RoleRegistry>,
        tokens: TokenCodec,
    ) -> AccessResult<Self> {
        let directory = Self::new(roles, tokens);
        for seed in seeds {
            let hash = match (&seed.password, &seed.password_hash) {
                (_, Some(hash)) => hash.clone(),
                (Some(password), None) => hash_password(password)?,
                (None, None) => {
                    return Err(AccessError::InvalidSetting(format!(
                        "account {} has no password",
                        seed.email
                    )))
                }
            };
            let id = seed.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
            directory.insert_hashed(id, &seed.email, Role::parse(&seed.role), hash);
        }
        Ok(directory)
    }

    /// Register an account with a plain-text password.
    pub fn register(&self, email: &str, password: &str, role: Role) -> AccessResult<Account> {
        let hash = hash_password(password)?;
        Ok(self.insert_hashed(Uuid::new_v4().to_string(), email, role, hash))
    }

    fn insert_hashed(&self, id: String, email: &str, role: Role, password_hash: String) -> Account {
        let account = Account {
            id,
            email: email.to_string(),
            role,
            password_hash,
        };
        debug!(account_id = %account.id, role = %account.role, "Account registered");
        self.accounts.insert(email.to_lowercase(), account.clone());
        account
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the directory has no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Identity for an account, with its role's current permission set.
    pub fn identity(&self, account: &Account) -> UserIdentity {
        let mut user = UserIdentity::new(&account.id, &account.email, account.role.clone());
        user.role_permissions = self.roles.permissions_for(&account.role);
        user
    }

    fn find_by_id(&self, id: &str) -> Option<Account> {
        self.accounts
            .iter()
            .find(|entry| entry.value().id == id)
            .map(|entry| entry.value().clone())
    }

    fn prune_revoked(&self) {
        let now = chrono::Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp >= now);
    }
}

#[async_trait]
impl AuthService for AccountDirectory {
    async fn login(&self, credentials: &Credentials) -> AccessResult<LoginGrant> {
        let account = self
            .accounts
            .get(&credentials.email.to_lowercase())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AccessError::AccountNotFound(credentials.email.clone()))?;

        if !verify_password(&credentials.password, &account.password_hash) {
            warn!(account_id = %account.id, "Password verification failed");
            return Err(AccessError::InvalidCredentials);
        }

        let claims = Claims::new_access(
            &account.id,
            &account.email,
            &account.role,
            self.tokens.expires_in(),
        );
        let token = self
            .tokens
            .encode(&claims)
            .map_err(|e| AccessError::Backend(format!("token encoding failed: {}", e)))?;

        info!(account_id = %account.id, role = %account.role, "Login succeeded");
        Ok(LoginGrant {
            token,
            user: self.identity(&account),
        })
    }

    async fn current_user(&self, token: &str) -> AccessResult<Option<UserIdentity>> {
        let claims = match self.tokens.decode(token) {
            Ok(claims) => claims,
            Err(err) => {
                debug!(error = %err, "Rejected access token");
                return Ok(None);
            }
        };
        if self.revoked.contains_key(&claims.jti) {
            debug!(jti = %claims.jti, "Token was revoked");
            return Ok(None);
        }
        Ok(self.find_by_id(&claims.sub).map(|account| self.identity(&account)))
    }

    async fn logout(&self, token: &str) -> AccessResult<()> {
        self.prune_revoked();
        // Undecodable tokens are already useless.
        if let Ok(claims) = self.tokens.decode(token) {
            if self.revoked.insert(claims.jti, claims.exp).is_none() {
                info!(account_id = %claims.sub, "Token revoked");
            }
        }
        Ok(())
    }
}

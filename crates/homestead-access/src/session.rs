//! Authentication/session state.
//!
//! A [`SessionContext`] is the state of one browser tab: who is signed in,
//! whether the initial resolution is still running, and why the previous
//! session ended. It is an owned handle rather than ambient global state, so
//! each tab (and each test) gets an isolated instance.

use crate::error::AccessResult;
use crate::identity::UserIdentity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Why an authenticated session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignOutReason {
    /// Explicit logout.
    Logout,
    /// The session tried to enter a portal its role does not belong to.
    PortalMismatch,
    /// The inactivity timeout fired.
    Inactivity,
}

impl SignOutReason {
    /// Notice shown on the login surface after this kind of sign-out, if any.
    pub fn notice(self) -> Option<&'static str> {
        match self {
            Self::Inactivity => Some("You have been logged out due to inactivity."),
            Self::Logout | Self::PortalMismatch => None,
        }
    }
}

/// Resolution phase of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPhase {
    /// Initial resolution (token validation) in flight.
    Loading,
    /// No user signed in.
    Anonymous,
    /// A user is signed in.
    Authenticated(UserIdentity),
}

/// Point-in-time view of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    /// Current phase.
    pub phase: AuthPhase,
    /// Bumped on every login and every clear.
    pub epoch: u64,
    /// Reason the last authenticated session ended.
    pub ended: Option<SignOutReason>,
}

impl AuthSnapshot {
    fn anonymous() -> Self {
        Self {
            phase: AuthPhase::Anonymous,
            epoch: 0,
            ended: None,
        }
    }

    /// Signed-in user, if any.
    pub fn user(&self) -> Option<&UserIdentity> {
        match &self.phase {
            AuthPhase::Authenticated(user) => Some(user),
            AuthPhase::Loading | AuthPhase::Anonymous => None,
        }
    }

    /// Whether a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.phase, AuthPhase::Authenticated(_))
    }

    /// Whether the initial resolution is still running.
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, AuthPhase::Loading)
    }
}

/// Login credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    /// Account email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginGrant {
    /// Bearer token identifying the authenticated session.
    pub token: String,
    /// Resolved identity.
    pub user: UserIdentity,
}

/// Authentication backend consumed by the session layer.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verify credentials and issue a token.
    async fn login(&self, credentials: &Credentials) -> AccessResult<LoginGrant>;

    /// Resolve the user behind a token. `Ok(None)` for unknown, expired or
    /// revoked tokens.
    async fn current_user(&self, token: &str) -> AccessResult<Option<UserIdentity>>;

    /// Revoke a token. Revoking an unknown token is not an error.
    async fn logout(&self, token: &str) -> AccessResult<()>;
}

/// Shared handle to one tab's authentication state.
#[derive(Clone)]
pub struct SessionContext {
    state: Arc<watch::Sender<AuthSnapshot>>,
}

impl SessionContext {
    /// Create an anonymous session.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AuthSnapshot::anonymous());
        Self { state: Arc::new(tx) }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    /// Signed-in user, if any.
    pub fn user(&self) -> Option<UserIdentity> {
        self.state.borrow().user().cloned()
    }

    /// Whether a user is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Whether the initial resolution is still running.
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Current epoch.
    pub fn epoch(&self) -> u64 {
        self.state.borrow().epoch
    }

    /// Reason the last authenticated session ended.
    pub fn ended(&self) -> Option<SignOutReason> {
        self.state.borrow().ended
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Mark the initial resolution as in flight.
    pub fn begin_resolution(&self) {
        self.state.send_modify(|s| s.phase = AuthPhase::Loading);
    }

    /// Finish the initial resolution.
    pub fn resolve(&self, user: Option<UserIdentity>) -> u64 {
        match user {
            Some(user) => self.login(user),
            None => {
                self.state.send_modify(|s| s.phase = AuthPhase::Anonymous);
                self.epoch()
            }
        }
    }

    /// Install a freshly authenticated user. Returns the new epoch.
    pub fn login(&self, user: UserIdentity) -> u64 {
        let mut epoch = 0;
        self.state.send_modify(|s| {
            info!(user_id = %user.id, role = %user.role, "Session authenticated");
            s.epoch += 1;
            s.phase = AuthPhase::Authenticated(user);
            s.ended = None;
            epoch = s.epoch;
        });
        epoch
    }

    /// Clear the signed-in user. Returns `false` when nobody was signed in.
    pub fn clear(&self, reason: SignOutReason) -> bool {
        self.state.send_if_modified(|s| Self::clear_locked(s, reason))
    }

    /// Clear the session only if `epoch` still identifies it.
    ///
    /// Timers armed for an earlier session use this so they cannot sign out a
    /// session started after them.
    pub fn clear_if_current(&self, epoch: u64, reason: SignOutReason) -> bool {
        self.state.send_if_modified(|s| {
            if s.epoch != epoch {
                debug!(stale = epoch, current = s.epoch, "Ignoring clear for stale session");
                return false;
            }
            Self::clear_locked(s, reason)
        })
    }

    fn clear_locked(s: &mut AuthSnapshot, reason: SignOutReason) -> bool {
        let AuthPhase::Authenticated(user) = &s.phase else {
            return false;
        };
        info!(user_id = %user.id, reason = ?reason, "Session cleared");
        s.epoch += 1;
        s.phase = AuthPhase::Anonymous;
        s.ended = Some(reason);
        true
    }

    /// Resolve the session from a stored token.
    ///
    /// Backend failures degrade to an anonymous session. Returns whether a
    /// user was restored.
    pub async fn restore(&self, auth: &dyn AuthService, token: &str) -> bool {
        self.begin_resolution();
        let user = match auth.current_user(token).await {
            Ok(user) => user,
            Err(err) => {
                warn!(error = %err, "Token resolution failed, continuing anonymously");
                None
            }
        };
        let restored = user.is_some();
        self.resolve(user);
        restored
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

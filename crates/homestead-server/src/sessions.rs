//! Server-held sessions, one per browser tab.
//!
//! Each entry pairs an access-core [`SessionContext`] with the token that
//! authenticated it and the inactivity monitor armed for it.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use homestead_access::{
    ActivityKind, AuthService, LoginGrant, MonitorHandle, MonitorState, SessionContext,
    SessionTimeoutMonitor, SignOutReason,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One tab's session.
pub struct SessionEntry {
    id: String,
    context: SessionContext,
    token: Mutex<Option<String>>,
    monitor: Mutex<Option<MonitorHandle>>,
    signed_out_since: Mutex<Option<Instant>>,
}

/// Session status reported to the client.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    /// Whether a user is signed in.
    pub authenticated: bool,
    /// Inactivity monitor state.
    pub state: MonitorState,
    /// Whether the "stay logged in" prompt should be shown.
    pub warning: bool,
    /// Idle timeout in effect, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<u64>,
    /// Seconds left before the session expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_secs: Option<u64>,
    /// Notice explaining why the last session ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            context: SessionContext::new(),
            token: Mutex::new(None),
            monitor: Mutex::new(None),
            signed_out_since: Mutex::new(None),
        }
    }

    /// Session id, as carried by the session cookie.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Authentication state of this tab.
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Access token the session was authenticated with.
    pub fn token(&self) -> Option<String> {
        self.token.lock().clone()
    }

    /// Forward a client activity event to the monitor.
    pub fn record_activity(&self, kind: ActivityKind) {
        if let Some(monitor) = self.monitor.lock().as_ref() {
            monitor.record_activity(kind);
        }
    }

    /// Answer the warning prompt with "stay logged in".
    pub fn stay_logged_in(&self) {
        if let Some(monitor) = self.monitor.lock().as_ref() {
            monitor.stay_logged_in();
        }
    }

    /// Current inactivity monitor state.
    pub fn monitor_state(&self) -> MonitorState {
        self.monitor
            .lock()
            .as_ref()
            .map(MonitorHandle::state)
            .unwrap_or(MonitorState::Inactive)
    }

    /// Snapshot for the status endpoint.
    pub fn status(&self) -> SessionStatus {
        let snapshot = self.context.snapshot();
        let monitor = self.monitor.lock();
        let state = monitor
            .as_ref()
            .map(MonitorHandle::state)
            .unwrap_or(MonitorState::Inactive);

        SessionStatus {
            authenticated: snapshot.is_authenticated(),
            state,
            warning: state == MonitorState::Warning,
            timeout_minutes: monitor.as_ref().and_then(|m| m.timeout()).map(|t| t.as_secs() / 60),
            remaining_secs: monitor
                .as_ref()
                .filter(|_| snapshot.is_authenticated())
                .and_then(|m| m.remaining())
                .map(|r| r.as_secs()),
            notice: snapshot.ended.and_then(SignOutReason::notice),
        }
    }

    fn replace_monitor(&self, next: Option<MonitorHandle>) {
        let previous = std::mem::replace(&mut *self.monitor.lock(), next);
        if let Some(mut previous) = previous {
            previous.cancel();
        }
    }

    fn holds(&self, token: &str) -> bool {
        self.context.is_authenticated() && self.token.lock().as_deref() == Some(token)
    }
}

/// Registry of live sessions.
///
/// Entries are registered on sign-in and looked up by id (session cookie) or
/// by access token (bearer clients). Ended sessions without a notice are
/// evicted on the spot; the rest are dropped by [`SessionRegistry::sweep`]
/// once their notice has been kept long enough.
#[derive(Clone)]
pub struct SessionRegistry {
    entries: Arc<DashMap<String, Arc<SessionEntry>>>,
    tokens: Arc<DashMap<String, String>>,
    auth: Arc<dyn AuthService>,
    monitor: SessionTimeoutMonitor,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new(auth: Arc<dyn AuthService>, monitor: SessionTimeoutMonitor) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            tokens: Arc::new(DashMap::new()),
            auth,
            monitor,
        }
    }

    /// Look up a session by id.
    pub fn get(&self, id: &str) -> Option<Arc<SessionEntry>> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    /// Open an anonymous session.
    ///
    /// The entry is only registered once somebody signs in on it.
    pub fn open(&self) -> Arc<SessionEntry> {
        Arc::new(SessionEntry::new())
    }

    /// Whether `entry` is registered.
    pub fn contains(&self, entry: &SessionEntry) -> bool {
        self.entries.contains_key(&entry.id)
    }

    fn register(&self, entry: &Arc<SessionEntry>) {
        *entry.signed_out_since.lock() = None;
        if self.entries.insert(entry.id.clone(), entry.clone()).is_none() {
            debug!(session_id = %entry.id, "Session registered");
        }
    }

    /// Signed-in session currently holding `token`.
    fn by_token(&self, token: &str) -> Option<Arc<SessionEntry>> {
        let id = self.tokens.get(token)?.value().clone();
        self.get(&id).filter(|entry| entry.holds(token))
    }

    fn unindex(&self, token: &str, id: &str) {
        self.tokens.remove_if(token, |_, owner| owner == id);
    }

    /// Open a session from a stored access token.
    ///
    /// A token already backing a live session resolves to that session.
    /// Otherwise the session sits in the loading phase while the token is
    /// resolved and gets a monitor when the token is still good.
    pub async fn restore(&self, token: &str) -> Arc<SessionEntry> {
        if let Some(entry) = self.by_token(token) {
            debug!(session_id = %entry.id, "Reusing session for access token");
            return entry;
        }

        let entry = self.open();
        if !entry.context.restore(self.auth.as_ref(), token).await {
            return entry;
        }

        // Another request may have restored the same token meanwhile.
        match self.tokens.entry(token.to_string()) {
            Entry::Occupied(mut slot) => {
                if let Some(existing) = self.get(slot.get()).filter(|e| e.holds(token)) {
                    return existing;
                }
                slot.insert(entry.id.clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(entry.id.clone());
            }
        }

        *entry.token.lock() = Some(token.to_string());
        entry.replace_monitor(Some(self.monitor.activate(&entry.context)));
        self.register(&entry);
        info!(session_id = %entry.id, "Session restored from token");
        entry
    }

    /// Install a login on `entry`, re-arming its monitor from zero.
    pub async fn sign_in(&self, entry: &Arc<SessionEntry>, grant: LoginGrant) {
        // Old monitor must be gone before the new login bumps the epoch.
        entry.replace_monitor(None);
        self.tokens.insert(grant.token.clone(), entry.id.clone());
        let previous = entry.token.lock().replace(grant.token);
        if let Some(previous) = previous {
            self.unindex(&previous, &entry.id);
            self.revoke(&previous).await;
        }

        entry.context.login(grant.user);
        entry.replace_monitor(Some(self.monitor.activate(&entry.context)));
        self.register(entry);
    }

    /// Sign out `entry`. Returns `false` when it was not signed in.
    ///
    /// Sign-outs that leave no notice to show evict the entry at once.
    pub async fn sign_out(&self, entry: &SessionEntry, reason: SignOutReason) -> bool {
        entry.replace_monitor(None);
        let cleared = entry.context.clear(reason);
        self.release_token(entry).await;
        if reason.notice().is_none() && self.entries.remove(&entry.id).is_some() {
            debug!(session_id = %entry.id, reason = ?reason, "Session evicted");
        }
        cleared
    }

    /// Revoke the token of a session that is no longer authenticated.
    pub async fn release_token(&self, entry: &SessionEntry) {
        if entry.context.is_authenticated() {
            return;
        }
        let token = entry.token.lock().take();
        if let Some(token) = token {
            self.unindex(&token, &entry.id);
            self.revoke(&token).await;
        }
    }

    async fn revoke(&self, token: &str) {
        if let Err(err) = self.auth.logout(token).await {
            warn!(error = %err, "Token revocation failed");
        }
    }

    /// Drop entries that have been signed out for at least `retention`.
    ///
    /// The clock starts the first time a sweep finds the entry signed out.
    /// Returns the number of entries removed.
    pub async fn sweep(&self, retention: Duration) -> usize {
        let now = Instant::now();
        let mut ended = Vec::new();

        for item in self.entries.iter() {
            let entry = item.value();
            let mut since = entry.signed_out_since.lock();
            if entry.context.is_authenticated() {
                *since = None;
                continue;
            }
            if now.duration_since(*since.get_or_insert(now)) >= retention {
                ended.push(entry.clone());
            }
        }

        let mut removed = 0;
        for entry in ended {
            if self
                .entries
                .remove_if(&entry.id, |_, e| !e.context.is_authenticated())
                .is_none()
            {
                continue;
            }
            entry.replace_monitor(None);
            self.release_token(&entry).await;
            removed += 1;
        }

        if removed > 0 {
            debug!(removed, remaining = self.len(), "Swept ended sessions");
        }
        removed
    }

    /// Run [`SessionRegistry::sweep`] every `every` until the handle is aborted.
    pub fn spawn_sweeper(&self, every: Duration, retention: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        let every = every.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                registry.sweep(retention).await;
            }
        })
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no session is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::jwt::TokenCodec;
    use crate::services::{AccountDirectory, RoleRegistry, SettingsStore};
    use homestead_access::{Credentials, Role, TimeoutPolicy};
    use std::time::Duration;

    async fn fixture() -> (SessionRegistry, Arc<AccountDirectory>, LoginGrant) {
        let accounts = Arc::new(AccountDirectory::new(
            Arc::new(RoleRegistry::new()),
            TokenCodec::new("test_secret_key_32_chars_long!!!", 3600),
        ));
        accounts.register("admin@example.com", "admin-pass-1", Role::Admin).unwrap();
        let grant = accounts
            .login(&Credentials {
                email: "admin@example.com".into(),
                password: "admin-pass-1".into(),
            })
            .await
            .unwrap();

        let monitor =
            SessionTimeoutMonitor::new(TimeoutPolicy::default(), Arc::new(SettingsStore::new(30)));
        (SessionRegistry::new(accounts.clone(), monitor), accounts, grant)
    }

    #[tokio::test]
    async fn test_sign_in_arms_monitor() {
        let (registry, _, grant) = fixture().await;
        let entry = registry.open();
        registry.sign_in(&entry, grant).await;

        assert!(entry.context().is_authenticated());
        assert_eq!(entry.monitor_state(), MonitorState::Armed);
        assert!(entry.token().is_some());
        assert!(registry.get(entry.id()).is_some());
    }

    #[tokio::test]
    async fn test_sign_out_is_idempotent_and_revokes() {
        let (registry, accounts, grant) = fixture().await;
        let token = grant.token.clone();
        let entry = registry.open();
        registry.sign_in(&entry, grant).await;

        assert!(registry.sign_out(&entry, SignOutReason::Logout).await);
        assert!(!registry.sign_out(&entry, SignOutReason::Logout).await);
        assert_eq!(entry.monitor_state(), MonitorState::Inactive);
        assert!(entry.token().is_none());
        assert!(accounts.current_user(&token).await.unwrap().is_none());
        assert!(!registry.contains(&entry));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_token_reuses_live_session() {
        let (registry, _, grant) = fixture().await;
        let first = registry.restore(&grant.token).await;
        for _ in 0..50 {
            let again = registry.restore(&grant.token).await;
            assert_eq!(again.id(), first.id());
        }
        assert_eq!(registry.len(), 1);

        assert!(registry.sign_out(&first, SignOutReason::Logout).await);
        assert!(registry.is_empty());

        // Revoked with the sign-out, so nothing comes back.
        let stranger = registry.restore(&grant.token).await;
        assert!(!stranger.context().is_authenticated());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_signed_in_token_resolves_to_that_session() {
        let (registry, _, grant) = fixture().await;
        let token = grant.token.clone();
        let entry = registry.open();
        registry.sign_in(&entry, grant).await;

        let restored = registry.restore(&token).await;
        assert_eq!(restored.id(), entry.id());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_keeps_notice_then_drops_expired_session() {
        let (registry, accounts, grant) = fixture().await;
        let token = grant.token.clone();
        let entry = registry.open();
        registry.sign_in(&entry, grant).await;

        let retention = Duration::from_secs(5 * 60);
        assert_eq!(registry.sweep(retention).await, 0);

        tokio::time::sleep(Duration::from_secs(30 * 60 + 20)).await;
        assert_eq!(entry.monitor_state(), MonitorState::Expired);

        // First sighting starts the retention clock.
        assert_eq!(registry.sweep(retention).await, 0);
        assert!(registry.contains(&entry));

        tokio::time::sleep(retention).await;
        assert_eq!(registry.sweep(retention).await, 1);
        assert!(registry.is_empty());
        assert!(entry.token().is_none());
        assert!(accounts.current_user(&token).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_task_bounds_registry() {
        let (registry, _, grant) = fixture().await;
        let entry = registry.open();
        registry.sign_in(&entry, grant).await;

        let sweeper = registry.spawn_sweeper(Duration::from_secs(60), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(30 * 60 + 20)).await;
        assert!(registry.contains(&entry));

        tokio::time::sleep(Duration::from_secs(3 * 60)).await;
        assert!(registry.is_empty());
        sweeper.abort();
    }

    #[tokio::test]
    async fn test_restore_from_token() {
        let (registry, _, grant) = fixture().await;
        let entry = registry.restore(&grant.token).await;
        assert!(entry.context().is_authenticated());
        assert_eq!(entry.monitor_state(), MonitorState::Armed);

        let stranger = registry.restore("not-a-token").await;
        assert!(!stranger.context().is_authenticated());
        assert_eq!(stranger.monitor_state(), MonitorState::Inactive);
        assert!(registry.contains(&entry));
        assert!(!registry.contains(&stranger));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_reports_warning_and_notice() {
        let (registry, _, grant) = fixture().await;
        let entry = registry.open();
        registry.sign_in(&entry, grant).await;

        tokio::time::sleep(Duration::from_secs(30 * 60 - 30)).await;
        let status = entry.status();
        assert!(status.warning);
        assert_eq!(status.timeout_minutes, Some(30));

        entry.stay_logged_in();
        assert!(!entry.status().warning);

        tokio::time::sleep(Duration::from_secs(30 * 60 + 20)).await;
        let status = entry.status();
        assert!(!status.authenticated);
        assert_eq!(status.state, MonitorState::Expired);
        assert_eq!(status.notice, Some("You have been logged out due to inactivity."));
    }
}

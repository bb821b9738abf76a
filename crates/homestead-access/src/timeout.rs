//! Session inactivity monitor.
//!
//! Once a session is authenticated the monitor tracks the last user
//! activity and signs the session out after the configured idle time. One
//! warning lead period before expiry it enters [`MonitorState::Warning`] so
//! the client can offer a "stay logged in" prompt.

use crate::error::AccessResult;
use crate::session::{AuthSnapshot, SessionContext, SignOutReason};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

/// Monitor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    /// No authenticated session, or monitoring cancelled.
    Inactive,
    /// Counting idle time.
    Armed,
    /// Expiry is less than the warning lead away.
    Warning,
    /// The session was signed out for inactivity.
    Expired,
}

/// User interactions that count as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Mouse or pen press.
    PointerDown,
    /// Key press.
    KeyDown,
    /// Scroll.
    Scroll,
    /// Touch.
    TouchStart,
}

/// Security settings read from the settings service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySettings {
    /// Idle timeout in minutes.
    #[serde(rename = "sessionTimeout")]
    pub session_timeout: u64,
}

/// Source of security settings.
#[async_trait]
pub trait SettingsService: Send + Sync {
    /// Read the current security settings.
    async fn security_settings(&self) -> AccessResult<SecuritySettings>;
}

/// Monitor timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Timeout used when settings are unavailable.
    pub default_timeout: Duration,
    /// Interval between idle checks.
    pub poll_interval: Duration,
    /// Warning lead before expiry.
    pub warning_lead: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30 * 60),
            poll_interval: Duration::from_secs(10),
            warning_lead: Duration::from_secs(60),
        }
    }
}

/// Arms a monitor for each authenticated session.
#[derive(Clone)]
pub struct SessionTimeoutMonitor {
    policy: TimeoutPolicy,
    settings: Arc<dyn SettingsService>,
}

impl SessionTimeoutMonitor {
    /// Create a monitor factory.
    pub fn new(policy: TimeoutPolicy, settings: Arc<dyn SettingsService>) -> Self {
        Self { policy, settings }
    }

    /// Monitor timing.
    pub fn policy(&self) -> TimeoutPolicy {
        self.policy
    }

    /// Start monitoring `session`.
    ///
    /// Must be called inside a Tokio runtime. An unauthenticated session gets
    /// an inactive handle.
    pub fn activate(&self, session: &SessionContext) -> MonitorHandle {
        let snapshot = session.snapshot();
        if !snapshot.is_authenticated() {
            return MonitorHandle::inactive();
        }

        let (state, _) = watch::channel(MonitorState::Armed);
        let shared = Arc::new(Shared {
            last_activity: Mutex::new(Instant::now()),
            timeout: Mutex::new(None),
            state,
        });

        debug!(epoch = snapshot.epoch, "Arming session timeout monitor");
        let task = tokio::spawn(run(
            shared.clone(),
            self.policy,
            self.settings.clone(),
            session.clone(),
            snapshot.epoch,
        ));

        MonitorHandle {
            shared,
            task: Some(task),
        }
    }
}

struct Shared {
    last_activity: Mutex<Instant>,
    timeout: Mutex<Option<Duration>>,
    state: watch::Sender<MonitorState>,
}

impl Shared {
    fn idle(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    fn set_state(&self, next: MonitorState) {
        self.state.send_if_modified(|s| {
            if *s == next {
                return false;
            }
            *s = next;
            true
        });
    }
}

/// Handle to one armed monitor. Dropping it stops monitoring.
pub struct MonitorHandle {
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    fn inactive() -> Self {
        let (state, _) = watch::channel(MonitorState::Inactive);
        Self {
            shared: Arc::new(Shared {
                last_activity: Mutex::new(Instant::now()),
                timeout: Mutex::new(None),
                state,
            }),
            task: None,
        }
    }

    /// Record a user interaction. Dismisses a pending warning.
    pub fn record_activity(&self, kind: ActivityKind) {
        match self.shared.state() {
            MonitorState::Armed | MonitorState::Warning => {
                trace!(kind = ?kind, "Activity recorded");
                *self.shared.last_activity.lock() = Instant::now();
                self.shared.state.send_if_modified(|s| {
                    if *s == MonitorState::Warning {
                        *s = MonitorState::Armed;
                        true
                    } else {
                        false
                    }
                });
            }
            MonitorState::Inactive | MonitorState::Expired => {}
        }
    }

    /// Affirmative action of the warning prompt.
    pub fn stay_logged_in(&self) {
        if self.shared.state() == MonitorState::Warning {
            info!("Session extended from warning prompt");
        }
        self.record_activity(ActivityKind::PointerDown);
    }

    /// Current state.
    pub fn state(&self) -> MonitorState {
        self.shared.state()
    }

    /// Receive state changes.
    pub fn subscribe(&self) -> watch::Receiver<MonitorState> {
        self.shared.state.subscribe()
    }

    /// Timeout in effect, once the settings fetch has finished.
    pub fn timeout(&self) -> Option<Duration> {
        *self.shared.timeout.lock()
    }

    /// Time since the last recorded activity.
    pub fn idle(&self) -> Duration {
        self.shared.idle()
    }

    /// Time left before expiry, once the timeout is known.
    pub fn remaining(&self) -> Option<Duration> {
        self.timeout().map(|t| t.saturating_sub(self.idle()))
    }

    /// Stop monitoring now. An expired monitor stays expired.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Session timeout monitor cancelled");
        }
        if self.shared.state() != MonitorState::Expired {
            self.shared.set_state(MonitorState::Inactive);
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn resolve_timeout(settings: &dyn SettingsService, policy: &TimeoutPolicy) -> Duration {
    match settings.security_settings().await {
        Ok(s) if s.session_timeout > 0 => {
            Duration::from_secs(s.session_timeout.saturating_mul(60))
        }
        Ok(_) => {
            warn!("Session timeout setting is zero, using default");
            policy.default_timeout
        }
        Err(err) => {
            warn!(error = %err, "Failed to load security settings, using default timeout");
            policy.default_timeout
        }
    }
}

async fn session_ended(rx: &mut watch::Receiver<AuthSnapshot>, epoch: u64) {
    loop {
        if rx.borrow_and_update().epoch != epoch {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

async fn run(
    shared: Arc<Shared>,
    policy: TimeoutPolicy,
    settings: Arc<dyn SettingsService>,
    session: SessionContext,
    epoch: u64,
) {
    let mut auth_rx = session.subscribe();

    let timeout = tokio::select! {
        timeout = resolve_timeout(settings.as_ref(), &policy) => timeout,
        _ = session_ended(&mut auth_rx, epoch) => {
            shared.set_state(MonitorState::Inactive);
            return;
        }
    };
    *shared.timeout.lock() = Some(timeout);
    let warn_after = timeout.saturating_sub(policy.warning_lead);
    debug!(timeout_secs = timeout.as_secs(), "Session timeout resolved");

    let mut ticker = interval_at(Instant::now() + policy.poll_interval, policy.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let idle = shared.idle();

                if idle >= timeout {
                    if session.clear_if_current(epoch, SignOutReason::Inactivity) {
                        info!(idle_secs = idle.as_secs(), "Session expired due to inactivity");
                        shared.set_state(MonitorState::Expired);
                    } else {
                        shared.set_state(MonitorState::Inactive);
                    }
                    return;
                }

                if idle >= warn_after && shared.state() == MonitorState::Armed {
                    info!(
                        remaining_secs = timeout.saturating_sub(idle).as_secs(),
                        "Session about to expire"
                    );
                    shared.set_state(MonitorState::Warning);
                }
            }
            _ = session_ended(&mut auth_rx, epoch) => {
                debug!(epoch, "Session ended, stopping timeout monitor");
                shared.set_state(MonitorState::Inactive);
                return;
            }
        }
    }
}

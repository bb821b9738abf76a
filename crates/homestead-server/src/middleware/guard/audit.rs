//! Guard decision audit logging.

use chrono::{DateTime, Utc};
use homestead_access::{GuardKind, GuardOutcome, RedirectReason};
use serde::Serialize;
use tracing::info;

/// One guard decision.
#[derive(Debug, Serialize)]
pub struct GuardAuditEvent {
    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
    /// Session the request ran on.
    pub session_id: String,
    /// Signed-in user, if any.
    pub user_id: Option<String>,
    /// Guard that decided.
    pub guard: GuardKind,
    /// Requested path and query.
    pub path: String,
    /// `render`, `pending` or `redirect`.
    pub outcome: &'static str,
    /// Why the request was redirected.
    pub reason: Option<RedirectReason>,
}

impl GuardAuditEvent {
    /// Record the outcome of one guard check.
    pub fn new(
        session_id: &str,
        user_id: Option<&str>,
        guard: GuardKind,
        path: &str,
        outcome: &GuardOutcome,
    ) -> Self {
        let (label, reason) = match outcome {
            GuardOutcome::Pending => ("pending", None),
            GuardOutcome::Render(_) => ("render", None),
            GuardOutcome::Redirect(redirect) => ("redirect", Some(redirect.reason)),
        };
        Self {
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
            user_id: user_id.map(String::from),
            guard,
            path: path.to_string(),
            outcome: label,
            reason,
        }
    }

    /// Emit the event at info level.
    pub fn log(&self) {
        match self.reason {
            None => info!(
                event = if self.outcome == "render" { "guard_authorized" } else { "guard_pending" },
                session_id = %self.session_id,
                user_id = ?self.user_id,
                guard = ?self.guard,
                path = %self.path,
                "Guard decision"
            ),
            Some(reason) => info!(
                event = "guard_redirect",
                session_id = %self.session_id,
                user_id = ?self.user_id,
                guard = ?self.guard,
                path = %self.path,
                reason = ?reason,
                "Guard redirected"
            ),
        }
    }
}
